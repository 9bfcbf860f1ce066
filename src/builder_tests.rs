//! Unit tests for build jobs and staging.

use super::*;
use crate::platform::PLATFORMS;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Project {
    _temp: TempDir,
    builder: Builder,
}

impl Project {
    fn dir(&self) -> &Utf8Path {
        &self.builder.config().project_dir
    }

    fn dist(&self) -> &Utf8Path {
        &self.builder.config().dist_dir
    }
}

#[fixture]
fn project() -> Project {
    let temp = TempDir::new().expect("temp dir creation succeeds");
    let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf8 temp path");
    fs::write(dir.join("README.md"), "# bwt\n").expect("write readme");
    fs::write(dir.join("LICENSE"), "MIT\n").expect("write license");
    let builder = Builder::new(BuildConfig {
        project: ProjectInfo::new("bwt", "0.2.4"),
        dist_dir: dir.join("dist"),
        project_dir: dir,
        toolchain: None,
    });
    Project {
        _temp: temp,
        builder,
    }
}

fn platform(alias: &str) -> &'static PlatformEntry {
    PLATFORMS
        .iter()
        .find(|p| p.alias == alias)
        .expect("alias is in the matrix")
}

fn cargo_call(project: &Project, job: &BuildJob) -> ExpectedCall {
    let args = project.builder.cargo_args(job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    ExpectedCall::new("cargo", &arg_refs, Ok(success_output()))
        .creating(project.builder.built_binary_path(job.target), b"\x7fELF")
}

#[rstest]
fn job_combines_platform_and_flavor() {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("arm64v8"),
        Flavor::Complete,
    );
    assert_eq!(job.artifact_name.as_str(), "bwt-0.2.4-arm64v8");
    assert_eq!(job.target.as_str(), "aarch64-unknown-linux-gnu");
    assert_eq!(job.features.to_cargo_arg(), "cli,electrum,http,track-spends");
    assert_eq!(job.format, ArchiveFormat::TarGz);
}

#[rstest]
fn cargo_args_pin_target_and_features(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-win"),
        Flavor::ElectrumOnly,
    );
    let args = project.builder.cargo_args(&job);
    let dir = project.dir();
    assert_eq!(
        args,
        vec![
            "build".to_owned(),
            "--release".to_owned(),
            "--manifest-path".to_owned(),
            dir.join("Cargo.toml").to_string(),
            "--target-dir".to_owned(),
            dir.join("target").to_string(),
            "--target".to_owned(),
            "x86_64-pc-windows-gnu".to_owned(),
            "--no-default-features".to_owned(),
            "--features".to_owned(),
            "cli,electrum".to_owned(),
        ]
    );
}

#[rstest]
fn toolchain_override_comes_first(project: Project) {
    let mut config = project.builder.config().clone();
    config.toolchain = Some("nightly-2020-12-01".to_owned());
    let builder = Builder::new(config);
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::Complete,
    );
    assert_eq!(
        builder.cargo_args(&job).first().map(String::as_str),
        Some("+nightly-2020-12-01")
    );
}

#[rstest]
#[case::linux("x86_64-unknown-linux-gnu", "bwt")]
#[case::windows("x86_64-pc-windows-gnu", "bwt.exe")]
fn built_binary_path_uses_target_extension(
    project: Project,
    #[case] triple: &'static str,
    #[case] file_name: &str,
) {
    let path = project.builder.built_binary_path(TargetTriple::new(triple));
    assert_eq!(
        path,
        project.dir().join("target").join(triple).join("release").join(file_name)
    );
}

#[rstest]
fn build_stages_binary_and_docs(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-win"),
        Flavor::Complete,
    );
    let staged_binary = project.dist().join("bwt-0.2.4-x86_64-win").join("bwt.exe");
    let executor = StubExecutor::new(vec![
        cargo_call(&project, &job),
        ExpectedCall::new(
            "x86_64-w64-mingw32-strip",
            &[staged_binary.as_str()],
            Ok(success_output()),
        ),
    ]);

    let staged = project.builder.build(&executor, &job).expect("build succeeds");

    executor.assert_finished();
    assert_eq!(staged.binary, staged_binary);
    assert_eq!(staged.strip, StripOutcome::Stripped);
    assert!(!project.builder.built_binary_path(job.target).exists(), "binary is moved");
    let mut names: Vec<String> = fs::read_dir(&staged.staging_dir)
        .expect("read staging dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["LICENSE", "README.md", "bwt.exe"]);
}

#[rstest]
fn strip_failure_still_stages(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::ElectrumOnly,
    );
    let staged_binary = project
        .dist()
        .join("bwt-0.2.4-electrum_only-x86_64-linux")
        .join("bwt");
    let executor = StubExecutor::new(vec![
        cargo_call(&project, &job),
        ExpectedCall::new(
            "strip",
            &[staged_binary.as_str()],
            Ok(failure_output("strip: not an object file")),
        ),
    ]);

    let staged = project.builder.build(&executor, &job).expect("build succeeds");
    assert_eq!(staged.strip, StripOutcome::Failed);
    assert!(staged.binary.is_file());
}

#[rstest]
fn cargo_failure_is_a_build_error(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("arm32v7"),
        Flavor::Complete,
    );
    let args = project.builder.cargo_args(&job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "cargo",
        &arg_refs,
        Ok(failure_output("error: linker `arm-linux-gnueabihf-gcc` not found")),
    )]);

    let err = project.builder.build(&executor, &job).expect_err("build fails");
    match err {
        DistError::BuildFailed {
            artifact,
            target,
            reason,
        } => {
            assert_eq!(artifact, "bwt-0.2.4-arm32v7");
            assert_eq!(target, "armv7-unknown-linux-gnueabihf");
            assert!(reason.contains("linker"));
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert!(
        !project.builder.staging_dir(&job.artifact_name).exists(),
        "no directory is left at the artifact path"
    );
}

#[rstest]
fn cargo_timeout_is_a_build_error(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::Complete,
    );
    let args = project.builder.cargo_args(&job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "cargo",
        &arg_refs,
        Err(DistError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "cargo timed out after 60 seconds",
        ))),
    )]);

    let err = project.builder.build(&executor, &job).expect_err("build fails");
    assert!(
        matches!(&err, DistError::BuildFailed { reason, .. } if reason.contains("timed out")),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn missing_binary_is_a_staging_error(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::Complete,
    );
    let args = project.builder.cargo_args(&job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "cargo",
        &arg_refs,
        Ok(success_output()),
    )]);

    let err = project.builder.build(&executor, &job).expect_err("build fails");
    assert!(matches!(err, DistError::StagingFailed { .. }), "{err:?}");
}

#[rstest]
fn missing_license_is_a_staging_error(project: Project) {
    fs::remove_file(project.dir().join("LICENSE")).expect("remove license");
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::Complete,
    );
    let staged_binary = project.dist().join("bwt-0.2.4-x86_64-linux").join("bwt");
    let executor = StubExecutor::new(vec![
        cargo_call(&project, &job),
        ExpectedCall::new("strip", &[staged_binary.as_str()], Ok(success_output())),
    ]);

    let err = project.builder.build(&executor, &job).expect_err("build fails");
    assert!(
        matches!(&err, DistError::StagingFailed { reason } if reason.contains("LICENSE")),
        "{err:?}"
    );    assert!(
        !project.builder.staging_dir(&job.artifact_name).exists(),
        "partial staging directory is removed"
    );
}

#[rstest]
fn stale_staging_directory_is_replaced(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-linux"),
        Flavor::Complete,
    );
    let staging = project.builder.staging_dir(&job.artifact_name);
    fs::create_dir_all(&staging).expect("mkdir");
    fs::write(staging.join("leftover.txt"), "old").expect("write leftover");
    let staged_binary = staging.join("bwt");
    let executor = StubExecutor::new(vec![
        cargo_call(&project, &job),
        ExpectedCall::new("strip", &[staged_binary.as_str()], Ok(success_output())),
    ]);

    project.builder.build(&executor, &job).expect("build succeeds");
    assert!(!staging.join("leftover.txt").exists());
}

#[rstest]
fn failed_build_removes_stale_staging_directory(project: Project) {
    let job = BuildJob::new(
        &ProjectInfo::new("bwt", "0.2.4"),
        platform("x86_64-osx"),
        Flavor::Complete,
    );
    let staging = project.builder.staging_dir(&job.artifact_name);
    fs::create_dir_all(&staging).expect("mkdir");
    fs::write(staging.join("bwt"), "binary from an aborted run").expect("write leftover");
    let args = project.builder.cargo_args(&job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let executor = StubExecutor::new(vec![ExpectedCall::new(
        "cargo",
        &arg_refs,
        Ok(failure_output("boom")),
    )]);

    project.builder.build(&executor, &job).expect_err("build fails");
    assert!(!staging.exists());
}
