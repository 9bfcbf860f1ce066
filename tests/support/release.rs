use bwt_dist::builder::{BuildJob, Builder};
use bwt_dist::pipeline::{Pipeline, PlanStep, RunConfig};
use bwt_dist::platform::PlatformFilter;
use bwt_dist::test_utils::{ExpectedCall, failure_output, success_output};
use bwt_dist::version::ProjectInfo;
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

/// A scratch bwt checkout with README, LICENSE and plugin sources.
pub struct ReleaseProject {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl ReleaseProject {
    /// Create the checkout in a fresh temporary directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir creation succeeds");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf8 temp path");
        fs::write(
            root.join("Cargo.toml"),
            "[package]\nname = \"bwt\"\nversion = \"0.2.4\"\n",
        )
        .expect("write manifest");
        fs::write(root.join("README.md"), "# bwt\n").expect("write readme");
        fs::write(root.join("LICENSE"), "MIT\n").expect("write license");
        let plugin = root.join("contrib").join("electrum-plugin");
        fs::create_dir_all(&plugin).expect("mkdir plugin");
        fs::write(plugin.join("__init__.py"), "").expect("write init");
        fs::write(plugin.join("bwt.py"), "# plugin\n").expect("write plugin");
        Self { _temp: temp, root }
    }

    /// Default dist directory.
    pub fn dist(&self) -> Utf8PathBuf {
        self.root.join("dist")
    }

    /// Quiet run configuration selecting `targets`.
    pub fn config(&self, targets: &str) -> RunConfig {
        let tokens: Vec<String> = targets
            .split(',')
            .map(str::to_owned)
            .collect();
        RunConfig {
            project_dir: self.root.clone(),
            dist_dir: self.dist(),
            plugin_dir: self.root.join("contrib").join("electrum-plugin"),
            filter: PlatformFilter::from_tokens(&tokens),
            toolchain: None,
            skip_complete: false,
            skip_plugin: false,
            quiet: true,
        }
    }

    /// Pipeline for `config`, reading the project metadata from disk.
    pub fn pipeline(&self, config: RunConfig) -> Pipeline {
        let project = ProjectInfo::from_project_dir(&self.root).expect("valid manifest");
        Pipeline::new(config, project)
    }

    /// Archive filenames currently in the dist directory, sorted.
    pub fn dist_listing(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.dist()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Build jobs of `pipeline`'s plan, in order.
pub fn build_jobs(pipeline: &Pipeline) -> Vec<BuildJob> {
    pipeline
        .plan()
        .steps
        .into_iter()
        .filter_map(|step| match step {
            PlanStep::Build(job) => Some(job),
            PlanStep::Plugin { .. } => None,
        })
        .collect()
}

/// Cargo and strip calls for a successful build of `job`.
pub fn successful_build(builder: &Builder, job: &BuildJob) -> Vec<ExpectedCall> {
    let staged = builder
        .staging_dir(&job.artifact_name)
        .join(format!("bwt{}", job.target.binary_extension()));
    let tool = job.target.profile().strip_tool.expect("matrix targets have a strip tool");
    vec![
        cargo_call(builder, job, success_output())
            .creating(builder.built_binary_path(job.target), job.target.as_str().as_bytes()),
        ExpectedCall::new(tool, &[staged.as_str()], Ok(success_output())),
    ]
}

/// A cargo call for `job` that fails with `stderr`.
pub fn failing_build(builder: &Builder, job: &BuildJob, stderr: &str) -> ExpectedCall {
    cargo_call(builder, job, failure_output(stderr))
}

fn cargo_call(builder: &Builder, job: &BuildJob, output: std::process::Output) -> ExpectedCall {
    let args = builder.cargo_args(job);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    ExpectedCall::new("cargo", &arg_refs, Ok(output))
}
