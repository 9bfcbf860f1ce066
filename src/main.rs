//! bwt-dist CLI entrypoint.
//!
//! Builds every selected platform and flavor of bwt, seals deterministic
//! archives into the dist directory, and prints their SHA-256 digests.

use bwt_dist::builder::Builder;
use bwt_dist::cli::Cli;
use bwt_dist::error::Result;
use bwt_dist::executor::SystemCommandExecutor;
use bwt_dist::logging;
use bwt_dist::output::{digest_archives, plan_text, summary_text, write_stderr_line};
use bwt_dist::pipeline::Pipeline;
use bwt_dist::version::ProjectInfo;
use clap::Parser;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    if logging::init(cli.log_level()).is_err() {
        write_stderr_line(&mut stderr, "warning: logger already installed");
    }
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let project = ProjectInfo::from_project_dir(&cli.project_dir)?;
    let pipeline = Pipeline::new(cli.run_config(), project);

    if cli.dry_run {
        let builder = Builder::new(pipeline.build_config());
        write_stderr_line(stderr, plan_text(&pipeline.plan(), &builder));
        return Ok(());
    }

    let executor = match cli.timeout() {
        Some(timeout) => SystemCommandExecutor::with_timeout(timeout),
        None => SystemCommandExecutor::new(),
    };
    let sealed = pipeline.run(&executor, stderr)?;

    if !cli.quiet {
        let digests = digest_archives(&sealed)?;
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, summary_text(&digests));
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
