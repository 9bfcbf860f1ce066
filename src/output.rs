//! Output formatting for the release CLI.
//!
//! Renders the dry-run plan and the end-of-run summary of sealed archives
//! with their SHA-256 digests. Everything here is written to stderr.

use crate::builder::Builder;
use crate::error::Result;
use crate::packager::{SealedArchive, compute_sha256};
use crate::pipeline::{PlanStep, ReleasePlan};
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the dry-run listing of every step in `plan`.
///
/// Build steps show the exact cargo invocation `builder` would run.
#[must_use]
pub fn plan_text(plan: &ReleasePlan, builder: &Builder) -> String {
    let config = builder.config();
    let mut lines = vec![
        "Dry run - no files will be modified".to_owned(),
        String::new(),
        format!("Project: {} {}", plan.project.name(), plan.project.version()),
        format!("Project directory: {}", config.project_dir),
        format!("Dist directory: {}", config.dist_dir),
    ];
    if let Some(toolchain) = &config.toolchain {
        lines.push(format!("Toolchain: {toolchain}"));
    }

    lines.push(String::new());
    if plan.steps.is_empty() {
        lines.push("No platform matches the target filter.".to_owned());
        return lines.join("\n");
    }

    lines.push("Artifacts:".to_owned());
    for step in &plan.steps {
        let archive = step.artifact_name().archive_filename(step.format());
        match step {
            PlanStep::Build(job) => {
                lines.push(format!("  - {archive}"));
                lines.push(format!("      target:   {}", job.target));
                lines.push(format!("      features: {}", job.features));
                lines.push(format!("      command:  cargo {}", builder.cargo_args(job).join(" ")));
            }
            PlanStep::Plugin { source, .. } => {
                lines.push(format!("  - {archive}"));
                lines.push(format!("      repackaged from {source}"));
            }
        }
    }
    lines.join("\n")
}

/// A sealed archive and its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDigest {
    /// The archive.
    pub archive: SealedArchive,
    /// Lowercase hex SHA-256 of the archive bytes.
    pub sha256: String,
}

/// Hash every archive.
///
/// # Errors
///
/// Returns an I/O error if an archive cannot be read.
pub fn digest_archives(archives: &[SealedArchive]) -> Result<Vec<ArchiveDigest>> {
    archives
        .iter()
        .map(|archive| {
            Ok(ArchiveDigest {
                sha256: compute_sha256(&archive.path)?,
                archive: archive.clone(),
            })
        })
        .collect()
}

/// Format the run summary as `sha256sum`-style lines.
#[must_use]
pub fn summary_text(digests: &[ArchiveDigest]) -> String {
    let plural = if digests.len() == 1 { "archive" } else { "archives" };
    let mut lines = vec![format!("Sealed {} {plural}:", digests.len())];
    for digest in digests {
        let file_name = digest
            .archive
            .path
            .file_name()
            .unwrap_or_else(|| digest.archive.path.as_str());
        lines.push(format!("{}  {file_name}", digest.sha256));
    }
    lines.join("\n")
}
