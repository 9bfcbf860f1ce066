//! CLI argument definitions for the release builder.
//!
//! Kept apart from the binary so the argument surface can be unit tested and
//! converted into a [`RunConfig`] without touching the filesystem.

use crate::pipeline::RunConfig;
use crate::platform::PlatformFilter;
use crate::version::default_dist_dir;
use camino::Utf8PathBuf;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::time::Duration;

/// Build reproducible bwt release archives.
#[derive(Parser, Debug, Clone)]
#[command(name = "bwt-dist")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build reproducible bwt release archives.\n\n",
    "For every selected platform, builds the complete and electrum-only ",
    "flavors with cargo, strips the binaries, and seals each staging ",
    "directory into a deterministic tar.gz or zip. The electrum-only build ",
    "is also repackaged as an Electrum plugin whose top-level directory is ",
    "`bwt`. Identical inputs produce byte-identical archives.",
))]
#[command(after_help = concat!(
    "PLATFORMS:\n",
    "  x86_64-linux   x86_64-unknown-linux-gnu        tar.gz\n",
    "  x86_64-osx     x86_64-apple-darwin             zip\n",
    "  x86_64-win     x86_64-pc-windows-gnu           zip\n",
    "  arm32v7        armv7-unknown-linux-gnueabihf   tar.gz\n",
    "  arm64v8        aarch64-unknown-linux-gnu       tar.gz\n\n",
    "EXAMPLES:\n",
    "  Build every platform:\n",
    "    $ bwt-dist\n\n",
    "  Build two platforms:\n",
    "    $ TARGETS=x86_64-linux,arm64v8 bwt-dist\n\n",
    "  Preview the artifacts and cargo commands:\n",
    "    $ bwt-dist --dry-run --targets x86_64-win",
))]
pub struct Cli {
    /// Project directory containing Cargo.toml, README.md and LICENSE.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: Utf8PathBuf,

    /// Output directory for archives [default: <project-dir>/dist].
    #[arg(long, value_name = "DIR")]
    pub dist_dir: Option<Utf8PathBuf>,

    /// Electrum plugin sources [default: <project-dir>/contrib/electrum-plugin].
    #[arg(long, value_name = "DIR")]
    pub plugin_dir: Option<Utf8PathBuf>,

    /// Platforms to build, comma or space separated [default: all].
    ///
    /// A platform is selected when its alias occurs anywhere in a token.
    #[arg(long, env = "TARGETS", value_name = "LIST")]
    pub targets: Option<String>,

    /// Rustup toolchain passed to cargo as `+TOOLCHAIN`.
    #[arg(long, value_name = "TOOLCHAIN")]
    pub toolchain: Option<String>,

    /// Kill cargo or strip after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Build only the electrum-only and plugin artifacts.
    #[arg(
        long,
        env = "ELECTRUM_ONLY_ONLY",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub skip_complete: bool,

    /// Do not produce Electrum plugin artifacts.
    #[arg(long)]
    pub skip_plugin: bool,

    /// Show the planned artifacts and exit without building.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Output directory, defaulting to `<project-dir>/dist`.
    #[must_use]
    pub fn dist_dir(&self) -> Utf8PathBuf {
        self.dist_dir
            .clone()
            .unwrap_or_else(|| default_dist_dir(&self.project_dir))
    }

    /// Plugin source directory, defaulting to
    /// `<project-dir>/contrib/electrum-plugin`.
    #[must_use]
    pub fn plugin_dir(&self) -> Utf8PathBuf {
        self.plugin_dir
            .clone()
            .unwrap_or_else(|| self.project_dir.join("contrib").join("electrum-plugin"))
    }

    /// Split `--targets` into filter tokens.
    #[must_use]
    pub fn target_tokens(&self) -> Vec<String> {
        self.targets
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Per-process timeout, if one was given.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Log level selected by `-q` and `-v`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Pipeline configuration for this invocation.
    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            project_dir: self.project_dir.clone(),
            dist_dir: self.dist_dir(),
            plugin_dir: self.plugin_dir(),
            filter: PlatformFilter::from_tokens(&self.target_tokens()),
            toolchain: self.toolchain.clone(),
            skip_complete: self.skip_complete,
            skip_plugin: self.skip_plugin,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
