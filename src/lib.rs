//! Reproducible release builder for bwt.
//!
//! Expands a platform matrix and two feature flavors into cargo builds,
//! strips and stages each binary with its README and LICENSE, and seals the
//! staging directories into byte-reproducible `.tar.gz` and `.zip` archives.
//! The electrum-only build is additionally repackaged as an Electrum plugin.

pub mod alias;
pub mod builder;
pub mod cleanup;
pub mod cli;
pub mod error;
pub mod executor;
pub mod features;
pub mod logging;
pub mod naming;
pub mod output;
pub mod packager;
pub mod packaging_error;
pub mod pipeline;
pub mod platform;
pub mod plugin;
pub mod strip;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;

pub use error::{DistError, Result};
