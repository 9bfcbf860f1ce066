//! Shared helpers for the behaviour suites.
//!
//! `step_text` parses quoted step parameters; `release` builds a scratch bwt
//! project and the stubbed cargo/strip calls a pipeline run expects.
pub mod release;
pub mod step_text;
