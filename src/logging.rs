//! Log output for the binary.
//!
//! Library modules log through the `log` facade. The binary installs a
//! `tracing_subscriber` formatter on stderr once, with the level chosen on
//! the command line; `log` records reach it through the subscriber's
//! `tracing-log` bridge.

use log::LevelFilter;
use tracing_subscriber::filter::LevelFilter as SubscriberLevel;

/// Error raised when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Map a `log` level filter onto the subscriber's equivalent.
#[must_use]
pub const fn subscriber_level(level: LevelFilter) -> SubscriberLevel {
    match level {
        LevelFilter::Off => SubscriberLevel::OFF,
        LevelFilter::Error => SubscriberLevel::ERROR,
        LevelFilter::Warn => SubscriberLevel::WARN,
        LevelFilter::Info => SubscriberLevel::INFO,
        LevelFilter::Debug => SubscriberLevel::DEBUG,
        LevelFilter::Trace => SubscriberLevel::TRACE,
    }
}

/// Install the stderr subscriber and the `log` bridge.
///
/// # Errors
///
/// Returns [`InitError`] if a global subscriber or logger is already set.
pub fn init(level: LevelFilter) -> Result<(), InitError> {
    tracing_subscriber::fmt()
        .with_max_level(subscriber_level(level))
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init()
}
