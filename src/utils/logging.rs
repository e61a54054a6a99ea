//! Structured logging configuration.
//!
//! Thin wrapper over `tracing-subscriber`. Library code only emits
//! `tracing` events; a host that wants them on stderr calls [`init`] (or
//! installs its own subscriber and ignores this module).

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to the
/// given level for this crate. Safe to call more than once; later calls are
/// no-ops.
pub fn init(default_level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("proxy_preamble={default_level}"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// [`init`] with the level taken from a loaded [`LoggingConfig`].
///
/// [`LoggingConfig`]: crate::config::LoggingConfig
pub fn init_from(config: &crate::config::LoggingConfig) {
    init(config.level());
}
