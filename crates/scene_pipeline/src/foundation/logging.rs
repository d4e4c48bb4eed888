//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use crate::config::LoggingConfig;

/// Initialize the logging system from `RUST_LOG`
///
/// Repeated calls are ignored, so tests and embedders may both call it.
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Initialize the logging system with the level from a pipeline config
///
/// `RUST_LOG` still refines the filter per module on top of the configured
/// default level.
pub fn init_with_config(config: &LoggingConfig) {
    let _ = env_logger::Builder::new()
        .filter_level(config.level.into())
        .parse_default_env()
        .try_init();
}
