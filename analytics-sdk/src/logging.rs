//! Structured logging setup for binaries and demos built on the SDK
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host. `init_logging` is a convenience for hosts that have no
//! subscriber of their own.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{Result, ServiceError};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,

    /// Include the module path of each event
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more than
/// once is a no-op. An unknown `config.level` is rejected before anything is
/// installed, so a later call with a valid config still takes effect.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<()> {
    let config = config.unwrap_or_default();
    let filter = build_filter(&config.level)?;

    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let registry = Registry::default().with(filter);

    let installed = if config.json_format {
        registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };

    installed.map_err(|e| {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        ServiceError::configuration(format!("Failed to install log subscriber: {}", e))
    })
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    let level: LevelFilter = level
        .trim()
        .parse()
        .map_err(|e| ServiceError::configuration(format!("Invalid log level {}: {}", level, e)))?;

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("warn,analytics_sdk={}", level))
            .map_err(|e| ServiceError::configuration(format!("Invalid log level {}: {}", level, e))),
    }
}
