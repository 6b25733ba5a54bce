//! # Telemetry
//!
//! Structured logging and Prometheus metrics for the client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sfs_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     tracing::info!("ready");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SFS_SERVICE_NAME` | `students-for-students` | Service name in logs |
//! | `SFS_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `SFS_JSON_LOGS` | `false` | JSON formatted logs |
//! | `SFS_LOG_SOURCE` | `false` | Include file and line |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, MEMBERSHIP_LOADS, NOTICES_POSTED, PROGRESS_UPDATES,
    REMOTE_WRITE_DURATION, SIGN_IN_REFUSALS, TOGGLES_COMMITTED, TOGGLES_DISPATCHED, TOGGLES_IGNORED,
    TOGGLES_ROLLED_BACK,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Registers metrics and installs the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
