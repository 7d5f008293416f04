//! # Trellis Telemetry
//!
//! Logging setup for Trellis services. The library crates only emit
//! `tracing` events; this crate installs the subscriber that renders them.
//!
//! ```rust,ignore
//! use trellis_config::ConfigLoader;
//! use trellis_telemetry::{init_logging, LogConfig};
//!
//! let config = ConfigLoader::new().with_env_prefix("TRELLIS").load()?;
//! init_logging(&LogConfig::from(&config.logging))?;
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
