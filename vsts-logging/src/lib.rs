//! Logging support for the VSTS OAuth bridge
//!
//! This crate provides:
//! - tracing-subscriber initialisation with an `EnvFilter` and a choice of output format
//! - Log sanitization so client secrets and tokens never reach the log sink
//!
//! # Example
//!
//! ```rust,no_run
//! use vsts_logging::{LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig {
//!     level: "info".to_string(),
//!     format: LogFormat::Compact,
//! };
//! config.initialize().expect("Failed to initialize logging");
//!
//! tracing::info!(port = 3000, "app listening");
//! ```

pub mod config;
pub mod sanitization;

pub use config::{LogFormat, LoggingConfig};
pub use sanitization::{LogSanitizer, SanitizationConfig};

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Logging error types
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Invalid level or format
    #[error("Configuration error: {0}")]
    Config(String),

    /// Subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}
