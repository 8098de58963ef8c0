//! Logging and observability
//!
//! Structured logging with:
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Console output on stderr
//! - Optional JSON files with daily, hourly or no rotation
//!
//! # Example
//!
//! ```no_run
//! use registrar::logging::init_logging;
//! use registrar::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(blob_id = "0b1f2c3d", "Upload started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a command
///
/// # Example
///
/// ```no_run
/// use registrar::log_operation_start;
///
/// log_operation_start!("sync", "antibodies.json");
/// ```
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr, $input:expr) => {
        tracing::info!(
            operation = $operation,
            input = %$input,
            "Starting operation"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use registrar::log_error_with_context;
/// use registrar::domain::RegistrarError;
///
/// let error = RegistrarError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
