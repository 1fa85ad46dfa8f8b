//! Logging and observability
//!
//! Structured logging with:
//! - Console output filtered by `RUST_LOG` or the configured level
//! - JSON log files with daily or hourly rotation
//!
//! Sensitive values never reach the logs. Events carry block ids, categories,
//! lengths and hashes only.
//!
//! # Example
//!
//! ```no_run
//! use docanon::logging::init_logging;
//! use docanon::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a document operation
///
/// # Example
///
/// ```no_run
/// use docanon::log_document_start;
///
/// log_document_start!("anonymize", 48_213usize);
/// ```
#[macro_export]
macro_rules! log_document_start {
    ($operation:expr, $size_bytes:expr) => {
        tracing::info!(
            operation = $operation,
            size_bytes = $size_bytes,
            "Processing document"
        );
    };
}

/// Log the completion of a document operation
///
/// # Example
///
/// ```no_run
/// use docanon::log_document_complete;
/// use std::time::Duration;
///
/// log_document_complete!("anonymize", 12usize, 0usize, Duration::from_millis(840));
/// ```
#[macro_export]
macro_rules! log_document_complete {
    ($operation:expr, $succeeded:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            operation = $operation,
            succeeded = $succeeded,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Document processed"
        );
    };
}

/// Log a replacement that could not be applied
///
/// # Example
///
/// ```no_run
/// use docanon::log_replacement_failure;
///
/// log_replacement_failure!("body/p3", "organization", "text_mismatch");
/// ```
#[macro_export]
macro_rules! log_replacement_failure {
    ($block_id:expr, $category:expr, $reason:expr) => {
        tracing::warn!(
            block_id = %$block_id,
            category = %$category,
            reason = %$reason,
            "Replacement skipped"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use docanon::log_error_with_context;
/// use docanon::domain::DocanonError;
///
/// let error = DocanonError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            reason = $error.reason(),
            context = $context,
            "Error occurred"
        );
    };
}
