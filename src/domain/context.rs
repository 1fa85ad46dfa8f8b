//! Error context extension trait
//!
//! `anyhow::Context`-style helpers for `Result<T, DocanonError>`. Context is
//! prepended to the message while the error variant is kept, so callers can
//! still branch on [`DocanonError::reason`]. Structural document errors are
//! passed through unchanged since they already name the failing part.
//!
//! # Examples
//!
//! ```rust
//! use docanon::domain::Result;
//! use docanon::domain::context::ResultExt;
//!
//! fn read_mapping(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read mapping table {path}"))
//! }
//! ```

use crate::domain::errors::DocanonError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add lazily computed context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DocanonError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| e.into().with_prefix(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().with_prefix(f()))
    }
}

impl DocanonError {
    fn with_prefix(self, context: impl std::fmt::Display) -> Self {
        let wrap = |message: String| format!("{context}: {message}");
        match self {
            Self::Configuration(m) => Self::Configuration(wrap(m)),
            Self::Document(e) => Self::Document(e),
            Self::PatternStore(m) => Self::PatternStore(wrap(m)),
            Self::Timeout(m) => Self::Timeout(wrap(m)),
            Self::Unavailable(m) => Self::Unavailable(wrap(m)),
            Self::MalformedInput(m) => Self::MalformedInput(wrap(m)),
            Self::MappingTable(m) => Self::MappingTable(wrap(m)),
            Self::Serialization(m) => Self::Serialization(wrap(m)),
            Self::Io(m) => Self::Io(wrap(m)),
            Self::Other(m) => Self::Other(wrap(m)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DocumentError;

    #[test]
    fn test_context_keeps_variant() {
        let result: Result<()> = Err(DocanonError::MappingTable("duplicate uuid".to_string()));
        let err = result.context("Failed to load mapping.csv").unwrap_err();

        assert_eq!(err.reason(), "mapping_table");
        let msg = err.to_string();
        assert!(msg.contains("Failed to load mapping.csv"));
        assert!(msg.contains("duplicate uuid"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            "Expensive context"
        });

        assert!(with_context.is_ok());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_context_chaining() {
        let result: Result<()> = Err(DocanonError::Timeout("detection".to_string()));
        let err = result
            .context("Batch 3 did not finish")
            .context("Failed to analyze contract.docx")
            .unwrap_err();

        assert_eq!(err.reason(), "timeout");
        let msg = err.to_string();
        assert!(msg.contains("Failed to analyze contract.docx"));
        assert!(msg.contains("Batch 3 did not finish"));
        assert!(msg.contains("detection"));
    }

    #[test]
    fn test_io_and_document_errors_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = Err::<(), _>(io_error)
            .context("Failed to read input.docx")
            .unwrap_err();
        assert_eq!(err.reason(), "io");
        assert!(err.to_string().contains("File not found"));

        let err = Err::<(), _>(DocumentError::MissingPart("word/document.xml".to_string()))
            .context("Failed to open input.docx")
            .unwrap_err();
        assert_eq!(err.reason(), "document");
        assert!(err.to_string().contains("word/document.xml"));
    }
}
