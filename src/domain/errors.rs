//! Domain error types
//!
//! This module defines the error hierarchy for docanon. Only systemic failures are
//! expressed as errors: a document that cannot be opened, a pattern store that
//! cannot be loaded, a timed-out or unavailable collaborator, malformed input.
//! Per-item problems (a drifted replacement, an unresolved surrogate, an unreadable
//! block) are recorded in result statistics instead and never surface here.

use thiserror::Error;

/// Main docanon error type
#[derive(Debug, Error)]
pub enum DocanonError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structural document errors (fatal for the document)
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The pattern/dictionary store as a whole could not be loaded
    #[error("Pattern store error: {0}")]
    PatternStore(String),

    /// A bounded operation ran out of time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A collaborator (worker pool, recogniser) was not available
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Caller supplied input that cannot be interpreted
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Mapping table could not be read or written
    #[error("Mapping table error: {0}")]
    MappingTable(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Structural errors raised while opening or saving a DOCX package.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The byte stream is not a readable ZIP archive
    #[error("Invalid package archive: {0}")]
    Archive(String),

    /// A required package part is absent
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// A package part is not well-formed XML
    #[error("Malformed XML in {part}: {message}")]
    MalformedXml { part: String, message: String },

    /// The XML is well-formed but not a WordprocessingML document
    #[error("Unexpected document structure: {0}")]
    Structure(String),
}

impl DocanonError {
    /// Short machine-readable reason, used to distinguish failure classes at
    /// the service boundary.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Document(_) => "document",
            Self::PatternStore(_) => "pattern_store",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::MalformedInput(_) => "malformed_input",
            Self::MappingTable(_) => "mapping_table",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

impl From<std::io::Error> for DocanonError {
    fn from(err: std::io::Error) -> Self {
        DocanonError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DocanonError {
    fn from(err: serde_json::Error) -> Self {
        DocanonError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DocanonError {
    fn from(err: toml::de::Error) -> Self {
        DocanonError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for DocanonError {
    fn from(err: csv::Error) -> Self {
        DocanonError::MappingTable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docanon_error_display() {
        let err = DocanonError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_document_error_conversion() {
        let doc_err = DocumentError::MissingPart("word/document.xml".to_string());
        let err: DocanonError = doc_err.into();
        assert!(matches!(err, DocanonError::Document(_)));
        assert_eq!(err.reason(), "document");
    }

    #[test]
    fn test_boundary_reasons_are_distinct() {
        let timeout = DocanonError::Timeout("detection".to_string());
        let unavailable = DocanonError::Unavailable("worker pool".to_string());
        let malformed = DocanonError::MalformedInput("bad selection".to_string());
        assert_ne!(timeout.reason(), unavailable.reason());
        assert_ne!(unavailable.reason(), malformed.reason());
        assert_ne!(timeout.reason(), malformed.reason());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DocanonError = io_err.into();
        assert!(matches!(err, DocanonError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DocanonError = toml_err.into();
        assert!(matches!(err, DocanonError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_malformed_xml_display() {
        let err = DocumentError::MalformedXml {
            part: "word/header1.xml".to_string(),
            message: "unexpected end".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed XML in word/header1.xml: unexpected end"
        );
    }
}
