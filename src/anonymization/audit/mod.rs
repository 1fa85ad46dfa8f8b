//! Audit logging module
//!
//! One line per anonymize or deanonymize run. Values are recorded as SHA-256
//! hashes only.

pub mod logger;

pub use logger::{sha256_hex, AuditLogger};
