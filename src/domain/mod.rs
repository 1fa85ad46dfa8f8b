//! Domain types for docanon.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`BlockId`], [`ContentHash`], [`SurrogateToken`])
//! - **Error types** ([`DocanonError`], [`DocumentError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! Only systemic failures are errors. Per-item failures are counted in the
//! statistics returned by each operation:
//!
//! ```rust
//! use docanon::domain::{DocanonError, Result};
//!
//! fn open(bytes: &[u8]) -> Result<()> {
//!     if bytes.is_empty() {
//!         return Err(DocanonError::MalformedInput("empty document".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{DocanonError, DocumentError};
pub use ids::{BlockId, ContentHash, SurrogateToken};
pub use result::Result;
