//! Surrogate assignment
//!
//! Accepted detections are turned into [`Replacement`]s by a per-run
//! [`SurrogateContext`]. Token generation sits behind [`TokenGenerator`] so tests
//! can use deterministic sequences.
//!
//! [`Replacement`]: crate::anonymization::models::Replacement

pub mod surrogate;
pub mod tokenization;

use crate::domain::SurrogateToken;

pub use surrogate::SurrogateContext;
pub use tokenization::UuidTokenGenerator;

/// Source of fresh surrogate tokens
pub trait TokenGenerator: Send {
    /// Produce a new token; uniqueness within a run is checked by the caller
    fn generate(&mut self) -> SurrogateToken;
}
