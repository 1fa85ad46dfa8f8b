//! Detection and replacement data models

pub mod detection;

pub use detection::{Category, Detection, DetectionMethod, Replacement, Span};
