//! Detection, anonymization and deanonymization of DOCX documents
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Detection**: dictionary, phrase, regex, NER and morphological strategies
//!   merged by a span resolver ([`detector`])
//! - **Deduplication**: identical block text is detected once, in batches under
//!   a per-document deadline ([`dedup`])
//! - **Anonymization**: per-run surrogate tokens ([`anonymizer`]) written in
//!   place by the run-aware applier ([`applier`])
//! - **Mapping**: token to original value table in CSV or JSON ([`mapping`])
//! - **Deanonymization**: token scan and reverse substitution ([`deanonymizer`])
//! - **Audit**: append-only log with hashed values ([`audit`])
//!
//! # Usage
//!
//! ```rust,ignore
//! use docanon::anonymization::{AnonymizationEngine, AnonymizationConfig, DetectionConfig};
//!
//! let engine = AnonymizationEngine::new(DetectionConfig::default(), AnonymizationConfig::default())?;
//! let output = engine.anonymize(&bytes, None).await?;
//! output.mapping.save(Path::new("mapping.csv"))?;
//! ```

pub mod anonymizer;
pub mod applier;
pub mod audit;
pub mod config;
pub mod deanonymizer;
pub mod dedup;
pub mod detector;
pub mod engine;
pub mod mapping;
pub mod models;
pub mod report;

// Re-export main types
pub use config::{AnonymizationConfig, AuditConfig, DetectionConfig};
pub use deanonymizer::ResolutionReport;
pub use engine::{
    AnalysisResult, AnonymizationEngine, AnonymizationOutput, DeanonymizationOutput,
    ReplacementStats,
};
pub use mapping::{MappingFormat, MappingRow, MappingTable};
pub use models::{Category, Detection, DetectionMethod, Replacement, Span};
pub use report::AnalysisReport;
