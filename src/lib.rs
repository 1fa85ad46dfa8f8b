// docanon - Reversible redaction of sensitive data in DOCX documents
// Copyright (c) 2025 Docanon Contributors
// Licensed under the MIT License

//! # docanon - reversible DOCX redaction
//!
//! docanon finds sensitive values in Word documents (names, organizations,
//! government bodies, addresses, phones, emails, identifiers) and replaces them
//! in place with opaque surrogate tokens, keeping run formatting intact. A
//! mapping table from token to original value makes the operation reversible.
//!
//! ## Architecture
//!
//! - [`docx`] - Package I/O, XML tree, block extraction, run-aware span edits
//! - [`anonymization`] - Detection, surrogates, replacement, deanonymization
//! - [`domain`] - Identifiers and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`cli`] - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docanon::anonymization::{AnonymizationConfig, AnonymizationEngine, DetectionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnonymizationEngine::new(
//!         DetectionConfig::default(),
//!         AnonymizationConfig::default(),
//!     )?;
//!
//!     let bytes = std::fs::read("contract.docx")?;
//!     let output = engine.anonymize(&bytes, None).await?;
//!
//!     std::fs::write("contract.anon.docx", &output.document)?;
//!     output.mapping.save(Path::new("mapping.csv"))?;
//!     println!("Replaced {} values", output.stats.total_replacements);
//!     Ok(())
//! }
//! ```
//!
//! ## Review Before Replacing
//!
//! Analysis and replacement are separate steps, so a reviewer can drop false
//! positives before anything is written:
//!
//! ```rust,no_run
//! # use docanon::anonymization::{AnonymizationEngine, Category};
//! # async fn example(engine: &AnonymizationEngine, bytes: &[u8]) -> docanon::domain::Result<()> {
//! let analysis = engine.analyze(bytes, None).await?;
//! let selection: Vec<_> = analysis
//!     .detections
//!     .into_iter()
//!     .filter(|d| d.category != Category::Date)
//!     .collect();
//! let output = engine.anonymize_selected(bytes, &selection)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Only systemic failures are [`domain::DocanonError`] values. Drifted
//! replacements, unresolved tokens and unreadable blocks are reported in the
//! returned statistics.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod docx;
pub mod domain;
pub mod logging;
