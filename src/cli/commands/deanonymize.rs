//! Deanonymize command implementation

use super::{build_engine, read_document, report_error, write_file};
use crate::anonymization::MappingTable;
use crate::cli::load_cli_config;
use crate::domain::DocanonError;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the deanonymize command
#[derive(Args, Debug)]
pub struct DeanonymizeArgs {
    /// Anonymized DOCX document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Mapping table written by `anonymize` (.csv or .json)
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Restored DOCX output
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the resolution report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl DeanonymizeArgs {
    /// Execute the deanonymize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting deanonymize command");

        let config = match load_cli_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_error(&e, "Failed to load configuration")),
        };
        let engine = match build_engine(&config) {
            Ok(e) => e,
            Err(e) => return Ok(report_error(&e, "Failed to initialize engine")),
        };
        let mapping = match MappingTable::load(&self.mapping) {
            Ok(m) => m,
            Err(e) => return Ok(report_error(&e, "Failed to read mapping table")),
        };
        let document = match read_document(&self.input) {
            Ok(d) => d,
            Err(e) => return Ok(report_error(&e, "Failed to read input document")),
        };

        let output = match engine.deanonymize(&document, &mapping) {
            Ok(o) => o,
            Err(e) => return Ok(report_error(&e, "Deanonymization failed")),
        };

        if let Err(e) = write_file(&self.output, &output.document) {
            return Ok(report_error(&e, "Failed to write restored document"));
        }

        let report = &output.report;
        if let Some(ref path) = self.report {
            let written = serde_json::to_vec_pretty(report)
                .map_err(DocanonError::from)
                .and_then(|json| write_file(path, &json));
            if let Err(e) = written {
                return Ok(report_error(&e, "Failed to write report"));
            }
        }

        println!("✅ Restored document written: {}", self.output.display());
        println!("  Tokens Found:     {}", report.total_found);
        println!("  Resolved:         {}", report.resolved);
        println!("  Unresolved:       {}", report.unresolved);
        println!("  Failed:           {}", report.failed);
        println!("  Success Rate:     {:.1}%", report.success_rate);
        if !report.unresolved_tokens.is_empty() {
            println!();
            println!("⚠️  Tokens without a mapping entry:");
            for token in &report.unresolved_tokens {
                println!("  • {token}");
            }
        }

        Ok(if report.is_complete() { 0 } else { 1 })
    }
}
