//! Anonymize command implementation
//!
//! Replaces detections with surrogate tokens, writes the anonymized document
//! and the mapping table. Without `--selection` every detection is replaced.

use super::{build_engine, category_override, read_document, report_error, write_file};
use crate::anonymization::models::Detection;
use crate::anonymization::AnalysisReport;
use crate::cli::load_cli_config;
use crate::domain::DocanonError;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Input DOCX document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Anonymized DOCX output
    #[arg(short, long)]
    pub output: PathBuf,

    /// Mapping table output (.csv or .json)
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Detections to replace, as written by `analyze --output`
    #[arg(long)]
    pub selection: Option<PathBuf>,

    /// Categories to detect (comma-separated), overrides configuration
    #[arg(long, conflicts_with = "selection")]
    pub categories: Option<String>,

    /// Write the report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Compute replacements without writing the document or mapping
    #[arg(long)]
    pub dry_run: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting anonymize command");

        let mut config = match load_cli_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_error(&e, "Failed to load configuration")),
        };
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.anonymization.dry_run = true;
        }
        let categories = match category_override(self.categories.as_deref()) {
            Ok(c) => c,
            Err(e) => return Ok(report_error(&e, "Invalid --categories value")),
        };
        let engine = match build_engine(&config) {
            Ok(e) => e,
            Err(e) => return Ok(report_error(&e, "Failed to initialize anonymization")),
        };
        let document = match read_document(&self.input) {
            Ok(d) => d,
            Err(e) => return Ok(report_error(&e, "Failed to read input document")),
        };

        let (selection, mut report) = match self.selection {
            Some(ref path) => match read_selection(path) {
                Ok(s) => (s, None),
                Err(e) => return Ok(report_error(&e, "Failed to read selection")),
            },
            None => {
                let analysis = match engine.analyze(&document, categories.as_deref()).await {
                    Ok(a) => a,
                    Err(e) => return Ok(report_error(&e, "Analysis failed")),
                };
                if !analysis.complete {
                    let error = DocanonError::Timeout(format!(
                        "{} block(s) were not analyzed before the deadline; nothing was replaced",
                        analysis.missing_blocks.len()
                    ));
                    return Ok(report_error(&error, "Analysis incomplete"));
                }
                let report = AnalysisReport::from_analysis(&analysis);
                (analysis.detections, Some(report))
            }
        };

        let output = match engine.anonymize_selected(&document, &selection) {
            Ok(o) => o,
            Err(e) => return Ok(report_error(&e, "Anonymization failed")),
        };

        let report = report.get_or_insert_with(AnalysisReport::default);
        report.record_replacements(&output);

        if !output.dry_run {
            if let Err(e) = write_file(&self.output, &output.document) {
                return Ok(report_error(&e, "Failed to write anonymized document"));
            }
            if let Err(e) = output.mapping.save(&self.mapping) {
                return Ok(report_error(&e, "Failed to write mapping table"));
            }
            tracing::info!(
                output = %self.output.display(),
                mapping = %self.mapping.display(),
                rows = output.mapping.len(),
                "Anonymized document written"
            );
        }

        if let Some(ref path) = self.report {
            if let Err(e) = report.write_to_file(path) {
                return Ok(report_error(&e, "Failed to write report"));
            }
        }
        print!("{}", report.format_console());

        Ok(if output.stats.failed() > 0 { 1 } else { 0 })
    }
}

fn read_selection(path: &Path) -> crate::domain::Result<Vec<Detection>> {
    let bytes = read_document(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        DocanonError::MalformedInput(format!("Invalid selection {}: {e}", path.display()))
    })
}
