//! Analyze command implementation
//!
//! Detects sensitive spans and prints an analysis report. The detections can
//! be saved as JSON, edited, and fed back to `anonymize --selection`.

use super::{build_engine, category_override, read_document, report_error, write_file};
use crate::anonymization::AnalysisReport;
use crate::cli::load_cli_config;
use crate::domain::DocanonError;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input DOCX document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Categories to detect (comma-separated), overrides configuration
    #[arg(long)]
    pub categories: Option<String>,

    /// Write detections as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    /// Execute the analyze command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting analyze command");

        let config = match load_cli_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_error(&e, "Failed to load configuration")),
        };
        let categories = match category_override(self.categories.as_deref()) {
            Ok(c) => c,
            Err(e) => return Ok(report_error(&e, "Invalid --categories value")),
        };
        let engine = match build_engine(&config) {
            Ok(e) => e,
            Err(e) => return Ok(report_error(&e, "Failed to initialize detection")),
        };
        let document = match read_document(&self.input) {
            Ok(d) => d,
            Err(e) => return Ok(report_error(&e, "Failed to read input document")),
        };

        let analysis = match engine.analyze(&document, categories.as_deref()).await {
            Ok(a) => a,
            Err(e) => return Ok(report_error(&e, "Analysis failed")),
        };

        if let Some(ref path) = self.output {
            let written = serde_json::to_vec_pretty(&analysis.detections)
                .map_err(DocanonError::from)
                .and_then(|json| write_file(path, &json));
            if let Err(e) = written {
                return Ok(report_error(&e, "Failed to write detections"));
            }
            tracing::info!(path = %path.display(), "Detections written");
        }

        let mut report = AnalysisReport::from_analysis(&analysis);
        for warning in engine.pattern_warnings() {
            report.add_warning(warning.clone());
        }

        if self.json {
            match report.format_json() {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    let error = DocanonError::from(e);
                    return Ok(report_error(&error, "Failed to serialize report"));
                }
            }
        } else {
            print!("{}", report.format_console());
        }

        Ok(if analysis.complete { 0 } else { 1 })
    }
}
