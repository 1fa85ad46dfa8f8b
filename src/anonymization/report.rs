//! Analysis and dry-run reporting
//!
//! This module provides formatted reports of a detection pass, showing
//! per-category statistics, sample detections and warnings. When the report
//! follows an anonymize call it also carries replacement statistics.

use crate::anonymization::engine::{AnalysisResult, AnonymizationOutput};
use crate::anonymization::models::{Category, Detection};
use crate::domain::context::ResultExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const MAX_SAMPLES: usize = 20;
const MAX_SAMPLE_CHARS: usize = 50;

/// Report of one analyzed document
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Total detections
    pub total_detections: usize,

    /// Detections by category
    pub detections_by_category: BTreeMap<Category, usize>,

    /// Detections by strategy
    pub detections_by_method: BTreeMap<String, usize>,

    /// Sample detections (values truncated)
    pub samples: Vec<DetectionSample>,

    /// Warnings about incomplete or partial results
    pub warnings: Vec<String>,

    /// Block statistics
    pub stats: BlockStats,

    /// Present once replacements were computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<ReplacementSummary>,
}

/// Sample detection
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSample {
    /// Original value (truncated)
    pub original: String,

    /// Surrogate token, once assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surrogate: Option<String>,

    pub category: Category,
    pub block_id: String,
    pub method: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockStats {
    pub blocks_total: usize,
    pub unique_blocks: usize,
    pub blocks_with_detections: usize,
    pub blocks_skipped: usize,
    pub complete: bool,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplacementSummary {
    pub applied: usize,
    pub failed: usize,
    pub unique_values: usize,
    pub dry_run: bool,
}

impl AnalysisReport {
    /// Build a report from an analysis pass
    pub fn from_analysis(analysis: &AnalysisResult) -> Self {
        let mut report = Self {
            total_detections: analysis.detections.len(),
            stats: BlockStats {
                blocks_total: analysis.blocks_total,
                unique_blocks: analysis.unique_blocks,
                blocks_with_detections: analysis.blocks_with_detections(),
                blocks_skipped: analysis.skipped_blocks.len(),
                complete: analysis.complete,
                processing_time_ms: analysis.duration_ms,
            },
            ..Default::default()
        };

        for detection in &analysis.detections {
            *report
                .detections_by_category
                .entry(detection.category)
                .or_insert(0) += 1;
            *report
                .detections_by_method
                .entry(detection.method.to_string())
                .or_insert(0) += 1;
            report.add_sample(detection);
        }

        for skipped in &analysis.skipped_blocks {
            report.add_warning(format!(
                "Block {} was not analyzed: {}",
                skipped.block_id, skipped.reason
            ));
        }
        if !analysis.complete {
            report.add_warning(format!(
                "Detection deadline expired; {} block(s) were not analyzed",
                analysis.missing_blocks.len()
            ));
        }

        report
    }

    fn add_sample(&mut self, detection: &Detection) {
        if self.samples.len() >= MAX_SAMPLES {
            return;
        }
        self.samples.push(DetectionSample {
            original: truncate(&detection.original_value),
            surrogate: None,
            category: detection.category,
            block_id: detection.block_id.to_string(),
            method: detection.method.to_string(),
            confidence: detection.confidence,
        });
    }

    /// Attach replacement statistics and fill sample surrogates
    pub fn record_replacements(&mut self, output: &AnonymizationOutput) {
        let tokens: HashMap<(String, String), String> = output
            .replacements
            .iter()
            .map(|r| {
                (
                    (r.detection.block_id.to_string(), truncate(&r.detection.original_value)),
                    r.surrogate_token.to_string(),
                )
            })
            .collect();
        for sample in &mut self.samples {
            sample.surrogate = tokens
                .get(&(sample.block_id.clone(), sample.original.clone()))
                .cloned();
        }

        if output.stats.failed() > 0 {
            self.add_warning(format!(
                "{} replacement(s) were skipped",
                output.stats.failed()
            ));
        }
        self.replacements = Some(ReplacementSummary {
            applied: output.stats.total_replacements,
            failed: output.stats.failed(),
            unique_values: output.stats.unique_values,
            dry_run: output.dry_run,
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();
        let rule = "───────────────────────────────────────────────────────────────\n";

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                  DOCUMENT ANALYSIS REPORT                     \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("SUMMARY\n");
        output.push_str(rule);
        output.push_str(&format!(
            "  Blocks Analyzed:             {}\n",
            self.stats.blocks_total
        ));
        output.push_str(&format!(
            "  Unique Blocks:               {}\n",
            self.stats.unique_blocks
        ));
        output.push_str(&format!(
            "  Blocks with Detections:      {}\n",
            self.stats.blocks_with_detections
        ));
        output.push_str(&format!(
            "  Total Detections:            {}\n",
            self.total_detections
        ));
        output.push_str(&format!(
            "  Complete:                    {}\n",
            if self.stats.complete { "yes" } else { "no" }
        ));
        output.push_str(&format!(
            "  Processing Time:             {} ms\n",
            self.stats.processing_time_ms
        ));
        output.push('\n');

        if !self.detections_by_category.is_empty() {
            output.push_str("DETECTIONS BY CATEGORY\n");
            output.push_str(rule);

            let mut categories: Vec<_> = self.detections_by_category.iter().collect();
            categories.sort_by(|a, b| b.1.cmp(a.1));

            for (category, count) in categories {
                output.push_str(&format!("  {:30} {:>5}\n", category.label(), count));
            }
            output.push('\n');
        }

        if let Some(ref summary) = self.replacements {
            output.push_str(if summary.dry_run {
                "REPLACEMENTS (DRY RUN)\n"
            } else {
                "REPLACEMENTS\n"
            });
            output.push_str(rule);
            output.push_str(&format!("  Applied:                     {}\n", summary.applied));
            output.push_str(&format!("  Failed:                      {}\n", summary.failed));
            output.push_str(&format!(
                "  Unique Values:               {}\n",
                summary.unique_values
            ));
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("SAMPLE DETECTIONS\n");
            output.push_str(rule);

            for (i, sample) in self.samples.iter().take(10).enumerate() {
                output.push_str(&format!("\n  Sample #{}\n", i + 1));
                output.push_str(&format!("    Category:    {}\n", sample.category.label()));
                output.push_str(&format!("    Block:       {}\n", sample.block_id));
                output.push_str(&format!("    Method:      {}\n", sample.method));
                output.push_str(&format!(
                    "    Confidence:  {:.2}%\n",
                    sample.confidence * 100.0
                ));
                output.push_str(&format!("    Original:    \"{}\"\n", sample.original));
                if let Some(ref surrogate) = sample.surrogate {
                    output.push_str(&format!("    Surrogate:   {surrogate}\n"));
                }
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("WARNINGS\n");
            output.push_str(rule);
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &std::path::Path) -> crate::domain::Result<()> {
        let json = self.format_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))
    }
}

fn truncate(value: &str) -> String {
    if value.chars().count() > MAX_SAMPLE_CHARS {
        let head: String = value.chars().take(MAX_SAMPLE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}
