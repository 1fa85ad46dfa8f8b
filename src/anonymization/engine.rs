//! Main anonymization engine
//!
//! [`AnonymizationEngine`] runs the three document operations:
//! - **Analyze**: extract blocks, detect once per unique block content under a
//!   per-document deadline, expand results to every block
//! - **Anonymize**: assign per-run surrogate tokens to selected detections and
//!   substitute them in place, producing the mapping table
//! - **Deanonymize**: substitute original values back for known tokens
//!
//! The engine holds only read-only state (detector, configuration, audit sink)
//! and can be shared across tasks behind an `Arc`. Each call opens its own copy
//! of the document and its own surrogate context.
//!
//! # Examples
//!
//! ```no_run
//! use docanon::anonymization::{AnonymizationEngine, AnonymizationConfig, DetectionConfig};
//!
//! # async fn example(bytes: Vec<u8>) -> docanon::domain::Result<()> {
//! let engine = AnonymizationEngine::new(DetectionConfig::default(), AnonymizationConfig::default())?;
//!
//! let analysis = engine.analyze(&bytes, None).await?;
//! let output = engine.anonymize_selected(&bytes, &analysis.detections)?;
//! let restored = engine.deanonymize(&output.document, &output.mapping)?;
//! assert_eq!(restored.report.unresolved, 0);
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    anonymizer::SurrogateContext,
    applier::{apply_edits, ReplacementFailure, TextEdit},
    audit::AuditLogger,
    config::{AnonymizationConfig, DetectionConfig},
    deanonymizer::{self, ResolutionReport},
    dedup::{detect_batched, expand, group_by_content},
    detector::{patterns::PatternStore, Detector, MultiStrategyDetector},
    mapping::MappingTable,
    models::{Category, Detection, Replacement, Span},
};
use crate::docx::{extract, DocxDocument, SkippedBlock};
use crate::domain::{BlockId, DocanonError, Result};
use crate::{log_document_complete, log_document_start};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Output of [`AnonymizationEngine::analyze`]
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Detections in block order, then by start offset
    pub detections: Vec<Detection>,
    /// False when the detection deadline expired
    pub complete: bool,
    /// Blocks left undetected by an expired deadline
    pub missing_blocks: Vec<BlockId>,
    pub blocks_total: usize,
    pub unique_blocks: usize,
    pub skipped_blocks: Vec<SkippedBlock>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    /// Number of blocks with at least one detection
    pub fn blocks_with_detections(&self) -> usize {
        self.detections
            .iter()
            .map(|d| &d.block_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Replacement statistics of an anonymize call
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplacementStats {
    /// Detections submitted
    pub requested: usize,
    pub total_replacements: usize,
    pub per_category_counts: BTreeMap<Category, usize>,
    /// Distinct surrogate tokens written
    pub unique_values: usize,
    pub failures: Vec<ReplacementFailure>,
}

impl ReplacementStats {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Output of an anonymize call
#[derive(Debug, Clone)]
pub struct AnonymizationOutput {
    /// Anonymized package, or the input bytes in dry-run mode
    pub document: Vec<u8>,
    /// One row per distinct value actually replaced
    pub mapping: MappingTable,
    pub replacements: Vec<Replacement>,
    pub stats: ReplacementStats,
    pub dry_run: bool,
}

/// Output of [`AnonymizationEngine::deanonymize`]
#[derive(Debug, Clone)]
pub struct DeanonymizationOutput {
    pub document: Vec<u8>,
    pub report: ResolutionReport,
}

/// Main anonymization engine
pub struct AnonymizationEngine {
    detection: DetectionConfig,
    config: AnonymizationConfig,
    detector: Arc<dyn Detector>,
    audit_logger: Option<AuditLogger>,
    pattern_warnings: Vec<String>,
}

impl AnonymizationEngine {
    /// Create an engine with the multi-strategy detector
    ///
    /// # Errors
    ///
    /// - [`DocanonError::Configuration`] if either configuration is invalid or
    ///   the audit log cannot be prepared
    /// - [`DocanonError::PatternStore`] if the pattern library cannot be loaded
    pub fn new(detection: DetectionConfig, config: AnonymizationConfig) -> Result<Self> {
        detection
            .validate()
            .map_err(|e| DocanonError::Configuration(format!("{e:#}")))?;

        let store = match detection.pattern_library {
            Some(ref path) => PatternStore::from_file(path),
            None => PatternStore::default_patterns(),
        }
        .map_err(|e| DocanonError::PatternStore(format!("{e:#}")))?;

        let pattern_warnings = store.warnings().to_vec();
        let detector = MultiStrategyDetector::new(Arc::new(store))
            .with_min_confidence(detection.min_confidence);

        let mut engine = Self::with_detector(detection, config, Arc::new(detector))?;
        engine.pattern_warnings = pattern_warnings;
        Ok(engine)
    }

    /// Create an engine around a custom detector
    pub fn with_detector(
        detection: DetectionConfig,
        config: AnonymizationConfig,
        detector: Arc<dyn Detector>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DocanonError::Configuration(format!("{e:#}")))?;

        let audit_logger = if config.audit.enabled {
            Some(
                AuditLogger::new(config.audit.log_path.clone(), config.audit.json_format)
                    .map_err(|e| DocanonError::Configuration(format!("{e:#}")))?,
            )
        } else {
            None
        };

        Ok(Self {
            detection,
            config,
            detector,
            audit_logger,
            pattern_warnings: Vec::new(),
        })
    }

    /// Rules skipped while loading the pattern library
    pub fn pattern_warnings(&self) -> &[String] {
        &self.pattern_warnings
    }

    /// Detects sensitive spans in every block of the document.
    ///
    /// `categories` overrides the configured category list. When the deadline
    /// expires the result is returned with `complete == false` and the
    /// undetected blocks listed in `missing_blocks`.
    pub async fn analyze(
        &self,
        document: &[u8],
        categories: Option<&[Category]>,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        log_document_start!("analyze", document.len());

        let categories: Arc<[Category]> =
            Arc::from(categories.unwrap_or(&self.detection.categories));
        if categories.is_empty() {
            return Err(DocanonError::MalformedInput(
                "no categories selected".to_string(),
            ));
        }

        let doc = DocxDocument::open(document)?;
        let extraction = extract(&doc)?;
        let groups = group_by_content(&extraction.blocks);

        let outcome = detect_batched(
            Arc::clone(&self.detector),
            &groups,
            categories,
            &self.detection.batch_options(),
        )
        .await?;

        let mut by_block = expand(&outcome.by_hash, &extraction.blocks);
        let detections: Vec<Detection> = extraction
            .blocks
            .iter()
            .filter_map(|b| by_block.remove(&b.block_id))
            .flatten()
            .collect();

        let missing: HashSet<_> = outcome.missing.iter().collect();
        let missing_blocks = groups
            .iter()
            .filter(|g| missing.contains(&g.hash))
            .flat_map(|g| g.members.iter().cloned())
            .collect();

        let result = AnalysisResult {
            detections,
            complete: outcome.complete,
            missing_blocks,
            blocks_total: extraction.blocks.len(),
            unique_blocks: groups.len(),
            skipped_blocks: extraction.skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            blocks = result.blocks_total,
            unique_blocks = result.unique_blocks,
            detections = result.detections.len(),
            complete = result.complete,
            "Analysis finished"
        );
        log_document_complete!(
            "analyze",
            result.detections.len(),
            result.missing_blocks.len(),
            start.elapsed()
        );
        Ok(result)
    }

    /// Replaces the selected detections with surrogate tokens.
    ///
    /// Detections that no longer match the document, name unknown blocks or
    /// overlap another selected detection are skipped and reported in
    /// [`ReplacementStats::failures`]. The mapping table only holds values that
    /// were actually replaced.
    pub fn anonymize_selected(
        &self,
        document: &[u8],
        selection: &[Detection],
    ) -> Result<AnonymizationOutput> {
        let start = Instant::now();
        log_document_start!("anonymize", document.len());

        let mut doc = DocxDocument::open(document)?;
        let extraction = extract(&doc)?;

        let mut context = SurrogateContext::new();
        let replacements = context.assign(selection)?;
        let edits: Vec<TextEdit> = replacements.iter().map(TextEdit::from).collect();
        let outcome = apply_edits(&mut doc, &extraction, edits);

        let applied_at: HashSet<(&BlockId, Span)> = outcome
            .applied
            .iter()
            .map(|e| (&e.block_id, e.position))
            .collect();
        let mut seen = HashSet::new();
        let applied: Vec<Replacement> = replacements
            .iter()
            .filter(|r| applied_at.contains(&(&r.detection.block_id, r.detection.position)))
            .filter(|r| seen.insert((r.detection.block_id.clone(), r.detection.position)))
            .cloned()
            .collect();

        let mapping = context.into_applied_mapping(&applied);

        let stats = ReplacementStats {
            requested: selection.len(),
            total_replacements: outcome.applied.len(),
            per_category_counts: outcome.applied_by_category(),
            unique_values: mapping.len(),
            failures: outcome.failures,
        };

        let dry_run = self.config.dry_run;
        let output_bytes = if dry_run {
            document.to_vec()
        } else {
            doc.save()?
        };

        if let Some(ref logger) = self.audit_logger {
            logger
                .log_anonymization(document, &applied, stats.failed(), dry_run, start.elapsed())
                .map_err(|e| DocanonError::Io(format!("{e:#}")))?;
        }

        if stats.failed() > 0 {
            warn!(
                failed = stats.failed(),
                applied = stats.total_replacements,
                "Some replacements were skipped"
            );
        }
        log_document_complete!(
            "anonymize",
            stats.total_replacements,
            stats.failed(),
            start.elapsed()
        );

        Ok(AnonymizationOutput {
            document: output_bytes,
            mapping,
            replacements: applied,
            stats,
            dry_run,
        })
    }

    /// Analyzes and replaces every detection.
    ///
    /// Fails closed: an analysis cut short by the deadline is a
    /// [`DocanonError::Timeout`] and nothing is replaced.
    pub async fn anonymize(
        &self,
        document: &[u8],
        categories: Option<&[Category]>,
    ) -> Result<AnonymizationOutput> {
        let analysis = self.analyze(document, categories).await?;
        if !analysis.complete {
            return Err(DocanonError::Timeout(format!(
                "detection finished for {} of {} blocks within {}s",
                analysis.blocks_total - analysis.missing_blocks.len(),
                analysis.blocks_total,
                self.detection.timeout_secs
            )));
        }
        self.anonymize_selected(document, &analysis.detections)
    }

    /// Restores original values for every known surrogate token
    pub fn deanonymize(
        &self,
        document: &[u8],
        mapping: &MappingTable,
    ) -> Result<DeanonymizationOutput> {
        let start = Instant::now();
        log_document_start!("deanonymize", document.len());

        let mut doc = DocxDocument::open(document)?;
        let extraction = extract(&doc)?;
        let report = deanonymizer::deanonymize(&mut doc, &extraction, mapping);
        let restored = doc.save()?;

        if let Some(ref logger) = self.audit_logger {
            logger
                .log_deanonymization(document, &report, start.elapsed())
                .map_err(|e| DocanonError::Io(format!("{e:#}")))?;
        }

        log_document_complete!(
            "deanonymize",
            report.resolved,
            report.unresolved + report.failed,
            start.elapsed()
        );

        Ok(DeanonymizationOutput {
            document: restored,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::DetectionMethod;
    use crate::docx::testing::{docx_bytes, p};
    use tempfile::tempdir;

    fn engine() -> AnonymizationEngine {
        AnonymizationEngine::new(DetectionConfig::default(), AnonymizationConfig::default())
            .unwrap()
    }

    fn texts(bytes: &[u8]) -> Vec<String> {
        let doc = DocxDocument::open(bytes).unwrap();
        extract(&doc).unwrap().blocks.into_iter().map(|b| b.text).collect()
    }

    #[tokio::test]
    async fn test_analyze_orders_by_block_then_offset() {
        let body = format!(
            "{}{}",
            p("Email: ivan@example.com, tel: +7 999 123-45-67"),
            p("Копия: ivan@example.com")
        );
        let analysis = engine().analyze(&docx_bytes(&body, &[]), None).await.unwrap();

        assert!(analysis.complete);
        assert_eq!(analysis.blocks_total, 2);
        let found: Vec<(&str, &str)> = analysis
            .detections
            .iter()
            .map(|d| (d.block_id.as_str(), d.original_value.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("body/p0", "ivan@example.com"),
                ("body/p0", "+7 999 123-45-67"),
                ("body/p1", "ivan@example.com"),
            ]
        );
    }

    #[tokio::test]
    async fn test_category_override() {
        let bytes = docx_bytes(&p("Email: ivan@example.com, tel: +7 999 123-45-67"), &[]);
        let analysis = engine()
            .analyze(&bytes, Some(&[Category::Phone]))
            .await
            .unwrap();
        assert_eq!(analysis.detections.len(), 1);
        assert_eq!(analysis.detections[0].category, Category::Phone);

        let err = engine().analyze(&bytes, Some(&[])).await.unwrap_err();
        assert_eq!(err.reason(), "malformed_input");
    }

    #[tokio::test]
    async fn test_round_trip_restores_text() {
        let body = format!(
            "{}{}",
            p("Email: ivan@example.com, tel: +7 999 123-45-67"),
            p("Повторно: ivan@example.com")
        );
        let bytes = docx_bytes(&body, &[]);
        let engine = engine();

        let output = engine.anonymize(&bytes, None).await.unwrap();
        assert_eq!(output.stats.total_replacements, 3);
        assert_eq!(output.stats.unique_values, 2);
        assert_eq!(output.mapping.len(), 2);

        let anonymized = texts(&output.document);
        assert!(anonymized.iter().all(|t| !t.contains("ivan@example.com")));

        let restored = engine.deanonymize(&output.document, &output.mapping).unwrap();
        assert_eq!(restored.report.resolved, 3);
        assert!(restored.report.is_complete());
        assert_eq!(texts(&restored.document), texts(&bytes));
    }

    #[test]
    fn test_dry_run_returns_input_bytes() {
        let config = AnonymizationConfig {
            dry_run: true,
            ..Default::default()
        };
        let engine = AnonymizationEngine::new(DetectionConfig::default(), config).unwrap();
        let bytes = docx_bytes(&p("Email: ivan@example.com"), &[]);
        let selection = vec![Detection::new(
            Category::Email,
            "ivan@example.com".to_string(),
            Span::new(7, 23).unwrap(),
            0.95,
            DetectionMethod::Regex,
            BlockId::new("body/p0").unwrap(),
        )
        .unwrap()];

        let output = engine.anonymize_selected(&bytes, &selection).unwrap();
        assert!(output.dry_run);
        assert_eq!(output.document, bytes);
        assert_eq!(output.stats.total_replacements, 1);
        assert_eq!(output.mapping.len(), 1);
    }

    #[test]
    fn test_failed_selection_is_not_mapped() {
        let bytes = docx_bytes(&p("Email: ivan@example.com"), &[]);
        let stale = Detection::new(
            Category::Email,
            "petr@example.com".to_string(),
            Span::new(7, 23).unwrap(),
            0.95,
            DetectionMethod::Regex,
            BlockId::new("body/p0").unwrap(),
        )
        .unwrap();

        let output = engine().anonymize_selected(&bytes, &[stale]).unwrap();
        assert_eq!(output.stats.total_replacements, 0);
        assert_eq!(output.stats.failed(), 1);
        assert!(output.mapping.is_empty());
        assert_eq!(texts(&output.document), vec!["Email: ivan@example.com"]);
    }

    #[test]
    fn test_failed_variant_does_not_decide_restored_spelling() {
        let bytes = docx_bytes(&p("Email: ivan@example.com"), &[]);
        let email = |value: &str, block: &str| {
            Detection::new(
                Category::Email,
                value.to_string(),
                Span::new(7, 23).unwrap(),
                0.95,
                DetectionMethod::Regex,
                BlockId::new(block).unwrap(),
            )
            .unwrap()
        };
        let selection = vec![
            email("IVAN@EXAMPLE.COM", "body/p9"),
            email("ivan@example.com", "body/p0"),
        ];

        let engine = engine();
        let output = engine.anonymize_selected(&bytes, &selection).unwrap();
        assert_eq!(output.stats.total_replacements, 1);
        assert_eq!(output.stats.failed(), 1);
        assert_eq!(output.mapping.len(), 1);
        assert_eq!(output.mapping.rows()[0].original_value, "ivan@example.com");

        let restored = engine.deanonymize(&output.document, &output.mapping).unwrap();
        assert_eq!(texts(&restored.document), vec!["Email: ivan@example.com"]);
    }

    #[test]
    fn test_structural_error_is_fatal() {
        let err = engine().anonymize_selected(b"not a zip", &[]).unwrap_err();
        assert_eq!(err.reason(), "document");
    }

    #[test]
    fn test_audit_written_without_plaintext() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let mut config = AnonymizationConfig::default();
        config.audit.enabled = true;
        config.audit.log_path = log_path.clone();

        let engine = AnonymizationEngine::new(DetectionConfig::default(), config).unwrap();
        let bytes = docx_bytes(&p("Email: ivan@example.com"), &[]);
        let selection = vec![Detection::new(
            Category::Email,
            "ivan@example.com".to_string(),
            Span::new(7, 23).unwrap(),
            0.95,
            DetectionMethod::Regex,
            BlockId::new("body/p0").unwrap(),
        )
        .unwrap()];
        let output = engine.anonymize_selected(&bytes, &selection).unwrap();
        engine.deanonymize(&output.document, &output.mapping).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains("ivan@example.com"));
    }
}
