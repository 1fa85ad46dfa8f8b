//! In-place replacement of block text spans
//!
//! Edits are screened against the extracted block text first, then applied
//! per paragraph in descending start order so the offsets of edits still to
//! be applied stay valid. Every edit is re-verified against the live run text
//! right before it is written. A failed edit is recorded and skipped; it never
//! aborts the rest of the batch.

use crate::anonymization::models::{Category, Replacement, Span};
use crate::docx::{replace_span, DocxDocument, Extraction, RunIndex, SpanEditError};
use crate::docx::xml::XmlElement;
use crate::domain::BlockId;
use crate::log_replacement_failure;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One text substitution inside a block
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub block_id: BlockId,
    pub position: Span,
    /// Text that must be at `position` for the edit to apply
    pub expected: String,
    pub replacement: String,
    pub category: Option<Category>,
}

impl From<&Replacement> for TextEdit {
    fn from(r: &Replacement) -> Self {
        Self {
            block_id: r.detection.block_id.clone(),
            position: r.detection.position,
            expected: r.detection.original_value.clone(),
            replacement: r.surrogate_token.to_string(),
            category: Some(r.detection.category),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No extracted block has this id
    UnknownBlock,
    /// Overlaps another edit of the same block
    Overlap,
    /// The text at the position differs from the expected text
    TextMismatch,
    OutOfRange,
    NoTextRun,
    /// The element could not be resolved or re-indexed
    StaleIndex,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownBlock => "unknown_block",
            Self::Overlap => "overlap",
            Self::TextMismatch => "text_mismatch",
            Self::OutOfRange => "out_of_range",
            Self::NoTextRun => "no_text_run",
            Self::StaleIndex => "stale_index",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SpanEditError> for FailureReason {
    fn from(e: SpanEditError) -> Self {
        match e {
            SpanEditError::OutOfRange => Self::OutOfRange,
            SpanEditError::NoTextRun => Self::NoTextRun,
            SpanEditError::StaleIndex => Self::StaleIndex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementFailure {
    pub block_id: BlockId,
    pub position: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub reason: FailureReason,
}

impl ReplacementFailure {
    fn new(edit: &TextEdit, reason: FailureReason) -> Self {
        log_replacement_failure!(
            edit.block_id,
            edit.category.map(|c| c.as_str()).unwrap_or("surrogate"),
            reason
        );
        Self {
            block_id: edit.block_id.clone(),
            position: edit.position,
            category: edit.category,
            reason,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// Edits written to the document
    pub applied: Vec<TextEdit>,
    pub failures: Vec<ReplacementFailure>,
}

impl ApplyOutcome {
    /// Applied edits per category; edits without a category are not counted
    pub fn applied_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for category in self.applied.iter().filter_map(|e| e.category) {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }
}

/// Groups edits by block and orders each group by descending start.
///
/// Exact duplicates collapse into one edit. An edit overlapping an edit
/// already accepted for the same block, naming an unknown block, or whose
/// expected text is not at its position in the extracted text is rejected.
pub fn screen(
    extraction: &Extraction,
    edits: Vec<TextEdit>,
) -> (BTreeMap<BlockId, Vec<TextEdit>>, Vec<ReplacementFailure>) {
    let mut failures = Vec::new();
    let mut grouped: BTreeMap<BlockId, Vec<TextEdit>> = BTreeMap::new();
    for edit in edits {
        grouped.entry(edit.block_id.clone()).or_default().push(edit);
    }

    let mut accepted = BTreeMap::new();
    for (block_id, mut group) in grouped {
        let Some(block) = extraction.block(&block_id) else {
            failures.extend(
                group
                    .iter()
                    .map(|e| ReplacementFailure::new(e, FailureReason::UnknownBlock)),
            );
            continue;
        };

        group.sort_by(|a, b| {
            b.position
                .start
                .cmp(&a.position.start)
                .then(b.position.end.cmp(&a.position.end))
        });
        group.dedup();

        let chars: Vec<char> = block.text.chars().collect();
        let mut kept: Vec<TextEdit> = Vec::with_capacity(group.len());
        for edit in group {
            let Some(slice) = chars.get(edit.position.start..edit.position.end) else {
                failures.push(ReplacementFailure::new(&edit, FailureReason::OutOfRange));
                continue;
            };
            if slice.iter().copied().ne(edit.expected.chars()) {
                failures.push(ReplacementFailure::new(&edit, FailureReason::TextMismatch));
                continue;
            }
            if kept
                .last()
                .is_some_and(|prev| prev.position.overlaps(&edit.position))
            {
                failures.push(ReplacementFailure::new(&edit, FailureReason::Overlap));
                continue;
            }
            kept.push(edit);
        }

        if !kept.is_empty() {
            accepted.insert(block_id, kept);
        }
    }

    (accepted, failures)
}

/// Applies edits to one paragraph element.
///
/// `edits` must already be sorted by descending start and non-overlapping,
/// as produced by [`screen`]. The run index is rebuilt before every edit and
/// the expected text is checked against the live runs.
pub fn apply(paragraph: &mut XmlElement, edits: Vec<TextEdit>) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for edit in edits {
        let index = match RunIndex::build(paragraph) {
            Ok(index) => index,
            Err(_) => {
                outcome
                    .failures
                    .push(ReplacementFailure::new(&edit, FailureReason::StaleIndex));
                continue;
            }
        };

        let (start, end) = (edit.position.start, edit.position.end);
        if index.slice(start, end).as_deref() != Some(edit.expected.as_str()) {
            outcome
                .failures
                .push(ReplacementFailure::new(&edit, FailureReason::TextMismatch));
            continue;
        }

        match replace_span(paragraph, &index, start, end, &edit.replacement) {
            Ok(()) => outcome.applied.push(edit),
            Err(e) => outcome
                .failures
                .push(ReplacementFailure::new(&edit, e.into())),
        }
    }

    outcome
}

/// Screens and applies edits across the whole document
pub fn apply_edits(
    doc: &mut DocxDocument,
    extraction: &Extraction,
    edits: Vec<TextEdit>,
) -> ApplyOutcome {
    let (by_block, failures) = screen(extraction, edits);
    let mut outcome = ApplyOutcome {
        applied: Vec::new(),
        failures,
    };

    for (block_id, edits) in by_block {
        // screen() only keeps edits of known blocks
        let Some(block) = extraction.block(&block_id) else {
            continue;
        };
        let Some(paragraph) = doc.element_mut(&block.element) else {
            outcome.failures.extend(
                edits
                    .iter()
                    .map(|e| ReplacementFailure::new(e, FailureReason::StaleIndex)),
            );
            continue;
        };
        let block_outcome = apply(paragraph, edits);
        outcome.applied.extend(block_outcome.applied);
        outcome.failures.extend(block_outcome.failures);
    }

    outcome
}
