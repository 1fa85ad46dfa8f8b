//! Reverse substitution of surrogate tokens
//!
//! Blocks are scanned for the hyphenated UUID shape, case-insensitively. A
//! token may sit directly against letters or digits ("2023г.", "ИНН7707..."),
//! so the scan is not anchored on word boundaries. Known tokens are swapped
//! back to their original values through the same applier used for
//! anonymization; unknown tokens stay in place and are reported.

use crate::anonymization::applier::{apply_edits, ReplacementFailure, TextEdit};
use crate::anonymization::mapping::MappingTable;
use crate::anonymization::models::Span;
use crate::docx::{DocxDocument, Extraction};
use crate::domain::SurrogateToken;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

static TOKEN_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("static regex")
});

/// One token-shaped match in a block
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch {
    /// Char span in the block text
    pub position: Span,
    pub token: SurrogateToken,
    /// No hex digit or hyphen directly before or after the match
    pub bounded: bool,
}

fn continues_token(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Token-shaped matches in `text`, leftmost first
pub fn find_tokens(text: &str) -> Vec<TokenMatch> {
    TOKEN_SHAPE
        .find_iter(text)
        .filter_map(|m| {
            let start = text[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();
            let bounded = !continues_token(text[..m.start()].chars().next_back())
                && !continues_token(text[m.end()..].chars().next());
            Some(TokenMatch {
                position: Span::new(start, end).ok()?,
                token: SurrogateToken::new(m.as_str()).ok()?,
                bounded,
            })
        })
        .collect()
}

/// Outcome of a deanonymization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub total_found: usize,
    pub resolved: usize,
    /// Tokens with no mapping entry, left in place
    pub unresolved: usize,
    /// Tokens with a mapping entry that could not be written back
    pub failed: usize,
    /// `resolved / total_found` in percent, 100 when nothing was found
    pub success_rate: f64,
    pub unresolved_tokens: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ReplacementFailure>,
}

impl ResolutionReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved == 0 && self.failed == 0
    }
}

/// Restores original values in place
pub fn deanonymize(
    doc: &mut DocxDocument,
    extraction: &Extraction,
    mapping: &MappingTable,
) -> ResolutionReport {
    let mut report = ResolutionReport::default();
    let mut edits = Vec::new();

    for block in &extraction.blocks {
        for TokenMatch {
            position,
            token,
            bounded,
        } in find_tokens(&block.text)
        {
            let row = mapping.get(&token);
            // An unknown match inside a longer hex run is not a token
            if row.is_none() && !bounded {
                continue;
            }
            report.total_found += 1;
            let Some(row) = row else {
                report.unresolved += 1;
                report.unresolved_tokens.push(token.to_string());
                continue;
            };
            let expected: String = block
                .text
                .chars()
                .skip(position.start)
                .take(position.len())
                .collect();
            edits.push(TextEdit {
                block_id: block.block_id.clone(),
                position,
                expected,
                replacement: row.original_value.clone(),
                category: row.category,
            });
        }
    }

    let outcome = apply_edits(doc, extraction, edits);
    report.resolved = outcome.applied.len();
    report.failed = outcome.failures.len();
    report.failures = outcome.failures;
    report.unresolved_tokens.sort();
    report.unresolved_tokens.dedup();
    report.success_rate = if report.total_found == 0 {
        100.0
    } else {
        report.resolved as f64 / report.total_found as f64 * 100.0
    };

    debug!(
        found = report.total_found,
        resolved = report.resolved,
        unresolved = report.unresolved,
        "Surrogate tokens resolved"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::mapping::MappingRow;
    use crate::docx::extract;
    use crate::docx::testing::{docx_bytes, p};

    const KNOWN: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";
    const UNKNOWN: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    fn mapping() -> MappingTable {
        MappingTable::from_rows(vec![MappingRow {
            uuid: SurrogateToken::new(KNOWN).unwrap(),
            original_value: "ООО «Ромашка»".to_string(),
            category: None,
            confidence: None,
        }])
        .unwrap()
    }

    #[test]
    fn test_find_tokens_char_offsets() {
        let text = format!("Поставщик {} и {}", KNOWN.to_uppercase(), UNKNOWN);
        let found = find_tokens(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].position, Span::new(10, 46).unwrap());
        assert_eq!(found[0].token.as_str(), KNOWN);
        assert!(found[0].bounded);
        assert_eq!(found[1].position.start, 49);
    }

    #[test]
    fn test_find_tokens_glued_to_words() {
        let found = find_tokens(&format!("от {KNOWN}г., ИНН{UNKNOWN}"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].token.as_str(), KNOWN);
        assert_eq!(found[0].position, Span::new(3, 39).unwrap());
        assert!(found[0].bounded);
        assert_eq!(found[1].token.as_str(), UNKNOWN);
        assert!(found[1].bounded);

        let glued_hex = find_tokens(&format!("acc{KNOWN}0"));
        assert_eq!(glued_hex.len(), 1);
        assert_eq!(glued_hex[0].position, Span::new(3, 39).unwrap());
        assert!(!glued_hex[0].bounded);
    }

    #[test]
    fn test_glued_tokens_are_restored() {
        let body = format!(
            "{}{}",
            p(&format!("Акт от {KNOWN}г. подписан")),
            p(&format!("ИНН{KNOWN}, код dead{UNKNOWN}"))
        );
        let mut doc = DocxDocument::open(&docx_bytes(&body, &[])).unwrap();
        let extraction = extract(&doc).unwrap();

        let report = deanonymize(&mut doc, &extraction, &mapping());
        assert_eq!(report.total_found, 2);
        assert_eq!(report.resolved, 2);
        assert!(report.is_complete());

        let restored = DocxDocument::open(&doc.save().unwrap()).unwrap();
        let texts: Vec<String> = extract(&restored)
            .unwrap()
            .blocks
            .into_iter()
            .map(|b| b.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "Акт от ООО «Ромашка»г. подписан".to_string(),
                format!("ИННООО «Ромашка», код dead{UNKNOWN}")
            ]
        );
    }

    #[test]
    fn test_partial_resolution() {
        let body = format!("{}{}", p(&format!("Поставщик {KNOWN}, {KNOWN}")), p(UNKNOWN));
        let mut doc = DocxDocument::open(&docx_bytes(&body, &[])).unwrap();
        let extraction = extract(&doc).unwrap();

        let report = deanonymize(&mut doc, &extraction, &mapping());
        assert_eq!(report.total_found, 3);
        assert_eq!(report.resolved, 2);
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.unresolved_tokens, vec![UNKNOWN.to_string()]);
        assert!((report.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert!(!report.is_complete());

        let restored = DocxDocument::open(&doc.save().unwrap()).unwrap();
        let texts: Vec<String> = extract(&restored)
            .unwrap()
            .blocks
            .into_iter()
            .map(|b| b.text)
            .collect();
        assert_eq!(
            texts,
            vec!["Поставщик ООО «Ромашка», ООО «Ромашка»".to_string(), UNKNOWN.to_string()]
        );
    }

    #[test]
    fn test_nothing_found_is_full_success() {
        let mut doc = DocxDocument::open(&docx_bytes(&p("plain text"), &[])).unwrap();
        let extraction = extract(&doc).unwrap();
        let report = deanonymize(&mut doc, &extraction, &mapping());
        assert_eq!(report.total_found, 0);
        assert_eq!(report.success_rate, 100.0);
        assert!(report.is_complete());
    }
}
