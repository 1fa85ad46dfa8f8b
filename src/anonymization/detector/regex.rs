//! Regex strategy

use super::patterns::CompiledPattern;
use super::view::MatchView;
use tracing::debug;

/// A regex hit in view char offsets
#[derive(Debug, Clone, PartialEq)]
pub struct RegexHit {
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Runs every pattern over the folded view.
///
/// A pattern whose backtracking budget runs out on this text stops
/// contributing for this block only.
pub fn find_all(patterns: &[CompiledPattern], view: &MatchView) -> Vec<RegexHit> {
    let text = view.folded();
    let mut hits = Vec::new();

    for pattern in patterns {
        for capture in pattern.regex.captures_iter(text) {
            let capture = match capture {
                Ok(capture) => capture,
                Err(e) => {
                    debug!(pattern = %pattern.name, error = %e, "Regex aborted on block");
                    break;
                }
            };
            let Some(matched) = capture.name("value").or_else(|| capture.get(0)) else {
                continue;
            };
            if matched.start() == matched.end() {
                continue;
            }
            hits.push(RegexHit {
                start: view.char_at_folded_byte(matched.start()),
                end: view.char_at_folded_byte(matched.end()),
                confidence: pattern.confidence,
            });
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::detector::patterns::PatternStore;
    use crate::anonymization::models::Category;

    fn hits(category: Category, text: &str) -> Vec<String> {
        let store = PatternStore::default_patterns().unwrap();
        let view = MatchView::new(text);
        let chars: Vec<char> = view.folded().chars().collect();
        find_all(&store.rules(category).unwrap().patterns, &view)
            .into_iter()
            .map(|h| chars[h.start..h.end].iter().collect())
            .collect()
    }

    #[test]
    fn test_detect_email() {
        assert_eq!(
            hits(Category::Email, "Email: ivan@example.com, tel"),
            vec!["ivan@example.com"]
        );
    }

    #[test]
    fn test_detect_phone() {
        let found = hits(Category::Phone, "tel: +7 999 123-45-67.");
        assert!(found.iter().all(|f| f == "+7 999 123-45-67"));
        assert!(!found.is_empty());
    }

    #[test]
    fn test_value_group_narrows_span() {
        assert_eq!(hits(Category::Inn, "ИНН: 7707083893, КПП"), vec!["7707083893"]);
        assert_eq!(
            hits(Category::ContractNumber, "по договору № 15/2023-К от"),
            vec!["15/2023-К"]
        );
    }

    #[test]
    fn test_detect_russian_date() {
        assert_eq!(
            hits(Category::Date, "от 14 августа 2023 и 01.02.2024"),
            vec!["14 августа 2023", "01.02.2024"]
        );
    }

    #[test]
    fn test_ministry_across_folded_line_break() {
        assert_eq!(
            hits(Category::GovernmentOrg, "MINISTRY OF X\nAND Y, Moscow"),
            vec!["MINISTRY OF X AND Y"]
        );
    }
}
