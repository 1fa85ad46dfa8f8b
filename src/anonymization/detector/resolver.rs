//! Cross-method, cross-category overlap resolution

use crate::anonymization::models::{Category, DetectionMethod, Span};
use std::cmp::Ordering;

/// A raw span produced by one strategy, in block char offsets
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub category: Category,
    pub span: Span,
    pub confidence: f32,
    pub method: DetectionMethod,
}

/// Priority order: longer span, then stronger method, then higher
/// confidence. Start offset and category make the order total.
fn priority(a: &Candidate, b: &Candidate) -> Ordering {
    b.span
        .len()
        .cmp(&a.span.len())
        .then_with(|| a.method.rank().cmp(&b.method.rank()))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.span.start.cmp(&b.span.start))
        .then_with(|| a.category.cmp(&b.category))
}

/// Drops candidates below their threshold, then greedily accepts them in
/// priority order, rejecting any that overlap an accepted one.
///
/// The result is non-overlapping and sorted by start offset.
pub fn resolve<F>(mut candidates: Vec<Candidate>, threshold: F) -> Vec<Candidate>
where
    F: Fn(Category) -> f32,
{
    candidates.retain(|c| c.confidence >= threshold(c.category));
    candidates.sort_by(priority);

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|a| !a.span.overlaps(&candidate.span)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|c| (c.span.start, c.span.end));
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn candidate(
        category: Category,
        start: usize,
        end: usize,
        confidence: f32,
        method: DetectionMethod,
    ) -> Candidate {
        Candidate {
            category,
            span: Span::new(start, end).unwrap(),
            confidence,
            method,
        }
    }

    #[test]
    fn test_longer_span_wins() {
        let accepted = resolve(
            vec![
                candidate(Category::Organization, 4, 10, 1.0, DetectionMethod::Dictionary),
                candidate(Category::GovernmentOrg, 0, 20, 0.75, DetectionMethod::Regex),
            ],
            |_| 0.0,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].category, Category::GovernmentOrg);
    }

    #[test_case(DetectionMethod::Dictionary, DetectionMethod::Morphological ; "dictionary beats morphological")]
    #[test_case(DetectionMethod::PhraseMatcher, DetectionMethod::Regex ; "phrase beats regex")]
    #[test_case(DetectionMethod::Regex, DetectionMethod::Ner ; "regex beats ner")]
    fn test_method_breaks_length_ties(winner: DetectionMethod, loser: DetectionMethod) {
        let accepted = resolve(
            vec![
                candidate(Category::PersonName, 0, 8, 0.99, loser),
                candidate(Category::Organization, 0, 8, 0.7, winner),
            ],
            |_| 0.0,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].method, winner);
    }

    #[test]
    fn test_confidence_breaks_remaining_ties() {
        let accepted = resolve(
            vec![
                candidate(Category::Phone, 3, 19, 0.7, DetectionMethod::Regex),
                candidate(Category::Phone, 3, 19, 0.9, DetectionMethod::Regex),
            ],
            |_| 0.0,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].confidence, 0.9);
    }

    #[test]
    fn test_threshold_filters_before_resolution() {
        let accepted = resolve(
            vec![
                candidate(Category::PersonName, 0, 20, 0.5, DetectionMethod::Ner),
                candidate(Category::Date, 5, 10, 0.9, DetectionMethod::Regex),
            ],
            |c| if c == Category::PersonName { 0.7 } else { 0.5 },
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].category, Category::Date);
    }

    #[test]
    fn test_output_sorted_and_disjoint() {
        let accepted = resolve(
            vec![
                candidate(Category::Phone, 30, 46, 0.9, DetectionMethod::Regex),
                candidate(Category::Email, 7, 23, 0.95, DetectionMethod::Regex),
                candidate(Category::Url, 10, 23, 0.9, DetectionMethod::Regex),
            ],
            |_| 0.0,
        );
        let spans: Vec<(usize, usize)> = accepted.iter().map(|c| (c.span.start, c.span.end)).collect();
        assert_eq!(spans, vec![(7, 23), (30, 46)]);
    }
}
