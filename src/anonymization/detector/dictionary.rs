//! Literal term matching for the dictionary and phrase strategies

use super::view::{fold_term, MatchView};
use aho_corasick::{AhoCorasick, MatchKind};
use tracing::warn;

/// Multi-term literal matcher over a [`MatchView`]
///
/// Case-sensitive matchers search the folded view, case-insensitive ones the
/// lowered view. Every occurrence is reported, including ones nested inside
/// longer matches; choosing between them is the resolver's job.
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    automaton: Option<AhoCorasick>,
    case_insensitive: bool,
}

impl LiteralMatcher {
    pub fn new<'a>(terms: impl IntoIterator<Item = &'a str>, case_insensitive: bool) -> Self {
        let mut patterns: Vec<String> = terms
            .into_iter()
            .map(|t| fold_term(t, case_insensitive))
            .filter(|t| !t.is_empty())
            .collect();
        patterns.sort();
        patterns.dedup();

        if patterns.is_empty() {
            return Self {
                automaton: None,
                case_insensitive,
            };
        }

        let automaton = match AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
        {
            Ok(ac) => Some(ac),
            Err(e) => {
                warn!(error = %e, terms = patterns.len(), "Failed to build term automaton, strategy disabled");
                None
            }
        };

        Self {
            automaton,
            case_insensitive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.automaton.is_none()
    }

    /// Word-bounded matches as `(start, end)` view char offsets
    pub fn find(&self, view: &MatchView) -> Vec<(usize, usize)> {
        let Some(ac) = &self.automaton else {
            return Vec::new();
        };
        let haystack = if self.case_insensitive {
            view.lowered()
        } else {
            view.folded()
        };

        ac.find_overlapping_iter(haystack)
            .filter_map(|m| {
                let (start, end) = if self.case_insensitive {
                    (
                        view.char_at_lowered_byte(m.start()),
                        view.char_at_lowered_byte(m.end()),
                    )
                } else {
                    (
                        view.char_at_folded_byte(m.start()),
                        view.char_at_folded_byte(m.end()),
                    )
                };
                view.is_word_bounded(start, end).then_some((start, end))
            })
            .collect()
    }
}
