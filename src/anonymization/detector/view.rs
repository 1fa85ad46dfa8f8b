//! Matching view of a block's text
//!
//! Strategies match against a folded copy of the block text in which every
//! whitespace run (spaces, tabs, line breaks) is a single space, so a phrase
//! wrapped over two rendered lines still matches. Spans found in the view are
//! mapped back to char offsets of the untouched block text.

use crate::anonymization::models::Span;

/// A word of the folded view, `[start, end)` in view chars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewToken {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct MatchView {
    folded: String,
    lowered: String,
    chars: Vec<char>,
    to_block: Vec<usize>,
    folded_starts: Vec<usize>,
    lowered_starts: Vec<usize>,
}

impl MatchView {
    pub fn new(block_text: &str) -> Self {
        let mut chars = Vec::new();
        let mut to_block = Vec::new();
        let mut in_space = false;

        for (i, c) in block_text.chars().enumerate() {
            if c.is_whitespace() {
                if !in_space {
                    chars.push(' ');
                    to_block.push(i);
                }
                in_space = true;
            } else {
                chars.push(c);
                to_block.push(i);
                in_space = false;
            }
        }

        let folded: String = chars.iter().collect();
        // One char per char so offsets agree with `folded`.
        let lowered: String = chars.iter().map(|&c| lower_char(c)).collect();
        let folded_starts = char_starts(&folded);
        let lowered_starts = char_starts(&lowered);

        Self {
            folded,
            lowered,
            chars,
            to_block,
            folded_starts,
            lowered_starts,
        }
    }

    /// Whitespace-folded text
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Lowercased [`folded`](Self::folded), char-aligned with it
    pub fn lowered(&self) -> &str {
        &self.lowered
    }

    pub fn char_len(&self) -> usize {
        self.chars.len()
    }

    /// Char offset of a byte offset in [`folded`](Self::folded)
    pub fn char_at_folded_byte(&self, byte: usize) -> usize {
        char_index(&self.folded_starts, byte)
    }

    /// Char offset of a byte offset in [`lowered`](Self::lowered)
    pub fn char_at_lowered_byte(&self, byte: usize) -> usize {
        char_index(&self.lowered_starts, byte)
    }

    /// True if `[start, end)` does not cut through a word on either side
    pub fn is_word_bounded(&self, start: usize, end: usize) -> bool {
        let inside_first = self.chars.get(start).copied();
        let inside_last = end.checked_sub(1).and_then(|i| self.chars.get(i)).copied();
        let before = start.checked_sub(1).and_then(|i| self.chars.get(i)).copied();
        let after = self.chars.get(end).copied();

        let left_ok = !(is_word(before) && is_word(inside_first));
        let right_ok = !(is_word(after) && is_word(inside_last));
        left_ok && right_ok
    }

    /// Maps a view span to a block span, trimming surrounding whitespace.
    pub fn to_block_span(&self, start: usize, end: usize) -> Option<Span> {
        let end = end.min(self.chars.len());
        let mut start = start;
        let mut end = end;
        while start < end && self.chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        if start >= end {
            return None;
        }
        Span::new(self.to_block[start], self.to_block[end - 1] + 1).ok()
    }

    /// Words (maximal runs of alphanumerics) in view order
    pub fn tokens(&self) -> Vec<ViewToken> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in self.chars.iter().enumerate() {
            match (c.is_alphanumeric(), start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    tokens.push(self.token(s, i));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            tokens.push(self.token(s, self.chars.len()));
        }
        tokens
    }

    fn token(&self, start: usize, end: usize) -> ViewToken {
        ViewToken {
            start,
            end,
            text: self.chars[start..end].iter().collect(),
        }
    }
}

/// Folds a dictionary term the way [`MatchView`] folds block text.
pub fn fold_term(term: &str, lowercase: bool) -> String {
    let folded = term.split_whitespace().collect::<Vec<_>>().join(" ");
    if lowercase {
        folded.chars().map(lower_char).collect()
    } else {
        folded
    }
}

fn lower_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn is_word(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn char_starts(s: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = s.char_indices().map(|(b, _)| b).collect();
    starts.push(s.len());
    starts
}

fn char_index(starts: &[usize], byte: usize) -> usize {
    match starts.binary_search(&byte) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_whitespace_runs() {
        let view = MatchView::new("MINISTRY OF X\nAND  Y");
        assert_eq!(view.folded(), "MINISTRY OF X AND Y");
    }

    #[test]
    fn test_span_maps_back_across_line_break() {
        let text = "MINISTRY OF X\nAND Y";
        let view = MatchView::new(text);
        let span = view.to_block_span(0, view.char_len()).unwrap();
        let original: String = text.chars().skip(span.start).take(span.len()).collect();
        assert_eq!(original, "MINISTRY OF X\nAND Y");
    }

    #[test]
    fn test_span_maps_back_after_collapsed_run() {
        let text = "a\t\t  ООО Ромашка";
        let view = MatchView::new(text);
        assert_eq!(view.folded(), "a ООО Ромашка");
        let span = view.to_block_span(2, 13).unwrap();
        assert_eq!(span, Span::new(5, 16).unwrap());
    }

    #[test]
    fn test_lowered_is_char_aligned() {
        let view = MatchView::new("ГИС ЖКХ");
        assert_eq!(view.lowered(), "гис жкх");
        assert_eq!(view.lowered().chars().count(), view.char_len());
        let byte = view.lowered().find("жкх").unwrap();
        assert_eq!(view.char_at_lowered_byte(byte), 4);
    }

    #[test]
    fn test_word_boundaries() {
        let view = MatchView::new("ИванИванов и Иван");
        assert!(!view.is_word_bounded(0, 4));
        assert!(view.is_word_bounded(13, 17));
        assert!(view.is_word_bounded(0, 10));
    }

    #[test]
    fn test_tokens() {
        let view = MatchView::new("ООО «Ромашка», г. Москва");
        let words: Vec<String> = view.tokens().into_iter().map(|t| t.text).collect();
        assert_eq!(words, vec!["ООО", "Ромашка", "г", "Москва"]);
    }
}
