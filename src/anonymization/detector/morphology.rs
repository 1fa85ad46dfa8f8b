//! Lemma-based matching of inflected term variants
//!
//! Terms and block words are reduced to lemmas by a [`Lemmatizer`] and term
//! lemma sequences are searched for in the block's lemma sequence, so
//! "ООО «Ромашки»" still matches the dictionary term "ООО «Ромашка»".

use super::view::ViewToken;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

/// Reduces words to a normalized base form
pub trait Lemmatizer: Send + Sync {
    /// Base form of a single word
    fn lemma(&self, word: &str) -> String;

    /// Base forms of all words in `text`
    fn lemmatize(&self, text: &str) -> Vec<String> {
        split_words(text).map(|w| self.lemma(w)).collect()
    }
}

/// Snowball stemmer for Russian and English
///
/// Words containing Cyrillic letters use the Russian stemmer, everything else
/// the English one.
pub struct SnowballLemmatizer {
    russian: Stemmer,
    english: Stemmer,
}

impl SnowballLemmatizer {
    pub fn new() -> Self {
        Self {
            russian: Stemmer::create(Algorithm::Russian),
            english: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for SnowballLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn lemma(&self, word: &str) -> String {
        let lower = word.to_lowercase().replace('ё', "е");
        let is_cyrillic = lower
            .chars()
            .any(|c| matches!(c, '\u{0400}'..='\u{04FF}'));
        if is_cyrillic {
            self.russian.stem(&lower).into_owned()
        } else {
            self.english.stem(&lower).into_owned()
        }
    }
}

/// Words as maximal alphanumeric runs
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Index of term lemma sequences keyed by their first lemma
#[derive(Debug, Clone, Default)]
pub struct MorphologyMatcher {
    sequences: HashMap<String, Vec<Vec<String>>>,
}

impl MorphologyMatcher {
    pub fn new<'a>(terms: impl IntoIterator<Item = &'a str>, lemmatizer: &dyn Lemmatizer) -> Self {
        let mut sequences: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for term in terms {
            let lemmas = lemmatizer.lemmatize(term);
            let Some(first) = lemmas.first().cloned() else {
                continue;
            };
            let entry = sequences.entry(first).or_default();
            if !entry.contains(&lemmas) {
                entry.push(lemmas);
            }
        }
        Self { sequences }
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Matches as `(start, end)` view char offsets
    ///
    /// `lemmas[i]` must be the lemma of `tokens[i]`.
    pub fn find(&self, tokens: &[ViewToken], lemmas: &[String]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        for (i, lemma) in lemmas.iter().enumerate() {
            let Some(candidates) = self.sequences.get(lemma) else {
                continue;
            };
            for seq in candidates {
                let end = i + seq.len();
                if end <= lemmas.len() && lemmas[i..end] == seq[..] {
                    found.push((tokens[i].start, tokens[end - 1].end));
                }
            }
        }
        found
    }
}
