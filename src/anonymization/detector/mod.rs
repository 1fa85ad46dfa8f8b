//! Multi-strategy sensitive data detection
//!
//! Each enabled category runs its configured methods in priority order
//! (dictionary, phrase, regex, NER, morphological) against a whitespace-folded
//! view of the block text. All raw spans from all categories go through one
//! overlap resolution pass, so the detections of a block never overlap.

pub mod dictionary;
pub mod morphology;
pub mod ner;
pub mod patterns;
pub mod regex;
pub mod resolver;
pub mod view;

use crate::anonymization::models::{Category, Detection, DetectionMethod};
use crate::domain::ids::BlockId;
use dictionary::LiteralMatcher;
use morphology::{Lemmatizer, MorphologyMatcher, SnowballLemmatizer};
use ner::{EntityRecognizer, HeuristicRecognizer, RecognizedEntity};
use patterns::PatternStore;
use resolver::Candidate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use view::{MatchView, ViewToken};

/// Confidence of an exact dictionary hit
pub const DICTIONARY_CONFIDENCE: f32 = 1.0;
/// Confidence of a case-insensitive phrase hit
pub const PHRASE_CONFIDENCE: f32 = 0.95;
/// Confidence of a lemma sequence hit
pub const MORPHOLOGICAL_CONFIDENCE: f32 = 0.7;

/// Trait for block-level detectors
pub trait Detector: Send + Sync {
    /// Detects sensitive spans in one block's text.
    ///
    /// Positions are char offsets into `text`; the result is non-overlapping
    /// and sorted by start.
    fn detect(&self, block_id: &BlockId, text: &str, categories: &[Category]) -> Vec<Detection>;
}

struct CategoryMatchers {
    dictionary: LiteralMatcher,
    phrases: LiteralMatcher,
    morphology: MorphologyMatcher,
}

/// Detector combining all strategies over a shared [`PatternStore`]
pub struct MultiStrategyDetector {
    store: Arc<PatternStore>,
    matchers: BTreeMap<Category, CategoryMatchers>,
    recognizer: Arc<dyn EntityRecognizer>,
    lemmatizer: Arc<dyn Lemmatizer>,
    min_confidence: f32,
}

impl MultiStrategyDetector {
    /// Creates a detector with the built-in recognizer and lemmatizer
    pub fn new(store: Arc<PatternStore>) -> Self {
        Self::with_capabilities(
            store,
            Arc::new(HeuristicRecognizer),
            Arc::new(SnowballLemmatizer::new()),
        )
    }

    /// Creates a detector with explicit NER and lemmatization capabilities
    pub fn with_capabilities(
        store: Arc<PatternStore>,
        recognizer: Arc<dyn EntityRecognizer>,
        lemmatizer: Arc<dyn Lemmatizer>,
    ) -> Self {
        let matchers = store
            .categories()
            .filter_map(|category| {
                let rules = store.rules(category)?;
                Some((
                    category,
                    CategoryMatchers {
                        dictionary: LiteralMatcher::new(rules.dictionary.iter().map(String::as_str), false),
                        phrases: LiteralMatcher::new(
                            rules.dictionary.iter().chain(rules.phrases.iter()).map(String::as_str),
                            true,
                        ),
                        morphology: MorphologyMatcher::new(rules.terms(), lemmatizer.as_ref()),
                    },
                ))
            })
            .collect();

        debug!(recognizer = recognizer.name(), "Built multi-strategy detector");
        Self {
            store,
            matchers,
            recognizer,
            lemmatizer,
            min_confidence: 0.0,
        }
    }

    /// Global floor applied on top of category thresholds
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn pattern_store(&self) -> &PatternStore {
        &self.store
    }

    fn threshold(&self, category: Category) -> f32 {
        let category_threshold = self
            .store
            .rules(category)
            .map(|r| r.confidence_threshold)
            .unwrap_or(0.0);
        category_threshold.max(self.min_confidence)
    }

    fn collect_candidates(&self, view: &MatchView, categories: &[Category]) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut entities: Option<Vec<RecognizedEntity>> = None;
        let mut lemmatized: Option<(Vec<ViewToken>, Vec<String>)> = None;

        let mut push = |category, start, end, confidence, method| {
            if let Some(span) = view.to_block_span(start, end) {
                candidates.push(Candidate {
                    category,
                    span,
                    confidence,
                    method,
                });
            }
        };

        let mut seen = Vec::with_capacity(categories.len());
        for &category in categories {
            if seen.contains(&category) {
                continue;
            }
            seen.push(category);

            let (Some(rules), Some(matchers)) =
                (self.store.rules(category), self.matchers.get(&category))
            else {
                continue;
            };

            for method in &rules.methods {
                match method {
                    DetectionMethod::Dictionary => {
                        for (s, e) in matchers.dictionary.find(view) {
                            push(category, s, e, DICTIONARY_CONFIDENCE, *method);
                        }
                    }
                    DetectionMethod::PhraseMatcher => {
                        for (s, e) in matchers.phrases.find(view) {
                            push(category, s, e, PHRASE_CONFIDENCE, *method);
                        }
                    }
                    DetectionMethod::Regex => {
                        for hit in regex::find_all(&rules.patterns, view) {
                            push(category, hit.start, hit.end, hit.confidence, *method);
                        }
                    }
                    DetectionMethod::Ner => {
                        let found = entities
                            .get_or_insert_with(|| self.recognizer.recognize(view.folded()));
                        for entity in found.iter().filter(|e| e.category == category) {
                            let start = view.char_at_folded_byte(entity.range.start);
                            let end = view.char_at_folded_byte(entity.range.end);
                            push(category, start, end, entity.confidence.clamp(0.0, 1.0), *method);
                        }
                    }
                    DetectionMethod::Morphological => {
                        if matchers.morphology.is_empty() {
                            continue;
                        }
                        let (tokens, lemmas) = lemmatized.get_or_insert_with(|| {
                            let tokens = view.tokens();
                            let lemmas = tokens
                                .iter()
                                .map(|t| self.lemmatizer.lemma(&t.text))
                                .collect();
                            (tokens, lemmas)
                        });
                        for (s, e) in matchers.morphology.find(tokens, lemmas) {
                            push(category, s, e, MORPHOLOGICAL_CONFIDENCE, *method);
                        }
                    }
                }
            }
        }

        candidates
    }
}

impl Detector for MultiStrategyDetector {
    fn detect(&self, block_id: &BlockId, text: &str, categories: &[Category]) -> Vec<Detection> {
        let view = MatchView::new(text);
        let candidates = self.collect_candidates(&view, categories);
        let raw = candidates.len();
        let accepted = resolver::resolve(candidates, |c| self.threshold(c));

        let chars: Vec<char> = text.chars().collect();
        let detections: Vec<Detection> = accepted
            .into_iter()
            .filter_map(|c| {
                let value: String = chars.get(c.span.start..c.span.end)?.iter().collect();
                Detection::new(
                    c.category,
                    value,
                    c.span,
                    c.confidence,
                    c.method,
                    block_id.clone(),
                )
                .ok()
            })
            .collect();

        trace!(
            block_id = %block_id,
            raw,
            accepted = detections.len(),
            "Detected spans"
        );
        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MultiStrategyDetector {
        MultiStrategyDetector::new(Arc::new(PatternStore::default_patterns().unwrap()))
    }

    fn block() -> BlockId {
        BlockId::new("body/p0").unwrap()
    }

    #[test]
    fn test_email_and_phone() {
        let text = "Email: ivan@example.com, tel: +7 999 123-45-67";
        let detections = detector().detect(&block(), text, &Category::ALL);

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].category, Category::Email);
        assert_eq!(detections[0].original_value, "ivan@example.com");
        assert_eq!(detections[1].category, Category::Phone);
        assert_eq!(detections[1].original_value, "+7 999 123-45-67");
        assert!(!detections[0].position.overlaps(&detections[1].position));
        for d in &detections {
            assert!(d.matches_text(text));
        }
    }

    #[test]
    fn test_only_enabled_categories() {
        let text = "Email: ivan@example.com, tel: +7 999 123-45-67";
        let detections = detector().detect(&block(), text, &[Category::Phone]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].category, Category::Phone);
    }

    #[test]
    fn test_multiline_organization_maps_to_original_offsets() {
        let text = "Заказчик: MINISTRY OF X\nAND Y, Moscow";
        let detections = detector().detect(&block(), text, &[Category::GovernmentOrg]);
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(d.original_value, "MINISTRY OF X\nAND Y");
        let sliced: String = text
            .chars()
            .skip(d.position.start)
            .take(d.position.len())
            .collect();
        assert_eq!(sliced, "MINISTRY OF X\nAND Y");
    }

    #[test]
    fn test_dictionary_beats_shorter_and_weaker_matches() {
        let text = "Сведения переданы в ГИС ЖКХ вчера";
        let detections = detector().detect(&block(), text, &[Category::InformationSystem]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].original_value, "ГИС ЖКХ");
        assert_eq!(detections[0].method, DetectionMethod::Dictionary);
    }

    #[test]
    fn test_phrase_keeps_original_casing() {
        let text = "Счёт открыт в СБЕРБАНК РОССИИ";
        let detections = detector().detect(&block(), text, &[Category::Organization]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].original_value, "СБЕРБАНК РОССИИ");
        assert_eq!(detections[0].method, DetectionMethod::PhraseMatcher);
    }

    #[test]
    fn test_declined_government_org_is_morphological() {
        let text = "Письмо Федеральной налоговой службы получено";
        let detections = detector().detect(&block(), text, &[Category::GovernmentOrg]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].original_value, "Федеральной налоговой службы");
        assert_eq!(detections[0].method, DetectionMethod::Morphological);
        assert!(detections[0].confidence < DICTIONARY_CONFIDENCE);
    }

    #[test]
    fn test_min_confidence_floor() {
        let text = "Исполнитель: Иванов Иван Иванович";
        let strict = detector().with_min_confidence(0.9);
        assert!(strict.detect(&block(), text, &[Category::PersonName]).is_empty());
        let lenient = detector();
        assert_eq!(lenient.detect(&block(), text, &[Category::PersonName]).len(), 1);
    }

    struct FixedRecognizer;

    impl EntityRecognizer for FixedRecognizer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
            text.find("Acme")
                .map(|start| RecognizedEntity {
                    category: Category::Organization,
                    range: start..start + 4,
                    confidence: 0.9,
                })
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn test_custom_recognizer() {
        let detector = MultiStrategyDetector::with_capabilities(
            Arc::new(PatternStore::default_patterns().unwrap()),
            Arc::new(FixedRecognizer),
            Arc::new(SnowballLemmatizer::new()),
        );
        let detections = detector.detect(&block(), "Поставщик — Acme.", &[Category::Organization]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].original_value, "Acme");
        assert_eq!(detections[0].method, DetectionMethod::Ner);
    }
}
