//! Named-entity recognition seam
//!
//! [`EntityRecognizer`] is the boundary to a statistical NER model. The
//! built-in [`HeuristicRecognizer`] covers the common shapes of Russian and
//! English person and organization names with capitalization and suffix
//! rules; a model-backed recognizer can replace it without touching overlap
//! resolution.

use crate::anonymization::models::Category;
use fancy_regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

/// An entity found by a recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEntity {
    pub category: Category,
    /// Byte range in the text passed to [`EntityRecognizer::recognize`]
    pub range: Range<usize>,
    pub confidence: f32,
}

pub trait EntityRecognizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    fn recognize(&self, text: &str) -> Vec<RecognizedEntity>;
}

struct Rule {
    category: Category,
    regex: Regex,
    confidence: f32,
}

fn rule(category: Category, pattern: &str, confidence: f32) -> Rule {
    Rule {
        category,
        regex: Regex::new(pattern).expect("static regex"),
        confidence,
    }
}

const PATRONYMIC: &str = r"(?:(?:ович|евич|ич)(?:а|у|ем|е)?|(?:овн|евн|ичн)(?:а|ы|е|у|ой))";

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Фамилия Имя Отчество
        rule(
            Category::PersonName,
            &format!(
                r"(?<!\w)[А-ЯЁ][а-яё]+(?:-[А-ЯЁ][а-яё]+)?\s+[А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+?{PATRONYMIC}(?!\w)"
            ),
            0.8,
        ),
        // Имя Отчество Фамилия
        rule(
            Category::PersonName,
            &format!(
                r"(?<!\w)[А-ЯЁ][а-яё]+\s+[А-ЯЁ][а-яё]+?{PATRONYMIC}\s+[А-ЯЁ][а-яё]+(?:-[А-ЯЁ][а-яё]+)?(?!\w)"
            ),
            0.8,
        ),
        rule(
            Category::PersonName,
            r"(?<!\w)(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+(?P<value>[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)(?!\w)",
            0.75,
        ),
        rule(
            Category::Organization,
            r"(?i)(?<!\w)(?:компани(?:я|и|ю|ей)|организаци(?:я|и|ю|ей)|предприяти(?:е|я|ю|ем)|фирм(?:а|ы|у|е|ой)|обществ(?:о|а|у|ом)(?:\s+с\s+ограниченной\s+ответственностью)?)\s+(?P<value>«[^»\n]{1,60}»)",
            0.75,
        ),
        rule(
            Category::GovernmentOrg,
            r"(?<!\w)(?:Администраци(?:я|и|ю|ей)|Правительств(?:о|а|е|у|ом)|Департамент(?:а|е|у|ом)?|Комитет(?:а|е|у|ом)?|Управлени(?:е|я|ю|ем))(?:\s+[а-яё]+){0,4}\s+[А-ЯЁ][а-яё\-]+(?:ской|ского|ский)\s+(?:области|края|района|республики|округа)",
            0.75,
        ),
    ]
});

/// Rule-based recognizer used when no model is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRecognizer;

impl EntityRecognizer for HeuristicRecognizer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
        let mut entities = Vec::new();
        for rule in RULES.iter() {
            for caps in rule.regex.captures_iter(text) {
                let caps = match caps {
                    Ok(caps) => caps,
                    Err(e) => {
                        debug!(error = %e, "Recognizer rule aborted");
                        break;
                    }
                };
                if let Some(m) = caps.name("value").or_else(|| caps.get(0)) {
                    entities.push(RecognizedEntity {
                        category: rule.category,
                        range: m.start()..m.end(),
                        confidence: rule.confidence,
                    });
                }
            }
        }
        entities
    }
}
