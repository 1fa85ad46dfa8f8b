//! Detection data models

use crate::domain::ids::{BlockId, SurrogateToken};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensitive data category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Full or abbreviated personal names
    PersonName,
    /// Commercial organizations
    Organization,
    /// Ministries, agencies, state bodies
    GovernmentOrg,
    Email,
    Phone,
    /// Russian taxpayer number (10 or 12 digits)
    Inn,
    /// Russian personal insurance number
    Snils,
    Address,
    Date,
    ContractNumber,
    /// Named state information systems
    InformationSystem,
    BankAccount,
    Url,
    IpAddress,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 14] = [
        Category::PersonName,
        Category::Organization,
        Category::GovernmentOrg,
        Category::Email,
        Category::Phone,
        Category::Inn,
        Category::Snils,
        Category::Address,
        Category::Date,
        Category::ContractNumber,
        Category::InformationSystem,
        Category::BankAccount,
        Category::Url,
        Category::IpAddress,
    ];

    /// Configuration / wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonName => "person_name",
            Self::Organization => "organization",
            Self::GovernmentOrg => "government_org",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Inn => "inn",
            Self::Snils => "snils",
            Self::Address => "address",
            Self::Date => "date",
            Self::ContractNumber => "contract_number",
            Self::InformationSystem => "information_system",
            Self::BankAccount => "bank_account",
            Self::Url => "url",
            Self::IpAddress => "ip_address",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::PersonName => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::GovernmentOrg => "GOVERNMENT_ORG",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Inn => "INN",
            Self::Snils => "SNILS",
            Self::Address => "ADDRESS",
            Self::Date => "DATE",
            Self::ContractNumber => "CONTRACT",
            Self::InformationSystem => "INFO_SYSTEM",
            Self::BankAccount => "BANK_ACCOUNT",
            Self::Url => "URL",
            Self::IpAddress => "IP_ADDRESS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

/// Detection strategy that produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Exact, case-sensitive dictionary term
    Dictionary,
    /// Case-insensitive phrase
    PhraseMatcher,
    Regex,
    /// Named entity recognizer
    Ner,
    /// Lemma/stem sequence match
    Morphological,
}

impl DetectionMethod {
    /// Tie-break rank, lower wins
    pub fn rank(&self) -> u8 {
        match self {
            Self::Dictionary => 0,
            Self::PhraseMatcher => 1,
            Self::Regex => 2,
            Self::Ner => 3,
            Self::Morphological => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dictionary => "dictionary",
            Self::PhraseMatcher => "phrase_matcher",
            Self::Regex => "regex",
            Self::Ner => "ner",
            Self::Morphological => "morphological",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dictionary" => Ok(Self::Dictionary),
            "phrase_matcher" | "phrase" => Ok(Self::PhraseMatcher),
            "regex" => Ok(Self::Regex),
            "ner" => Ok(Self::Ner),
            "morphological" | "lemma" => Ok(Self::Morphological),
            _ => Err(format!("Unknown detection method: {s}")),
        }
    }
}

/// Half-open char range `[start, end)` within a block's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Creates a non-empty span
    pub fn new(start: usize, end: usize) -> Result<Self, String> {
        if end <= start {
            return Err(format!("Empty or inverted span [{start}, {end})"));
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A candidate sensitive span in one block
///
/// Construction validates the span, the confidence range, and that
/// `original_value` is exactly as long as the span. Deserialized detections
/// (e.g. a user-edited selection file) go through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DetectionRecord")]
pub struct Detection {
    pub category: Category,
    pub original_value: String,
    pub position: Span,
    pub confidence: f32,
    pub method: DetectionMethod,
    pub block_id: BlockId,
}

#[derive(Deserialize)]
struct DetectionRecord {
    category: Category,
    original_value: String,
    position: Span,
    confidence: f32,
    method: DetectionMethod,
    block_id: BlockId,
}

impl TryFrom<DetectionRecord> for Detection {
    type Error = String;

    fn try_from(r: DetectionRecord) -> Result<Self, Self::Error> {
        Detection::new(
            r.category,
            r.original_value,
            r.position,
            r.confidence,
            r.method,
            r.block_id,
        )
    }
}

impl Detection {
    /// Creates a validated detection
    pub fn new(
        category: Category,
        original_value: String,
        position: Span,
        confidence: f32,
        method: DetectionMethod,
        block_id: BlockId,
    ) -> Result<Self, String> {
        if position.is_empty() {
            return Err(format!("Detection span {position} is empty"));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!("Confidence {confidence} outside [0, 1]"));
        }
        if original_value.chars().count() != position.len() {
            return Err(format!(
                "Detection value length does not match span {position}"
            ));
        }
        Ok(Self {
            category,
            original_value,
            position,
            confidence,
            method,
            block_id,
        })
    }

    /// True if `original_value` is the text at `position` in `block_text`
    pub fn matches_text(&self, block_text: &str) -> bool {
        let slice: String = block_text
            .chars()
            .skip(self.position.start)
            .take(self.position.len())
            .collect();
        slice == self.original_value
    }

    /// Same detection attributed to another block with identical text
    pub fn for_block(&self, block_id: BlockId) -> Self {
        Self {
            block_id,
            ..self.clone()
        }
    }
}

/// An accepted detection bound to its surrogate token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replacement {
    #[serde(flatten)]
    pub detection: Detection,
    pub surrogate_token: SurrogateToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> BlockId {
        BlockId::new("body/p0").unwrap()
    }

    #[test]
    fn test_category_roundtrip_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("ssn".parse::<Category>().is_err());
    }

    #[test]
    fn test_method_rank_order() {
        let mut methods = vec![
            DetectionMethod::Morphological,
            DetectionMethod::Regex,
            DetectionMethod::Dictionary,
            DetectionMethod::Ner,
            DetectionMethod::PhraseMatcher,
        ];
        methods.sort_by_key(|m| m.rank());
        assert_eq!(
            methods,
            vec![
                DetectionMethod::Dictionary,
                DetectionMethod::PhraseMatcher,
                DetectionMethod::Regex,
                DetectionMethod::Ner,
                DetectionMethod::Morphological,
            ]
        );
    }

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5).unwrap();
        assert!(a.overlaps(&Span::new(4, 6).unwrap()));
        assert!(!a.overlaps(&Span::new(5, 6).unwrap()));
        assert!(Span::new(3, 3).is_err());
    }

    #[test]
    fn test_detection_validation() {
        let ok = Detection::new(
            Category::Email,
            "a@b.ru".to_string(),
            Span::new(7, 13).unwrap(),
            0.9,
            DetectionMethod::Regex,
            block(),
        )
        .unwrap();
        assert!(ok.matches_text("Email: a@b.ru"));
        assert!(!ok.matches_text("Email: x@b.ru"));

        assert!(Detection::new(
            Category::Email,
            "a@b.ru".to_string(),
            Span::new(7, 12).unwrap(),
            0.9,
            DetectionMethod::Regex,
            block(),
        )
        .is_err());
        assert!(Detection::new(
            Category::Email,
            "a@b.ru".to_string(),
            Span::new(7, 13).unwrap(),
            1.5,
            DetectionMethod::Regex,
            block(),
        )
        .is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let good = r#"{"category":"phone","original_value":"Иван","position":{"start":0,"end":4},"confidence":0.8,"method":"ner","block_id":"body/p1"}"#;
        let detection: Detection = serde_json::from_str(good).unwrap();
        assert_eq!(detection.category, Category::Phone);

        let bad = r#"{"category":"phone","original_value":"Иван","position":{"start":0,"end":9},"confidence":0.8,"method":"ner","block_id":"body/p1"}"#;
        assert!(serde_json::from_str::<Detection>(bad).is_err());
    }
}
