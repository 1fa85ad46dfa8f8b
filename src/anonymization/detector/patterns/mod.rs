//! Pattern and dictionary store
//!
//! Category-keyed detection rules loaded from TOML:
//!
//! ```toml
//! [categories.organization]
//! methods = ["dictionary", "phrase_matcher", "regex", "ner", "morphological"]
//! confidence_threshold = 0.6
//! dictionary = ["ПАО Сбербанк"]
//! dictionary_files = ["dictionaries/organizations.txt"]
//! phrases = ["сбербанк россии"]
//!
//! [[categories.organization.regex]]
//! name = "legal_form_quoted"
//! pattern = '(?<!\w)(?:ООО|АО)\s+«[^»]{1,80}»'
//! confidence = 0.9
//! ```
//!
//! A bad rule (invalid regex, unknown category or method, missing dictionary
//! file) is skipped with a warning and recorded in [`PatternStore::warnings`].
//! Only an unreadable or unparseable file fails the load. The store is
//! immutable once built and is shared between detectors behind an `Arc`.

use crate::anonymization::models::{Category, DetectionMethod};
use anyhow::{Context, Result};
use fancy_regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Category definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDefinition {
    /// Ordered methods; empty means all, in priority order
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default)]
    pub regex: Vec<RegexDefinition>,
    /// Case-sensitive literal terms
    #[serde(default)]
    pub dictionary: Vec<String>,
    /// Files with one literal term per line, relative to the library file
    #[serde(default)]
    pub dictionary_files: Vec<PathBuf>,
    /// Case-insensitive phrases
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegexDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub pattern: String,
    #[serde(default = "default_regex_confidence")]
    pub confidence: f32,
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_regex_confidence() -> f32 {
    0.8
}

#[derive(Debug, Deserialize)]
struct PatternLibrary {
    #[serde(default)]
    categories: BTreeMap<String, CategoryDefinition>,
}

/// Compiled regex with metadata
///
/// A named capture group `value` narrows the reported span to that group;
/// otherwise the whole match is reported.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    pub confidence: f32,
}

/// Compiled rules for one category
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub category: Category,
    /// Enabled methods, highest priority first
    pub methods: Vec<DetectionMethod>,
    pub confidence_threshold: f32,
    pub patterns: Vec<CompiledPattern>,
    pub dictionary: Vec<String>,
    pub phrases: Vec<String>,
}

impl CategoryRules {
    pub fn uses(&self, method: DetectionMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Literal terms used for lemma matching: dictionary plus phrases
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.dictionary
            .iter()
            .chain(self.phrases.iter())
            .map(String::as_str)
    }
}

/// Immutable, category-keyed rule store
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    rules: BTreeMap<Category, CategoryRules>,
    warnings: Vec<String>,
}

impl PatternStore {
    /// Loads a pattern library; dictionary files resolve against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern library: {}", path.display()))?;
        Self::from_toml(&content, path.parent())
    }

    /// Builds a store from TOML content
    pub fn from_toml(content: &str, base_dir: Option<&Path>) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut store = PatternStore::default();
        for (name, def) in library.categories {
            let category = match name.parse::<Category>() {
                Ok(category) => category,
                Err(e) => {
                    store.warn(format!("Skipping category '{name}': {e}"));
                    continue;
                }
            };
            let rules = store.compile_category(category, def, base_dir);
            store.rules.insert(category, rules);
        }

        debug!(
            categories = store.rules.len(),
            warnings = store.warnings.len(),
            "Loaded pattern store"
        );
        Ok(store)
    }

    /// Built-in library
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/default_patterns.toml");
        Self::from_toml(default_toml, None)
    }

    fn compile_category(
        &mut self,
        category: Category,
        def: CategoryDefinition,
        base_dir: Option<&Path>,
    ) -> CategoryRules {
        let mut methods = Vec::new();
        for method in &def.methods {
            match method.parse::<DetectionMethod>() {
                Ok(m) if !methods.contains(&m) => methods.push(m),
                Ok(_) => {}
                Err(e) => self.warn(format!("{category}: {e}")),
            }
        }
        if def.methods.is_empty() {
            methods = vec![
                DetectionMethod::Dictionary,
                DetectionMethod::PhraseMatcher,
                DetectionMethod::Regex,
                DetectionMethod::Ner,
                DetectionMethod::Morphological,
            ];
        }

        let mut confidence_threshold = def.confidence_threshold;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            self.warn(format!(
                "{category}: confidence_threshold {confidence_threshold} outside [0, 1], using 0.5"
            ));
            confidence_threshold = default_confidence_threshold();
        }

        let mut patterns = Vec::new();
        for (i, rx) in def.regex.into_iter().enumerate() {
            let name = rx.name.unwrap_or_else(|| format!("{category}_{i}"));
            if !(0.0..=1.0).contains(&rx.confidence) {
                self.warn(format!(
                    "{category}: pattern '{name}' confidence {} outside [0, 1], skipping",
                    rx.confidence
                ));
                continue;
            }
            match Regex::new(&rx.pattern) {
                Ok(regex) => patterns.push(CompiledPattern {
                    name,
                    regex,
                    confidence: rx.confidence,
                }),
                Err(e) => self.warn(format!("{category}: invalid regex '{name}': {e}")),
            }
        }

        let mut dictionary: Vec<String> = def
            .dictionary
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        for file in &def.dictionary_files {
            let resolved = match base_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            };
            match std::fs::read_to_string(&resolved) {
                Ok(content) => dictionary.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty() && !l.starts_with('#'))
                        .map(str::to_string),
                ),
                Err(e) => self.warn(format!(
                    "{category}: dictionary file {} unreadable: {e}",
                    resolved.display()
                )),
            }
        }
        dictionary.sort();
        dictionary.dedup();

        let mut phrases: Vec<String> = def
            .phrases
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        phrases.sort();
        phrases.dedup();

        CategoryRules {
            category,
            methods,
            confidence_threshold,
            patterns,
            dictionary,
            phrases,
        }
    }

    fn warn(&mut self, message: String) {
        warn!(warning = %message, "Pattern store rule skipped");
        self.warnings.push(message);
    }

    /// Rules for a category
    pub fn rules(&self, category: Category) -> Option<&CategoryRules> {
        self.rules.get(&category)
    }

    /// Categories with rules, in stable order
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.rules.keys().copied()
    }

    /// Rules skipped at load time
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
