//! Per-run surrogate assignment
//!
//! A [`SurrogateContext`] lives for exactly one document run. It remembers
//! which token each normalized original value received so repeated values
//! share a token, and it is consumed into the run's [`MappingTable`]. Nothing
//! is cached across runs.

use super::{TokenGenerator, UuidTokenGenerator};
use crate::anonymization::mapping::{MappingRow, MappingTable};
use crate::anonymization::models::{Detection, Replacement};
use crate::domain::{DocanonError, Result, SurrogateToken};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Attempts to draw an unused token before giving up
const MAX_TOKEN_ATTEMPTS: usize = 16;

pub struct SurrogateContext {
    seen: HashMap<String, SurrogateToken>,
    issued: HashSet<SurrogateToken>,
    rows: Vec<MappingRow>,
    generator: Box<dyn TokenGenerator>,
}

impl SurrogateContext {
    pub fn new() -> Self {
        Self::with_generator(Box::new(UuidTokenGenerator::new()))
    }

    pub fn with_generator(generator: Box<dyn TokenGenerator>) -> Self {
        Self {
            seen: HashMap::new(),
            issued: HashSet::new(),
            rows: Vec::new(),
            generator,
        }
    }

    /// Lookup key for an original value: trimmed, whitespace runs collapsed,
    /// lowercased. Display values are never altered.
    pub fn lookup_key(value: &str) -> String {
        value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Token for one detection, reusing the token of an equal value
    pub fn token_for(&mut self, detection: &Detection) -> Result<SurrogateToken> {
        let key = Self::lookup_key(&detection.original_value);
        if let Some(token) = self.seen.get(&key) {
            return Ok(token.clone());
        }

        let token = self.fresh_token()?;
        self.seen.insert(key, token.clone());
        self.rows.push(MappingRow {
            uuid: token.clone(),
            original_value: detection.original_value.clone(),
            category: Some(detection.category),
            confidence: Some(detection.confidence),
        });
        Ok(token)
    }

    /// Binds every detection to its surrogate token, in input order
    pub fn assign(&mut self, detections: &[Detection]) -> Result<Vec<Replacement>> {
        let replacements = detections
            .iter()
            .map(|d| {
                Ok(Replacement {
                    detection: d.clone(),
                    surrogate_token: self.token_for(d)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            replacements = replacements.len(),
            distinct_values = self.rows.len(),
            "Assigned surrogate tokens"
        );
        Ok(replacements)
    }

    /// Number of distinct values seen so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ends the run, yielding one mapping row per distinct value with the
    /// first-seen spelling
    pub fn into_mapping(self) -> MappingTable {
        MappingTable::from_unique_rows(self.rows)
    }

    /// Ends the run, keeping only tokens that were written to the document.
    ///
    /// Each row takes its spelling from the first applied replacement for the
    /// token, so a failed occurrence never decides what deanonymization writes
    /// back.
    pub fn into_applied_mapping(self, applied: &[Replacement]) -> MappingTable {
        let mut first_applied: HashMap<&SurrogateToken, &Detection> = HashMap::new();
        let mut order = Vec::new();
        for r in applied {
            if !first_applied.contains_key(&r.surrogate_token) {
                first_applied.insert(&r.surrogate_token, &r.detection);
                order.push(&r.surrogate_token);
            }
        }

        let rows = order
            .into_iter()
            .filter(|token| self.issued.contains(*token))
            .map(|token| {
                let detection = first_applied[token];
                MappingRow {
                    uuid: token.clone(),
                    original_value: detection.original_value.clone(),
                    category: Some(detection.category),
                    confidence: Some(detection.confidence),
                }
            })
            .collect();
        MappingTable::from_unique_rows(rows)
    }

    fn fresh_token(&mut self) -> Result<SurrogateToken> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let token = self.generator.generate();
            if self.issued.insert(token.clone()) {
                return Ok(token);
            }
        }
        Err(DocanonError::Unavailable(format!(
            "token generator returned {MAX_TOKEN_ATTEMPTS} already issued tokens in a row"
        )))
    }
}

impl Default for SurrogateContext {
    fn default() -> Self {
        Self::new()
    }
}
