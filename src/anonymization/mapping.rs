//! Mapping table: surrogate token to original value
//!
//! Persisted as CSV (`uuid,original_value,category,confidence`) or JSON. Only
//! `uuid` and `original_value` are required when reading; unknown categories
//! and unparsable confidences are read as absent.

use crate::anonymization::models::Category;
use crate::domain::context::ResultExt;
use crate::domain::{DocanonError, Result, SurrogateToken};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRow {
    pub uuid: SurrogateToken,
    pub original_value: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub confidence: Option<f32>,
}

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Csv,
    Json,
}

impl MappingFormat {
    /// `.json` is JSON, anything else CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    rows: Vec<MappingRow>,
    index: HashMap<SurrogateToken, usize>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows whose tokens are known to be distinct
    pub(crate) fn from_unique_rows(rows: Vec<MappingRow>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.uuid.clone(), i))
            .collect();
        Self { rows, index }
    }

    /// Builds a table, rejecting a token mapped to two different values
    pub fn from_rows(rows: impl IntoIterator<Item = MappingRow>) -> Result<Self> {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    /// Adds a row. An exact repeat of an existing token and value is ignored.
    pub fn insert(&mut self, row: MappingRow) -> Result<()> {
        if let Some(&i) = self.index.get(&row.uuid) {
            if self.rows[i].original_value != row.original_value {
                return Err(DocanonError::MappingTable(format!(
                    "token {} is mapped to two different values",
                    row.uuid
                )));
            }
            return Ok(());
        }
        self.index.insert(row.uuid.clone(), self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    pub fn get(&self, token: &SurrogateToken) -> Option<&MappingRow> {
        self.index.get(token).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only rows matching the predicate
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&MappingRow) -> bool,
    {
        let rows = std::mem::take(&mut self.rows);
        *self = Self::from_unique_rows(rows.into_iter().filter(|r| keep(r)).collect());
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for required in ["uuid", "original_value"] {
            if !headers.iter().any(|h| h == required) {
                return Err(DocanonError::MappingTable(format!(
                    "missing required column '{required}'"
                )));
            }
        }

        let rows = csv_reader
            .deserialize::<MappingRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        if self.rows.is_empty() {
            csv_writer.write_record(["uuid", "original_value", "category", "confidence"])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        let rows: Vec<MappingRow> = serde_json::from_reader(reader)
            .map_err(|e| DocanonError::MappingTable(format!("invalid JSON mapping: {e}")))?;
        Self::from_rows(rows)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.rows)?;
        Ok(())
    }

    /// Reads a table, picking the format from the extension
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open mapping table {}", path.display()))?;
        let reader = BufReader::new(file);
        match MappingFormat::from_path(path) {
            MappingFormat::Csv => Self::read_csv(reader),
            MappingFormat::Json => Self::read_json(reader),
        }
        .with_context(|| format!("Invalid mapping table {}", path.display()))
    }

    /// Writes the table, picking the format from the extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create mapping table {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        match MappingFormat::from_path(path) {
            MappingFormat::Csv => self.write_csv(&mut writer)?,
            MappingFormat::Json => self.write_json(&mut writer)?,
        }
        writer.flush()?;
        Ok(())
    }
}
