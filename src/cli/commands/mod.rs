//! CLI command implementations

pub mod analyze;
pub mod anonymize;
pub mod deanonymize;
pub mod init;
pub mod validate;

use crate::anonymization::config::parse_categories;
use crate::anonymization::models::Category;
use crate::anonymization::AnonymizationEngine;
use crate::config::DocanonConfig;
use crate::domain::context::ResultExt;
use crate::domain::{DocanonError, Result};
use std::path::Path;

/// Builds the engine from loaded configuration
pub(crate) fn build_engine(config: &DocanonConfig) -> Result<AnonymizationEngine> {
    let engine =
        AnonymizationEngine::new(config.detection.clone(), config.anonymization.clone())?;
    for warning in engine.pattern_warnings() {
        tracing::warn!(warning = %warning, "Pattern rule skipped");
    }
    Ok(engine)
}

/// Parses a `--categories` override
pub(crate) fn category_override(list: Option<&str>) -> Result<Option<Vec<Category>>> {
    list.map(|l| parse_categories(l).map_err(|e| DocanonError::Configuration(format!("{e:#}"))))
        .transpose()
}

pub(crate) fn read_document(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Logs and prints a failure, returning its exit code
pub(crate) fn report_error(error: &DocanonError, context: &str) -> i32 {
    crate::log_error_with_context!(error, context);
    eprintln!("❌ {context}");
    eprintln!("   Error: {error}");
    super::exit_code(error)
}
