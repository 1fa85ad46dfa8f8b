//! Audit logger for anonymization and deanonymization runs

use crate::anonymization::deanonymizer::ResolutionReport;
use crate::anonymization::models::Replacement;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Audit log entry
#[derive(Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum AuditLogEntry {
    Anonymize {
        timestamp: String,
        document_sha256: String,
        replacements_count: usize,
        failures_count: usize,
        dry_run: bool,
        processing_time_ms: u64,
        replacements: Vec<AuditReplacement>,
    },
    Deanonymize {
        timestamp: String,
        document_sha256: String,
        total_found: usize,
        resolved: usize,
        unresolved: usize,
        processing_time_ms: u64,
    },
}

/// Audit replacement entry (with hashed value)
#[derive(Debug, Serialize)]
struct AuditReplacement {
    category: String,
    block_id: String,
    confidence: f32,
    /// SHA-256 hash of original value (never log plaintext)
    value_hash: String,
}

/// Append-only audit trail
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
}

impl AuditLogger {
    /// Create a new audit logger, creating the log directory if needed
    pub fn new(log_path: PathBuf, json_format: bool) -> Result<Self> {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create audit log directory: {}", parent.display())
            })?;
        }

        Ok(Self {
            log_path,
            json_format,
        })
    }

    /// Record an anonymization run
    pub fn log_anonymization(
        &self,
        document: &[u8],
        applied: &[Replacement],
        failures: usize,
        dry_run: bool,
        elapsed: Duration,
    ) -> Result<()> {
        let entry = AuditLogEntry::Anonymize {
            timestamp: Utc::now().to_rfc3339(),
            document_sha256: sha256_hex(document),
            replacements_count: applied.len(),
            failures_count: failures,
            dry_run,
            processing_time_ms: elapsed.as_millis() as u64,
            replacements: applied
                .iter()
                .map(|r| AuditReplacement {
                    category: r.detection.category.to_string(),
                    block_id: r.detection.block_id.to_string(),
                    confidence: r.detection.confidence,
                    value_hash: sha256_hex(r.detection.original_value.as_bytes()),
                })
                .collect(),
        };
        self.write_entry(&entry)
    }

    /// Record a deanonymization run
    pub fn log_deanonymization(
        &self,
        document: &[u8],
        report: &ResolutionReport,
        elapsed: Duration,
    ) -> Result<()> {
        let entry = AuditLogEntry::Deanonymize {
            timestamp: Utc::now().to_rfc3339(),
            document_sha256: sha256_hex(document),
            total_found: report.total_found,
            resolved: report.resolved,
            unresolved: report.unresolved,
            processing_time_ms: elapsed.as_millis() as u64,
        };
        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
            return Ok(());
        }

        match entry {
            AuditLogEntry::Anonymize {
                timestamp,
                document_sha256,
                replacements_count,
                failures_count,
                dry_run,
                processing_time_ms,
                ..
            } => writeln!(
                file,
                "[{timestamp}] anonymize | Document: {document_sha256} | Replacements: {replacements_count} | Failures: {failures_count} | Dry run: {dry_run} | Time: {processing_time_ms}ms"
            ),
            AuditLogEntry::Deanonymize {
                timestamp,
                document_sha256,
                total_found,
                resolved,
                unresolved,
                processing_time_ms,
            } => writeln!(
                file,
                "[{timestamp}] deanonymize | Document: {document_sha256} | Found: {total_found} | Resolved: {resolved} | Unresolved: {unresolved} | Time: {processing_time_ms}ms"
            ),
        }
        .context("Failed to write audit entry")
    }
}

/// Hex SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::{Category, Detection, DetectionMethod, Span};
    use crate::domain::{BlockId, SurrogateToken};
    use tempfile::tempdir;

    fn replacement() -> Replacement {
        Replacement {
            detection: Detection::new(
                Category::Email,
                "ivan@example.com".to_string(),
                Span::new(7, 23).unwrap(),
                0.95,
                DetectionMethod::Regex,
                BlockId::new("body/p0").unwrap(),
            )
            .unwrap(),
            surrogate_token: SurrogateToken::new("3f2504e0-4f89-41d3-9a0c-0305e82c3301").unwrap(),
        }
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(sha256_hex(b"ivan@example.com"), sha256_hex(b"ivan@example.com"));
        assert_ne!(sha256_hex(b"ivan@example.com"), sha256_hex(b"petr@example.com"));
        assert_eq!(sha256_hex(b"").len(), 64);
    }

    #[test]
    fn test_json_entry_never_contains_plaintext() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit").join("docanon.log");
        let logger = AuditLogger::new(log_path.clone(), true).unwrap();

        logger
            .log_anonymization(b"docx bytes", &[replacement()], 1, false, Duration::from_millis(12))
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(!content.contains("ivan@example.com"));
        let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(entry["operation"], "anonymize");
        assert_eq!(entry["replacements_count"], 1);
        assert_eq!(entry["failures_count"], 1);
        assert_eq!(
            entry["replacements"][0]["value_hash"],
            sha256_hex(b"ivan@example.com")
        );
        assert_eq!(entry["replacements"][0]["category"], "email");
    }

    #[test]
    fn test_plain_text_entries_append() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), false).unwrap();

        logger
            .log_anonymization(b"a", &[replacement()], 0, true, Duration::ZERO)
            .unwrap();
        let report = ResolutionReport {
            total_found: 2,
            resolved: 1,
            unresolved: 1,
            ..Default::default()
        };
        logger
            .log_deanonymization(b"b", &report, Duration::ZERO)
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("anonymize | Document:"));
        assert!(lines[0].contains("Dry run: true"));
        assert!(lines[1].contains("deanonymize | Document:"));
        assert!(lines[1].contains("Unresolved: 1"));
        assert!(!content.contains("ivan@example.com"));
    }
}
