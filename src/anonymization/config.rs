//! Detection and anonymization configuration

use crate::anonymization::dedup::BatchOptions;
use crate::anonymization::models::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// `[detection]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Pattern library TOML; the built-in library when unset
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Categories detected when the caller does not choose
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    /// Unique blocks per detection task
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Detection tasks running at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-document detection deadline
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Floor applied on top of each category's threshold
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_batch_size() -> usize {
    32
}

fn default_max_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_min_confidence() -> f32 {
    0.5
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            categories: default_categories(),
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl DetectionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }

        if self.categories.is_empty() {
            anyhow::bail!("detection.categories must not be empty");
        }
        if self.batch_size == 0 || self.batch_size > 10_000 {
            anyhow::bail!("detection.batch_size must be between 1 and 10000");
        }
        if self.max_concurrency == 0 || self.max_concurrency > 256 {
            anyhow::bail!("detection.max_concurrency must be between 1 and 256");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("detection.timeout_secs must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            anyhow::bail!("detection.min_confidence must be between 0.0 and 1.0");
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("DOCANON_DETECTION_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("DOCANON_DETECTION_CATEGORIES") {
            self.categories = parse_categories(&val)
                .context("Invalid DOCANON_DETECTION_CATEGORIES value")?;
        }

        if let Ok(val) = std::env::var("DOCANON_DETECTION_BATCH_SIZE") {
            self.batch_size = val
                .parse()
                .context("Invalid DOCANON_DETECTION_BATCH_SIZE value")?;
        }

        if let Ok(val) = std::env::var("DOCANON_DETECTION_MAX_CONCURRENCY") {
            self.max_concurrency = val
                .parse()
                .context("Invalid DOCANON_DETECTION_MAX_CONCURRENCY value")?;
        }

        if let Ok(val) = std::env::var("DOCANON_DETECTION_TIMEOUT_SECS") {
            self.timeout_secs = val
                .parse()
                .context("Invalid DOCANON_DETECTION_TIMEOUT_SECS value")?;
        }

        if let Ok(val) = std::env::var("DOCANON_DETECTION_MIN_CONFIDENCE") {
            self.min_confidence = val
                .parse()
                .context("Invalid DOCANON_DETECTION_MIN_CONFIDENCE value")?;
        }

        Ok(())
    }

    /// Batching parameters for one document
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            max_concurrency: self.max_concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Parses a comma-separated category list
pub fn parse_categories(list: &str) -> Result<Vec<Category>> {
    let categories = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Category>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    if categories.is_empty() {
        anyhow::bail!("category list is empty");
    }
    Ok(categories)
}

/// `[anonymization]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Compute replacements and mapping without modifying the document
    #[serde(default)]
    pub dry_run: bool,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audit
            .validate()
            .context("Invalid audit configuration")?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("DOCANON_ANONYMIZATION_DRY_RUN") {
            self.dry_run = val
                .parse()
                .context("Invalid DOCANON_ANONYMIZATION_DRY_RUN value")?;
        }

        self.audit.apply_env_overrides()?;

        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/docanon.log")
}

fn default_audit_json_format() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            anyhow::bail!("audit.log_path must be set when audit logging is enabled");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("DOCANON_ANONYMIZATION_AUDIT_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid DOCANON_ANONYMIZATION_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("DOCANON_ANONYMIZATION_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("DOCANON_ANONYMIZATION_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid DOCANON_ANONYMIZATION_AUDIT_JSON_FORMAT value")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let detection = DetectionConfig::default();
        assert_eq!(detection.categories.len(), Category::ALL.len());
        assert_eq!(detection.batch_size, 32);
        assert!(detection.validate().is_ok());

        let anonymization = AnonymizationConfig::default();
        assert!(!anonymization.dry_run);
        assert!(!anonymization.audit.enabled);
        assert!(anonymization.audit.json_format);
        assert!(anonymization.validate().is_ok());
    }

    #[test]
    fn test_missing_pattern_library_rejected() {
        let config = DetectionConfig {
            pattern_library: Some(PathBuf::from("/nonexistent/patterns.toml")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounds_rejected() {
        let zero_batch = DetectionConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(zero_batch.validate().is_err());

        let bad_confidence = DetectionConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(bad_confidence.validate().is_err());
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(
            parse_categories("email, phone").unwrap(),
            vec![Category::Email, Category::Phone]
        );
        assert!(parse_categories("email,unknown").is_err());
        assert!(parse_categories(" , ").is_err());
    }

    #[test]
    fn test_section_deserializes_from_partial_toml() {
        let config: DetectionConfig =
            toml::from_str("categories = [\"email\", \"person_name\"]\ntimeout_secs = 5").unwrap();
        assert_eq!(config.categories, vec![Category::Email, Category::PersonName]);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrency, 4);
    }
}
