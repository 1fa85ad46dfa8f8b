//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "docanon.toml")]
    pub output: String,

    /// Include comments explaining every option
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing docanon configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: docanon validate-config");
                println!("  3. Review detections: docanon analyze --input contract.docx");
                println!(
                    "  4. Anonymize: docanon anonymize --input contract.docx --output out.docx --mapping mapping.csv"
                );
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# docanon configuration

[application]
name = "docanon"
log_level = "info"

[detection]
# pattern_library = "./patterns.toml"
categories = [
    "person_name", "organization", "government_org", "address",
    "phone", "email", "inn", "snils", "bank_account", "date",
    "contract_number", "information_system", "url", "ip_address",
]
batch_size = 32
max_concurrency = 4
timeout_secs = 60
min_confidence = 0.5

[anonymization]
dry_run = false

[anonymization.audit]
enabled = false
log_path = "./audit/docanon.log"
json_format = true

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# docanon configuration
#
# Every setting has a default; an empty file is valid.
# Values may reference environment variables as ${VAR_NAME}, and any key can
# be overridden with DOCANON_<SECTION>_<KEY>, e.g. DOCANON_DETECTION_TIMEOUT_SECS.

# ============================================================================
# Application Settings
# ============================================================================
[application]
name = "docanon"

# Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
log_level = "info"

# ============================================================================
# Detection
# ============================================================================
[detection]
# Pattern library (TOML). The built-in library is used when unset.
# pattern_library = "./patterns.toml"

# Categories detected when no --categories override is given
categories = [
    "person_name", "organization", "government_org", "address",
    "phone", "email", "inn", "snils", "bank_account", "date",
    "contract_number", "information_system", "url", "ip_address",
]

# Unique blocks handed to one detection task
batch_size = 32

# Detection tasks running at once
max_concurrency = 4

# Per-document deadline; anonymize refuses to run on an incomplete analysis
timeout_secs = 60

# Global confidence floor on top of each category's threshold (0.0-1.0)
min_confidence = 0.5

# ============================================================================
# Anonymization
# ============================================================================
[anonymization]
# Compute replacements and mapping without writing any output
dry_run = false

# Append-only audit trail; original values are stored as SHA-256 hashes only
[anonymization.audit]
enabled = true
log_path = "${DOCANON_AUDIT_DIR}/docanon.log"
json_format = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "./logs"

# Rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "docanon.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "docanon.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_minimal_config_loads() {
        let config = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(config.detection.categories.len(), 14);
        assert!(!config.anonymization.audit.enabled);
    }

    #[test]
    fn test_generate_config_with_examples() {
        let config = InitArgs::generate_config_with_examples();
        assert!(config.contains("[anonymization.audit]"));
        assert!(config.contains("${DOCANON_AUDIT_DIR}"));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docanon.toml");
        std::fs::write(&path, "").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(parse_config(&std::fs::read_to_string(&path).unwrap()).is_ok());
    }
}
