//! Validate config command implementation
//!
//! Loads the configuration file and the pattern library it names, then prints
//! a summary.

use crate::anonymization::detector::patterns::PatternStore;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let store = match config.detection.pattern_library {
            Some(ref path) => PatternStore::from_file(path),
            None => PatternStore::default_patterns(),
        };
        let store = match store {
            Ok(s) => {
                println!("✅ Pattern library loaded");
                s
            }
            Err(e) => {
                println!("❌ Failed to load pattern library");
                println!("   Error: {e:#}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Pattern Library: {}",
            config
                .detection
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!(
            "  Categories: {}",
            config
                .detection
                .categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Batch Size: {}", config.detection.batch_size);
        println!("  Max Concurrency: {}", config.detection.max_concurrency);
        println!("  Timeout: {}s", config.detection.timeout_secs);
        println!("  Min Confidence: {:.2}", config.detection.min_confidence);
        println!("  Dry Run: {}", config.anonymization.dry_run);
        println!(
            "  Audit Log: {}",
            if config.anonymization.audit.enabled {
                config.anonymization.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );

        if !store.warnings().is_empty() {
            println!();
            println!("⚠️  Skipped pattern rules:");
            for warning in store.warnings() {
                println!("  • {warning}");
            }
        }
        println!();

        Ok(0)
    }
}
