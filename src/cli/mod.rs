//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for docanon using clap.
//!
//! Exit codes: 0 success, 1 partial result, 2 configuration error,
//! 3 document error, 5 fatal error.

pub mod commands;

use crate::config::{parse_config, DocanonConfig};
use crate::domain::{DocanonError, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG: &str = "docanon.toml";

/// docanon - reversible redaction of sensitive data in DOCX documents
#[derive(Parser, Debug)]
#[command(name = "docanon")]
#[command(version, about, long_about = None)]
#[command(author = "Docanon Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG, env = "DOCANON_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DOCANON_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect sensitive spans in a document
    Analyze(commands::analyze::AnalyzeArgs),

    /// Replace detections with surrogate tokens and write the mapping table
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Restore original values from a mapping table
    Deanonymize(commands::deanonymize::DeanonymizeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Loads the configuration file, or defaults when the default file is absent
pub fn load_cli_config(config_path: &str) -> Result<DocanonConfig> {
    if config_path == DEFAULT_CONFIG && !Path::new(config_path).exists() {
        tracing::debug!("No configuration file found, using defaults");
        return parse_config("");
    }
    crate::config::load_config(config_path)
}

/// Process exit code for a failed command
pub fn exit_code(error: &DocanonError) -> i32 {
    match error {
        DocanonError::Configuration(_) | DocanonError::PatternStore(_) => 2,
        DocanonError::Document(_)
        | DocanonError::MalformedInput(_)
        | DocanonError::MappingTable(_) => 3,
        DocanonError::Timeout(_) => 1,
        _ => 5,
    }
}
