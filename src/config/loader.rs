//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DocanonConfig;
use crate::domain::errors::DocanonError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex"));

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DocanonConfig
/// 4. Applies environment variable overrides (DOCANON_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`DocanonError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use docanon::config::loader::load_config;
///
/// let config = load_config("docanon.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DocanonConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DocanonError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DocanonError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, then applies overrides and validation
pub fn parse_config(contents: &str) -> Result<DocanonConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: DocanonConfig = toml::from_str(&contents)
        .map_err(|e| DocanonError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DocanonError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = ENV_PLACEHOLDER.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DocanonError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using DOCANON_* prefix
///
/// Environment variables follow the pattern: DOCANON_<SECTION>_<KEY>
/// For example: DOCANON_DETECTION_TIMEOUT_SECS, DOCANON_LOGGING_LOCAL_PATH
fn apply_env_overrides(config: &mut DocanonConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("DOCANON_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    config
        .detection
        .apply_env_overrides()
        .map_err(|e| DocanonError::Configuration(format!("{e:#}")))?;
    config
        .anonymization
        .apply_env_overrides()
        .map_err(|e| DocanonError::Configuration(format!("{e:#}")))?;

    // Logging overrides
    if let Ok(val) = std::env::var("DOCANON_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().map_err(|_| {
            DocanonError::Configuration(format!("Invalid DOCANON_LOGGING_LOCAL_ENABLED value: {val}"))
        })?;
    }
    if let Ok(val) = std::env::var("DOCANON_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DOCANON_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
