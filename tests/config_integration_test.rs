//! Integration tests for configuration loading and validation
//!
//! Every test here reads DOCANON_* variables, so they share a lock.

use docanon::anonymization::Category;
use docanon::config::load_config;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "DOCANON_APPLICATION_LOG_LEVEL",
        "DOCANON_DETECTION_CATEGORIES",
        "DOCANON_DETECTION_BATCH_SIZE",
        "DOCANON_DETECTION_TIMEOUT_SECS",
        "DOCANON_DETECTION_MIN_CONFIDENCE",
        "DOCANON_ANONYMIZATION_DRY_RUN",
        "DOCANON_ANONYMIZATION_AUDIT_ENABLED",
        "DOCANON_LOGGING_LOCAL_ENABLED",
        "DOCANON_LOGGING_LOCAL_PATH",
        "TEST_DOCANON_AUDIT_DIR",
    ] {
        std::env::remove_var(var);
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = config_file(
        r#"
[application]
name = "docanon"
log_level = "debug"

[detection]
categories = ["person_name", "email", "phone", "inn"]
batch_size = 16
max_concurrency = 2
timeout_secs = 30
min_confidence = 0.7

[anonymization]
dry_run = true

[anonymization.audit]
enabled = true
log_path = "./audit/run.log"
json_format = false

[logging]
local_enabled = true
local_path = "./var/logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(
        config.detection.categories,
        vec![
            Category::PersonName,
            Category::Email,
            Category::Phone,
            Category::Inn
        ]
    );
    assert_eq!(config.detection.batch_size, 16);
    assert_eq!(config.detection.max_concurrency, 2);
    assert_eq!(config.detection.timeout_secs, 30);
    assert!((config.detection.min_confidence - 0.7).abs() < f32::EPSILON);
    assert!(config.anonymization.dry_run);
    assert!(config.anonymization.audit.enabled);
    assert_eq!(
        config.anonymization.audit.log_path,
        PathBuf::from("./audit/run.log")
    );
    assert!(!config.anonymization.audit.json_format);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "./var/logs");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = config_file("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.name, "docanon");
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.detection.categories, Category::ALL.to_vec());
    assert!(config.detection.pattern_library.is_none());
    assert!(!config.anonymization.dry_run);
    assert!(!config.anonymization.audit.enabled);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_DOCANON_AUDIT_DIR", "/srv/audit");

    let file = config_file(
        r#"
# audit goes to ${TEST_DOCANON_UNSET_IN_COMMENT}
[anonymization.audit]
enabled = true
log_path = "${TEST_DOCANON_AUDIT_DIR}/docanon.log"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(
        config.anonymization.audit.log_path,
        PathBuf::from("/srv/audit/docanon.log")
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = config_file(
        r#"
[logging]
local_path = "${TEST_DOCANON_AUDIT_DIR}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.reason(), "configuration");
    assert!(err.to_string().contains("TEST_DOCANON_AUDIT_DIR"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DOCANON_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("DOCANON_DETECTION_CATEGORIES", "email, phone");
    std::env::set_var("DOCANON_DETECTION_BATCH_SIZE", "8");
    std::env::set_var("DOCANON_ANONYMIZATION_DRY_RUN", "true");
    std::env::set_var("DOCANON_LOGGING_LOCAL_ENABLED", "true");
    std::env::set_var("DOCANON_LOGGING_LOCAL_PATH", "/tmp/docanon-logs");

    let file = config_file(
        r#"
[application]
log_level = "info"

[detection]
categories = ["person_name"]
batch_size = 64
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(
        config.detection.categories,
        vec![Category::Email, Category::Phone]
    );
    assert_eq!(config.detection.batch_size, 8);
    assert!(config.anonymization.dry_run);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/tmp/docanon-logs");

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DOCANON_DETECTION_BATCH_SIZE", "many");

    let file = config_file("");
    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.reason(), "configuration");
    assert!(err.to_string().contains("DOCANON_DETECTION_BATCH_SIZE"));

    cleanup_env_vars();
}

#[test]
fn test_validation_errors() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        ("[application]\nlog_level = \"verbose\"", "log_level"),
        ("[detection]\ncategories = []", "categories"),
        ("[detection]\nbatch_size = 0", "batch_size"),
        ("[detection]\nmin_confidence = 1.5", "min_confidence"),
        ("[detection]\npattern_library = \"/nonexistent/rules.toml\"", "Pattern library"),
        ("[logging]\nlocal_rotation = \"weekly\"", "rotation"),
    ];

    for (contents, needle) in cases {
        let file = config_file(contents);
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(err.reason(), "configuration", "{contents}");
        assert!(err.to_string().contains(needle), "{err} lacks {needle}");
    }
}

#[test]
fn test_unknown_category_fails_to_parse() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = config_file("[detection]\ncategories = [\"passport\"]");
    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.reason(), "configuration");
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/docanon.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
