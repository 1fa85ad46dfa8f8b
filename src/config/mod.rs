//! Configuration management for docanon.
//!
//! # Overview
//!
//! docanon uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DOCANON_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docanon::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("docanon.toml")?;
//! println!("Categories: {:?}", config.detection.categories);
//! println!("Deadline: {}s", config.detection.timeout_secs);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (name, log level)
//! - [`DetectionConfig`] - Pattern library, categories, batching, deadline
//! - [`AnonymizationConfig`] - Dry run and audit trail
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [detection]
//! pattern_library = "./patterns.toml"
//! categories = ["email", "phone", "person_name", "organization", "government_org"]
//! timeout_secs = 60
//!
//! [anonymization.audit]
//! enabled = true
//! log_path = "${DOCANON_AUDIT_DIR}/docanon.log"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use crate::anonymization::config::{AnonymizationConfig, AuditConfig, DetectionConfig};
pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, DocanonConfig, LoggingConfig};
