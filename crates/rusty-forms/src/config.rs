// File: src/config.rs
// Purpose: Pipeline configuration parsing from forms.toml

use crate::persist::SavePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Pipeline configuration
///
/// Attached to a schema with [`SchemaBuilder::config`](crate::SchemaBuilder::config);
/// nested schemas without their own config inherit the parent's.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FormsConfig {
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub coercion: CoercionConfig,

    #[serde(default)]
    pub persist: PersistConfig,

    #[serde(default)]
    pub deserialize: DeserializeConfig,
}

/// Validation behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Keep only the first failing rule per field
    #[serde(default = "default_false")]
    pub halt_on_first_error: bool,

    /// Error key for form-level messages
    #[serde(default = "default_base_key")]
    pub base_key: String,
}

/// Coercion behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoercionConfig {
    /// Turn blank strings into null for every field before coercion
    #[serde(default = "default_false")]
    pub nilify_blank: bool,

    /// chrono format string for `Coercion::Date`
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

/// Persistence behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistConfig {
    #[serde(default)]
    pub save_policy: SavePolicy,
}

/// Deserialization behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeserializeConfig {
    /// Skip all-blank collection entries even without a skip predicate
    #[serde(default = "default_false")]
    pub drop_blank_collection_entries: bool,
}

// Default values
fn default_false() -> bool {
    false
}

fn default_base_key() -> String {
    "base".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

// Default implementations
impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            halt_on_first_error: false,
            base_key: default_base_key(),
        }
    }
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            nilify_blank: false,
            date_format: default_date_format(),
        }
    }
}

impl Default for DeserializeConfig {
    fn default() -> Self {
        Self {
            drop_blank_collection_entries: false,
        }
    }
}

impl FormsConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from default path (./forms.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("forms.toml")
    }

    /// Parse configuration text; empty text means defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: FormsConfig = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormsConfig::default();
        assert!(!config.validation.halt_on_first_error);
        assert_eq!(config.validation.base_key, "base");
        assert_eq!(config.coercion.date_format, "%Y-%m-%d");
        assert_eq!(config.persist.save_policy, SavePolicy::CollectAll);
        assert!(!config.deserialize.drop_blank_collection_entries);
    }

    #[test]
    fn test_empty_config() {
        let config = FormsConfig::from_toml_str("  \n").unwrap();
        assert_eq!(config, FormsConfig::default());
    }

    #[test]
    fn test_custom_sections() {
        let toml = r#"
            [validation]
            halt_on_first_error = true

            [coercion]
            nilify_blank = true
            date_format = "%d.%m.%Y"

            [persist]
            save_policy = "short_circuit"
        "#;
        let config = FormsConfig::from_toml_str(toml).unwrap();
        assert!(config.validation.halt_on_first_error);
        assert_eq!(config.validation.base_key, "base");
        assert!(config.coercion.nilify_blank);
        assert_eq!(config.coercion.date_format, "%d.%m.%Y");
        assert_eq!(config.persist.save_policy, SavePolicy::ShortCircuit);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let toml = r#"
            [persist]
            save_policy = "sometimes"
        "#;
        assert!(FormsConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = FormsConfig::load("does/not/exist/forms.toml").unwrap();
        assert_eq!(config, FormsConfig::default());
    }
}
