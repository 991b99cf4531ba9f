use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Stores user-configurable preferences for the ledger front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the ledger document. Defaults to `<home>/data`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for document backups. Defaults to `<home>/backups`.
    pub backup_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    /// Whether renaming a category clears subcategories on its transactions.
    #[serde(default = "Config::default_clear_subcategories_on_rename")]
    pub clear_subcategories_on_rename: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Self::default_currency(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_root: None,
            backup_root: None,
            backup_retention: Self::default_backup_retention(),
            clear_subcategories_on_rename: Self::default_clear_subcategories_on_rename(),
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_currency() -> String {
        "EUR".into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_clear_subcategories_on_rename() -> bool {
        true
    }

    /// Application home used when no override is configured: `~/.spese`.
    pub fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".spese")
    }

    pub fn resolve_data_root(&self, home: &Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| home.join("data"))
    }

    pub fn resolve_backup_root(&self, home: &Path) -> PathBuf {
        self.backup_root
            .clone()
            .unwrap_or_else(|| home.join("backups"))
    }

    pub fn effective_retention(&self) -> usize {
        self.backup_retention.max(1)
    }

    /// Applies a `key=value` style setting, as typed by a user.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key.trim() {
            "currency" => self.currency = value.to_ascii_uppercase(),
            "ui_color_enabled" => self.ui_color_enabled = parse_flag(key, value)?,
            "clear_subcategories_on_rename" => {
                self.clear_subcategories_on_rename = parse_flag(key, value)?
            }
            "backup_retention" => {
                self.backup_retention = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| {
                        ConfigError::Invalid(format!("backup_retention must be at least 1, got `{value}`"))
                    })?
            }
            "data_root" => self.data_root = optional_path(value),
            "backup_root" => self.backup_root = optional_path(value),
            "log_filter" => {
                self.log_filter = (!value.is_empty()).then(|| value.to_string());
            }
            other => return Err(ConfigError::Invalid(format!("unknown setting `{other}`"))),
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{key} expects true/false, got `{value}`"
        ))),
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}
