//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml`. The file is looked up from an
//! explicit path, then `TASKBOARD_CONFIG`, then the platform config dir.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::task::{Category, Priority, BUILTIN_CATEGORIES};

pub const CONFIG_FILE: &str = "taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Task defaults and view settings
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Remote store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL of the hosted store, e.g. `https://xyz.supabase.co`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path of the REST endpoint under `url`
    #[serde(default = "default_rest_path")]
    pub rest_path: String,

    /// Table holding tasks
    #[serde(default = "default_tasks_table")]
    pub tasks_table: String,

    /// Table holding categories
    #[serde(default = "default_categories_table")]
    pub categories_table: String,
}

fn default_rest_path() -> String {
    "/rest/v1".to_string()
}

fn default_tasks_table() -> String {
    "tareas".to_string()
}

fn default_categories_table() -> String {
    "categorias".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            rest_path: default_rest_path(),
            tasks_table: default_tasks_table(),
            categories_table: default_categories_table(),
        }
    }
}

/// Task-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Category for new tasks when none is given
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Priority for new tasks when none is given
    #[serde(default = "default_priority")]
    pub default_priority: String,

    /// Number of entries in the upcoming view
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: usize,

    /// Categories offered when the store defines none
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_category() -> String {
    Category::default().to_string()
}

fn default_priority() -> String {
    Priority::default().to_string()
}

fn default_upcoming_limit() -> usize {
    5
}

fn default_categories() -> Vec<String> {
    BUILTIN_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            default_priority: default_priority(),
            upcoming_limit: default_upcoming_limit(),
            categories: default_categories(),
        }
    }
}

impl TasksConfig {
    pub fn category(&self) -> Category {
        Category::new(&self.default_category)
    }

    pub fn priority(&self) -> Priority {
        self.default_priority.parse().unwrap_or_default()
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.default_category.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.default_category cannot be empty".to_string(),
            ));
        }
        self.default_priority.parse::<Priority>().map_err(|_| {
            crate::error::Error::InvalidConfig(format!(
                "tasks.default_priority: invalid priority '{}' (expected baja|media|alta)",
                self.default_priority
            ))
        })?;
        if self.upcoming_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.upcoming_limit must be > 0".to_string(),
            ));
        }
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(crate::error::Error::InvalidConfig(
                "tasks.categories cannot include empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> crate::error::Result<()> {
        for (field, value) in [
            ("store.tasks_table", &self.tasks_table),
            ("store.categories_table", &self.categories_table),
        ] {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} cannot be empty"
                )));
            }
            if !trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} must be alphanumeric or '_'"
                )));
            }
        }
        if let Some(url) = self.url.as_deref().filter(|url| !url.trim().is_empty()) {
            crate::store::http::rest_base(url, &self.rest_path)?;
        }
        Ok(())
    }

    /// Copy of this section with the key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_deref().map(redact);
        copy
    }
}

fn redact(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

impl Config {
    /// Load configuration from a `taskboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file location.
    ///
    /// An explicit path (`--config` or `TASKBOARD_CONFIG`) wins, then the
    /// platform config directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_path(),
        }
    }

    /// Load from the resolved location, or return defaults when no file exists.
    ///
    /// An explicitly requested file that does not exist is an error; a
    /// missing file at the default location is not.
    pub fn discover(explicit: Option<&Path>) -> crate::error::Result<Self> {
        match Self::locate(explicit) {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) if explicit.is_some() => Err(crate::error::Error::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            ))),
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line / environment overrides for the store connection.
    pub fn with_store_overrides(mut self, url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = url.filter(|value| !value.trim().is_empty()) {
            self.store.url = Some(url);
        }
        if let Some(key) = api_key.filter(|value| !value.trim().is_empty()) {
            self.store.api_key = Some(key);
        }
        self
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.store.validate()?;
        self.tasks.validate()?;
        Ok(())
    }
}

/// `<config_dir>/taskboard.toml` for this platform
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "taskboard")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
