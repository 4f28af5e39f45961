//! Runtime configuration
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables:
//!
//! - `CONCEPTGRAPH_BACKEND`: `memory` or `persistent`
//! - `CONCEPTGRAPH_DB`: database file path (selects the persistent backend)
//! - `CONCEPTGRAPH_LOG`: log filter level (e.g. `debug`)

use crate::storage::{
    GraphStore, MemoryStore, RetryConfig, SqliteOptions, SqliteStore, StorageResult,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const ENV_BACKEND: &str = "CONCEPTGRAPH_BACKEND";
pub const ENV_DB: &str = "CONCEPTGRAPH_DB";
pub const ENV_LOG: &str = "CONCEPTGRAPH_LOG";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which store implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Memory,
    #[default]
    Persistent,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(BackendKind::Memory),
            "persistent" | "sqlite" => Ok(BackendKind::Persistent),
            _ => Err(ConfigError::InvalidValue {
                key: "backend",
                value: s.to_string(),
            }),
        }
    }
}

/// Connection parameters for the persistent backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentConfig {
    /// Database file; the platform data directory is used when unset
    pub path: Option<PathBuf>,
    /// Bound on waiting for a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    pub persistent: PersistentConfig,
    pub retry: RetryConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            persistent: PersistentConfig::default(),
            retry: RetryConfig::default(),
            log_level: "warn".to_string(),
        }
    }
}

/// Default database path (~/.local/share/conceptgraph/graph.db on Linux)
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("conceptgraph").join("graph.db"))
}

impl Config {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DB).filter(|v| !v.trim().is_empty()) {
            self.persistent.path = Some(PathBuf::from(db));
            self.backend = BackendKind::Persistent;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Resolved database path for the persistent backend
    pub fn db_path(&self) -> Option<PathBuf> {
        self.persistent.path.clone().or_else(default_db_path)
    }

    pub fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            busy_timeout: Duration::from_millis(self.persistent.busy_timeout_ms),
            retry: self.retry.clone(),
        }
    }

    /// Build the configured store
    ///
    /// The in-memory backend is used when asked for, and as the fallback
    /// when no database path can be resolved.
    pub fn open_store(&self) -> StorageResult<Arc<dyn GraphStore>> {
        match (self.backend, self.db_path()) {
            (BackendKind::Persistent, Some(path)) => {
                let store = SqliteStore::open_with(&path, self.sqlite_options())?;
                Ok(Arc::new(store))
            }
            (BackendKind::Persistent, None) => {
                warn!("no database path available, using in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
            (BackendKind::Memory, _) => {
                info!("using in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}
