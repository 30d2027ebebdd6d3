//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Describe where the database lives and how logging is set up.
//! - Overlay `TABLEMAP_*` environment variables onto defaults.
//!
//! # Invariants
//! - Missing variables keep their defaults; malformed ones are rejected.
//! - `db_path == None` always means an in-memory database.

use crate::db::{DbError, DbResult};
use crate::logging::default_log_level;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub const ENV_DB_PATH: &str = "TABLEMAP_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TABLEMAP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TABLEMAP_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "TABLEMAP_BUSY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TablemapConfig {
    /// SQLite file path. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for TablemapConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl TablemapConfig {
    /// Builds a configuration from process environment variables.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                DbError::InvalidConfig(format!(
                    "{ENV_BUSY_TIMEOUT_MS} must be a non-negative integer, got `{raw}`"
                ))
            })?;
        }

        Ok(config)
    }
}
