//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Resolution never fails; invalid log settings surface at
//!   `init_logging` time.

use crate::logging::{default_log_level, init_logging, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "BOOKSHELF_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "BOOKSHELF_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "BOOKSHELF_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "bookshelf.sqlite3";

/// Catalog process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Replaces the database path, e.g. from a CLI flag.
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&self.log_level, &log_dir.to_string_lossy())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> CatalogConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CatalogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_temp_dir_database_without_logging() {
        let config = config_from(&[]);
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("bookshelf.sqlite3")
        );
        assert!(config.log_dir.is_none());
        assert!(!config.init_logging().unwrap());
    }

    #[test]
    fn reads_all_variables_and_ignores_blank_values() {
        let config = config_from(&[
            (DB_PATH_ENV, " /var/lib/bookshelf/catalog.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "   "),
        ]);
        assert_eq!(
            config.db_path,
            PathBuf::from("/var/lib/bookshelf/catalog.db")
        );
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn with_db_path_overrides_resolved_path() {
        let config = config_from(&[(DB_PATH_ENV, "/tmp/a.db")]).with_db_path("/tmp/b.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/b.db"));
    }
}
