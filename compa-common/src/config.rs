//! Configuration loading
//!
//! Config file resolution priority order:
//! 1. Explicit path (command-line argument, highest priority)
//! 2. `COMPA_CONFIG` environment variable
//! 3. `./compa.toml` in the working directory
//! 4. Compiled defaults (fallback)
//!
//! A partial file is fine; missing keys fall back to the compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "COMPA_CONFIG";

/// Default config file name in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "compa.toml";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Root folder for stored uploads and generated result files
    pub storage_root: PathBuf,
    /// Worker pool size for bulk processing; `None` = max(4, available parallelism)
    pub worker_threads: Option<usize>,
    /// Rows per persistence write chunk during bulk processing
    pub write_batch_size: usize,
    /// Upper bound on a single bulk run before it is failed as timed out
    pub bulk_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("compa.db"),
            storage_root: PathBuf::from("compa-files"),
            worker_threads: None,
            write_batch_size: 1000,
            bulk_timeout_secs: 300,
        }
    }
}

/// On-disk TOML shape; every key optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    storage_root: Option<PathBuf>,
    worker_threads: Option<usize>,
    write_batch_size: Option<usize>,
    bulk_timeout_secs: Option<u64>,
}

impl EngineConfig {
    /// Load configuration following the priority order above
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        Ok(Self::default())
    }

    /// Load from a specific TOML file, filling gaps from the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {e}", path.display())))?;

        let defaults = Self::default();
        Ok(Self {
            database_path: file.database_path.unwrap_or(defaults.database_path),
            storage_root: file.storage_root.unwrap_or(defaults.storage_root),
            worker_threads: file.worker_threads,
            write_batch_size: file.write_batch_size.unwrap_or(defaults.write_batch_size),
            bulk_timeout_secs: file.bulk_timeout_secs.unwrap_or(defaults.bulk_timeout_secs),
        })
    }

    /// Effective worker pool size for bulk processing
    pub fn effective_workers(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .max(4)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_given() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.write_batch_size, 1000);
        assert_eq!(cfg.bulk_timeout_secs, 300);
    }

    #[test]
    fn partial_file_fills_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compa.toml");
        std::fs::write(&path, "database_path = \"/tmp/x.db\"\nworker_threads = 2\n").unwrap();

        let cfg = EngineConfig::from_file(&path).unwrap();
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.worker_threads, Some(2));
        assert_eq!(cfg.effective_workers(), 2);
        assert_eq!(cfg.write_batch_size, 1000);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compa.toml");
        std::fs::write(&path, "database_path = [not toml").unwrap();

        let err = EngineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn workers_floor_is_four() {
        let cfg = EngineConfig::default();
        assert!(cfg.effective_workers() >= 4);
    }
}
