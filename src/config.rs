//! Configuration management for docfields.
//!
//! Settings start from built-in defaults, are overridden by an optional
//! TOML or JSON config file, and finally by command-line flags and
//! environment variables (handled in the CLI layer).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::OcrSettings;
use crate::services::workers::{default_worker_count, DeadlinePolicy};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "docfields.db";

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:4000";

/// Default upper bound on a single document payload (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Errors while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Address the server listens on.
    pub bind: String,
    /// OCR rendering and recognition parameters.
    pub ocr: OcrSettings,
    /// Number of concurrent OCR workers.
    pub workers: usize,
    /// Documents allowed to wait for a worker before new ones are refused.
    pub queue_depth: usize,
    /// Base OCR deadline in seconds.
    pub timeout_base_secs: u64,
    /// Extra OCR deadline per started MiB of payload, in seconds.
    pub timeout_per_mib_secs: u64,
    /// Largest accepted payload in bytes.
    pub max_payload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Data dir -> Home dir -> Current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docfields");
        let workers = default_worker_count();

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            bind: DEFAULT_BIND.to_string(),
            ocr: OcrSettings::default(),
            workers,
            queue_depth: workers * 4,
            timeout_base_secs: 60,
            timeout_per_mib_secs: 60,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Effective database URL.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => self
                .data_dir
                .join(&self.database_filename)
                .display()
                .to_string(),
        }
    }

    pub fn deadline_policy(&self) -> DeadlinePolicy {
        DeadlinePolicy::new(
            Duration::from_secs(self.timeout_base_secs),
            Duration::from_secs(self.timeout_per_mib_secs),
        )
    }

    /// Create the data directory when the database lives inside it.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.database_url.is_none() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }
}

/// Configuration file contents. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory. Relative paths resolve against the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_base_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_per_mib_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrSettings>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Default config file location: `<config_dir>/docfields/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docfields").join("config.toml"))
    }

    /// Load configuration from a TOML or JSON file (by extension).
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parsed = match ext {
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            _ => toml::from_str(&contents).map_err(|e| e.to_string()),
        };

        let mut config: Config = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            if database.contains(':') || database.contains('/') {
                settings.database_url = Some(database.clone());
            } else {
                settings.database_filename = database.clone();
            }
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(workers) = self.workers {
            settings.workers = workers.max(1);
        }
        if let Some(depth) = self.queue_depth {
            settings.queue_depth = depth;
        }
        if let Some(secs) = self.timeout_base_secs {
            settings.timeout_base_secs = secs;
        }
        if let Some(secs) = self.timeout_per_mib_secs {
            settings.timeout_per_mib_secs = secs;
        }
        if let Some(bytes) = self.max_payload_bytes {
            settings.max_payload_bytes = bytes;
        }
        if let Some(ref ocr) = self.ocr {
            settings.ocr = ocr.clone();
        }
    }
}

/// Load settings from an explicit config file, or the default location if
/// one exists, or fall back to defaults.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let config = match config_path {
        Some(path) => Some(Config::load_from_path(path).await?),
        None => match Config::default_path().filter(|p| p.exists()) {
            Some(path) => Some(Config::load_from_path(&path).await?),
            None => None,
        },
    };

    if let Some(config) = config {
        tracing::debug!("Loaded config from {:?}", config.source_path);
        let base_dir = config
            .base_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        config.apply_to_settings(&mut settings, &base_dir);
    }

    Ok(settings)
}
