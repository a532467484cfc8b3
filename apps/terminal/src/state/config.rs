//! # Terminal Configuration
//!
//! Settings that belong to this terminal rather than to the store.
//! Store identity (name, document, footer) lives in the `config`
//! collection as [`pdv_core::Settings`].
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`PDV_*`)
//! 2. Config file (`config.toml`, or the path in `PDV_CONFIG`)
//! 3. Defaults (this file)
//!
//! ## Example `config.toml`
//! ```toml
//! cashier_name = "Maria"
//! stock_policy = "reject"
//! scanner_device = "/dev/ttyACM0"
//! scan_debounce_ms = 800
//! receipt_width = 48
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use pdv_core::validation::validate_cashier_name;
use pdv_core::{StockPolicy, DEFAULT_RECEIPT_WIDTH, DEFAULT_SEARCH_LIMIT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::state::{APPLICATION, ORGANIZATION, QUALIFIER};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Database file name inside the platform data directory.
pub const DB_FILE: &str = "pdv.db";

/// Narrowest and widest receipts the console will render.
const RECEIPT_WIDTH_RANGE: (usize, usize) = (24, 120);

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(key: &str, value: impl ToString, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Per-terminal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    /// SQLite file. `None` uses `<data dir>/pdv.db`; `:memory:` keeps
    /// nothing between runs.
    pub database_path: Option<PathBuf>,

    /// Name recorded on every sale.
    pub cashier_name: String,

    /// What checkout does when stock runs short.
    pub stock_policy: StockPolicy,

    /// Line-mode scanner device or FIFO. `None` disables the scanner.
    pub scanner_device: Option<PathBuf>,

    /// Window in which repeated reads of one code are ignored.
    pub scan_debounce_ms: u64,

    /// Receipt width in characters.
    pub receipt_width: usize,

    /// Results shown by `:find`.
    pub search_limit: usize,

    /// Where `:export` writes backups. `None` uses `<data dir>/backups`.
    pub backup_dir: Option<PathBuf>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            database_path: None,
            cashier_name: "Caixa".to_string(),
            stock_policy: StockPolicy::Clamp,
            scanner_device: None,
            scan_debounce_ms: 800,
            receipt_width: DEFAULT_RECEIPT_WIDTH,
            search_limit: DEFAULT_SEARCH_LIMIT,
            backup_dir: None,
        }
    }
}

impl TerminalConfig {
    /// Loads defaults, then the config file (if any), then `PDV_*`
    /// environment overrides, and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("PDV_CONFIG")
            .map(PathBuf::from)
            .or_else(|| project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE)));

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading terminal config");
                Self::from_file(&path)?
            }
            _ => {
                debug!("No config file, using defaults");
                TerminalConfig::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `PDV_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `PDV_DB_PATH`: database file (or `:memory:`)
    /// - `PDV_CASHIER`: cashier name
    /// - `PDV_STOCK_POLICY`: `clamp` or `reject`
    /// - `PDV_SCANNER_DEVICE`: scanner device path (empty disables)
    /// - `PDV_RECEIPT_WIDTH`: receipt width in characters
    /// - `PDV_BACKUP_DIR`: backup directory
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PDV_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup("PDV_CASHIER") {
            self.cashier_name = name;
        }
        if let Some(policy) = lookup("PDV_STOCK_POLICY") {
            self.stock_policy = StockPolicy::from_str(&policy)
                .map_err(|e| ConfigError::invalid("PDV_STOCK_POLICY", &policy, e))?;
        }
        if let Some(device) = lookup("PDV_SCANNER_DEVICE") {
            self.scanner_device = (!device.trim().is_empty()).then(|| PathBuf::from(device));
        }
        if let Some(width) = lookup("PDV_RECEIPT_WIDTH") {
            self.receipt_width = width
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PDV_RECEIPT_WIDTH", &width, e))?;
        }
        if let Some(dir) = lookup("PDV_BACKUP_DIR") {
            self.backup_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Checks ranges and names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cashier_name(&self.cashier_name)
            .map_err(|e| ConfigError::invalid("cashier_name", &self.cashier_name, e))?;

        let (min, max) = RECEIPT_WIDTH_RANGE;
        if !(min..=max).contains(&self.receipt_width) {
            return Err(ConfigError::invalid(
                "receipt_width",
                self.receipt_width,
                format!("must be between {} and {}", min, max),
            ));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::invalid("search_limit", 0, "must be positive"));
        }
        Ok(())
    }

    pub fn scan_debounce(&self) -> Duration {
        Duration::from_millis(self.scan_debounce_ms)
    }

    /// Resolved database location.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DB_FILE)),
        }
    }

    /// Resolved backup directory.
    pub fn backup_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.backup_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("backups")),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Platform data directory.
///
/// - **Linux**: `~/.local/share/pdv-terminal`
/// - **macOS**: `~/Library/Application Support/br.pdv.pdv-terminal`
/// - **Windows**: `%APPDATA%\pdv\pdv-terminal\data`
fn data_dir() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDataDir)
}
