// Configuration loading and parsing (group.toml, balance.toml).

use serde::Deserialize;
use squadsplit_core::BalanceSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub group: GroupConfig,
    pub balance: BalanceSettings,
    /// Fixed seed for reproducible generations. Entropy-seeded when absent.
    pub seed: Option<u64>,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// group.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[group]` table in group.toml.
#[derive(Debug, Clone, Deserialize)]
struct GroupFile {
    group: GroupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    /// CSV roster, relative to the working directory.
    pub roster_path: String,
}

// ---------------------------------------------------------------------------
// balance.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire balance.toml file.
#[derive(Debug, Clone, Deserialize)]
struct BalanceFile {
    balance: BalanceSection,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct BalanceSection {
    #[serde(default = "default_max_diff")]
    max_diff: u64,
    #[serde(default = "default_exhaustive_limit")]
    exhaustive_limit: usize,
    #[serde(default = "default_max_attempts")]
    max_attempts: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

fn default_max_diff() -> u64 {
    BalanceSettings::default().max_diff
}

fn default_exhaustive_limit() -> usize {
    BalanceSettings::default().exhaustive_limit
}

fn default_max_attempts() -> usize {
    BalanceSettings::default().max_attempts
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/group.toml` and
/// `config/balance.toml`, relative to the given `base_dir`.
///
/// This does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let group_path = config_dir.join("group.toml");
    let group_text = read_file(&group_path)?;
    let group_file: GroupFile =
        toml::from_str(&group_text).map_err(|e| ConfigError::ParseError {
            path: group_path.clone(),
            source: e,
        })?;

    let balance_path = config_dir.join("balance.toml");
    let balance_text = read_file(&balance_path)?;
    let balance_file: BalanceFile =
        toml::from_str(&balance_text).map_err(|e| ConfigError::ParseError {
            path: balance_path.clone(),
            source: e,
        })?;

    let section = balance_file.balance;
    let config = Config {
        group: group_file.group,
        balance: BalanceSettings {
            max_diff: section.max_diff,
            exhaustive_limit: section.exhaustive_limit,
            max_attempts: section.max_attempts,
        },
        seed: section.seed,
        db_path: balance_file.database.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Exhaustive search beyond this size is C(22, 11) = 705 432 splits and up.
const MAX_EXHAUSTIVE_LIMIT: usize = 20;

fn validate(config: &Config) -> Result<(), ConfigError> {
    let text_fields: &[(&str, &str)] = &[
        ("group.name", config.group.name.as_str()),
        ("group.roster_path", config.group.roster_path.as_str()),
        ("database.path", config.db_path.as_str()),
    ];
    for (name, val) in text_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    let limit = config.balance.exhaustive_limit;
    if !(2..=MAX_EXHAUSTIVE_LIMIT).contains(&limit) {
        return Err(ConfigError::ValidationError {
            field: "balance.exhaustive_limit".into(),
            message: format!("must be between 2 and {MAX_EXHAUSTIVE_LIMIT} inclusive, got {limit}"),
        });
    }

    if config.balance.max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            field: "balance.max_attempts".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
