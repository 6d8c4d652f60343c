use crate::storage::{self, Storage, StorageError, StorageType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "RTLISTS_CONFIG";

const APP_DIR: &str = "rtlists";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub const VALID_KEYS: &[&str] = &["storage.type", "storage.path"];

fn validate_storage_path(path: &str) -> Result<PathBuf, ConfigError> {
    // Check for null bytes and other invalid characters
    if path.contains('\0') {
        return Err(ConfigError::InvalidConfig(
            "Path contains invalid characters".to_string(),
        ));
    }
    if path.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "Path cannot be empty".to_string(),
        ));
    }

    let path = shellexpand::tilde(path);
    let path = PathBuf::from(path.as_ref());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidConfig(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if let Ok(metadata) = parent.metadata() {
                if metadata.mode() & 0o200 == 0 {
                    return Err(ConfigError::InvalidConfig(format!(
                        "Directory is not writable: {}",
                        parent.display()
                    )));
                }
            }
        }
    }

    Ok(path)
}

fn validate_storage_type(value: &str) -> Result<StorageType, ConfigError> {
    value.parse().map_err(|_| {
        ConfigError::InvalidConfig(format!(
            "storage.type must be one of: {}",
            StorageType::VALID.join(", ")
        ))
    })
}

fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join(APP_DIR))
}

/// The config file used when no explicit path is given.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    app_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| ConfigError::InvalidConfig("Could not determine home directory".to_string()))
}

fn default_storage_path(storage_type: StorageType) -> Option<String> {
    let file = match storage_type {
        StorageType::Json => "lists.json",
        StorageType::Sqlite => "lists.db",
    };
    app_dir().map(|dir| dir.join(file).to_string_lossy().to_string())
}

/// Values explicitly set by the user. Unset keys fall back to defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref storage_type) = self.storage_type {
            validate_storage_type(storage_type)?;
        }
        if let Some(ref path) = self.storage_path {
            validate_storage_path(path)?;
        }
        Ok(())
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
            .as_deref()
            .and_then(|value| value.parse().ok())
            .unwrap_or(StorageType::Json)
    }

    pub fn storage_path(&self) -> Option<String> {
        self.storage_path
            .clone()
            .or_else(|| default_storage_path(self.storage_type()))
    }
}

pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    pub fn new(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Config::default()
        };
        // A stale storage path is reported when the storage is opened
        if let Some(ref storage_type) = config.storage_type {
            validate_storage_type(storage_type)?;
        }

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// The effective value for `key`, falling back to the default.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "storage.type" => Some(self.config.storage_type().to_string()),
            "storage.path" => self.config.storage_path(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut config = self.config.clone();

        match key {
            "storage.type" => {
                let storage_type = validate_storage_type(value)?;
                if storage_type != self.config.storage_type() {
                    tracing::warn!(
                        from = %self.config.storage_type(),
                        to = %storage_type,
                        "changing storage type does not migrate existing lists"
                    );
                }
                config.storage_type = Some(storage_type.to_string());
            }
            "storage.path" => {
                let path = validate_storage_path(value)?;
                config.storage_path = Some(path.to_string_lossy().to_string());
            }
            _ => {
                return Err(ConfigError::InvalidKey(key.to_string()));
            }
        }
        config.validate()?;
        self.config = config;
        self.save()?;
        tracing::info!(key, value, "config updated");
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "storage.type" => self.config.storage_type = None,
            "storage.path" => self.config.storage_path = None,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        self.save()?;
        tracing::info!(key, "config value unset");
        Ok(())
    }

    /// Every known key with its effective value and whether it is a default.
    pub fn list(&self) -> Vec<(String, String, bool)> {
        VALID_KEYS
            .iter()
            .map(|key| {
                let is_default = match *key {
                    "storage.type" => self.config.storage_type.is_none(),
                    _ => self.config.storage_path.is_none(),
                };
                let value = self.get(key).unwrap_or_else(|| "null".to_string());
                (key.to_string(), value, is_default)
            })
            .collect()
    }

    pub fn create_storage(&self) -> Result<Box<dyn Storage>, ConfigError> {
        let path = self.config.storage_path().ok_or_else(|| {
            ConfigError::InvalidConfig("Storage path not configured".to_string())
        })?;
        Ok(storage::create_storage(
            self.config.storage_type(),
            Path::new(&path),
        )?)
    }
}
