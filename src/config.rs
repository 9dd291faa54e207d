use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION};
use crate::error::{IngestError, Result};
use crate::pipeline::IngestOptions;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub geography: GeographyConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub collection: String,
    pub header_rows: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeographyConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            collection: DEFAULT_COLLECTION.to_string(),
            header_rows: 1,
        }
    }
}

impl Default for GeographyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/pincode_ranges.json"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/pensioners.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load `path` if it exists, otherwise defaults; environment overrides apply either way
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                IngestError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("PENSION_DB_PATH") {
            self.store.sqlite_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("PENSION_GEOGRAPHY_PATH") {
            self.geography.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("PENSION_CHUNK_SIZE") {
            self.ingest.chunk_size = size
                .parse()
                .map_err(|_| IngestError::Config(format!("PENSION_CHUNK_SIZE '{size}' is not a number")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(IngestError::Config("ingest.chunk_size must be positive".to_string()));
        }
        if self.ingest.collection.trim().is_empty() {
            return Err(IngestError::Config("ingest.collection must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            collection: self.ingest.collection.clone(),
            chunk_size: self.ingest.chunk_size,
            header_rows: self.ingest.header_rows,
        }
    }
}
