//! Configuration management for ArcUnpack
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/arcunpack/config.toml
//! - Data: ~/.local/share/arcunpack/

mod paths;

pub use paths::{OutputLayout, Paths};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Executable name looked up on PATH when no catalog tool is configured
pub const DEFAULT_CATALOG_TOOL: &str = "ArcUnpack.LiteDB";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the external catalog tool executable
    pub catalog_tool: Option<String>,

    /// Which catalog backend receives the records
    pub backend: CatalogBackend,

    /// Output root for staging, working and store directories
    pub output_dir: Option<String>,

    /// Number of files hashed concurrently (defaults to available parallelism)
    pub hash_workers: Option<usize>,

    /// Language key used for localized titles and pack names
    pub language: String,

    /// Pack identifier whose cover is referenced by name instead of copied
    pub singles_pack_id: String,

    #[serde(skip)]
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_tool: None,
            backend: CatalogBackend::default(),
            output_dir: None,
            hash_workers: None,
            language: "en".to_string(),
            singles_pack_id: "single".to_string(),
            paths: Paths::new(),
        }
    }
}

/// Catalog backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// External catalog process, one invocation per operation
    #[default]
    Tool,
    /// Embedded SQLite catalog file
    Sqlite,
}

impl CatalogBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogBackend::Tool => "tool",
            CatalogBackend::Sqlite => "sqlite",
        }
    }

    pub fn from_cli(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "tool" | "process" | "litedb" => Ok(CatalogBackend::Tool),
            "sqlite" => Ok(CatalogBackend::Sqlite),
            other => bail!(
                "Invalid catalog backend '{}'. Valid values: tool, sqlite",
                other
            ),
        }
    }
}

impl Config {
    /// Load configuration from disk, writing defaults on first run
    pub async fn load() -> Result<Self> {
        let paths = Paths::new();
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path).await?
        } else {
            let config = Config::default();
            config.save().await?;
            config
        };

        config.paths = paths;
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        if config.hash_workers == Some(0) {
            bail!("hash_workers must be at least 1");
        }
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self) -> Result<()> {
        let config_path = self.paths.config_file();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .await
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Output root, defaulting to ./arcunpack-out
    pub fn output_root(&self) -> PathBuf {
        self.output_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("arcunpack-out"))
    }

    pub fn hash_workers(&self) -> usize {
        self.hash_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Resolve the catalog tool: configured path first, then PATH lookup
    pub fn resolve_catalog_tool(&self) -> Result<PathBuf> {
        if let Some(tool) = self.catalog_tool.as_deref() {
            let path = PathBuf::from(tool);
            if path.exists() {
                return Ok(path);
            }
            if let Ok(found) = which::which(tool) {
                return Ok(found);
            }
            bail!("Catalog tool not found at {}", path.display());
        }

        which::which(DEFAULT_CATALOG_TOOL).with_context(|| {
            format!(
                "{} not found on PATH; set catalog_tool in {}",
                DEFAULT_CATALOG_TOOL,
                self.paths.config_file().display()
            )
        })
    }
}
