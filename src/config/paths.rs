//! XDG-compliant application paths and the on-disk migration layout

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Manages application paths using XDG base directory specification
#[derive(Debug, Clone)]
pub struct Paths {
    dirs: Option<ProjectDirs>,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        Self {
            dirs: ProjectDirs::from("", "", "arcunpack"),
        }
    }

    /// Config directory: ~/.config/arcunpack/
    pub fn config_dir(&self) -> PathBuf {
        match &self.dirs {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => PathBuf::from(".arcunpack"),
        }
    }

    /// Main config file: ~/.config/arcunpack/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Data directory: ~/.local/share/arcunpack/
    pub fn data_dir(&self) -> PathBuf {
        match &self.dirs {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => PathBuf::from(".arcunpack"),
        }
    }

    /// Log file: ~/.local/share/arcunpack/arcunpack.log
    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join("arcunpack.log")
    }
}

/// Directory layout produced under the output root of one migration
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracted pack contents: <root>/staging/<group>/<path>
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Per-record working trees, removed once the store is built
    pub fn working_dir(&self) -> PathBuf {
        self.root.join("working")
    }

    pub fn level_dir(&self) -> PathBuf {
        self.working_dir().join(crate::catalog::LEVEL_KIND)
    }

    pub fn pack_dir(&self) -> PathBuf {
        self.working_dir().join(crate::catalog::PACK_KIND)
    }

    /// Flat content-addressed store: <root>/store/<hash><ext>
    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    /// Copy of the caller's catalog that the run writes into
    pub fn catalog_copy(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.db".into());
        self.root.join(name)
    }

    /// Ensure the directories every stage writes into exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.staging_dir())?;
        std::fs::create_dir_all(self.store_dir())?;
        Ok(())
    }
}
