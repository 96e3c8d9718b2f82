//! Application orchestration

mod actions;
pub mod migration;

pub use migration::{Migration, MigrationReport};

use crate::catalog::{Catalog, ProcessCatalog};
use crate::config::{CatalogBackend, Config, OutputLayout};
use crate::db::SqliteCatalog;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Main application struct that orchestrates all components
pub struct App {
    pub config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.config.output_root())
    }

    /// Build a migration for the given input archive directory
    pub fn migration(&self, input: &Path) -> Migration {
        Migration {
            input: input.to_path_buf(),
            layout: self.layout(),
            language: self.config.language.clone(),
            singles_pack_id: self.config.singles_pack_id.clone(),
            hash_workers: self.config.hash_workers(),
            added_date: chrono::Utc::now().timestamp(),
        }
    }

    /// Copy the caller's catalog into the output root once and return the copy.
    /// A later run keeps writing into the existing copy.
    pub fn prepare_catalog(&self, source: &Path) -> Result<PathBuf> {
        let layout = self.layout();
        std::fs::create_dir_all(layout.root()).context("Failed to create output directory")?;
        let copy = layout.catalog_copy(source);

        if copy.exists() {
            tracing::info!("Using existing catalog copy {}", copy.display());
        } else if source.is_file() {
            std::fs::copy(source, &copy)
                .with_context(|| format!("Failed to copy catalog {}", source.display()))?;
        } else if self.config.backend == CatalogBackend::Sqlite {
            tracing::info!("Creating new catalog {}", copy.display());
        } else {
            bail!("Catalog not found: {}", source.display());
        }

        Ok(copy)
    }

    /// Open a catalog file with the configured backend
    pub fn open_catalog(&self, path: &Path) -> Result<Box<dyn Catalog>> {
        let catalog: Box<dyn Catalog> = match self.config.backend {
            CatalogBackend::Tool => {
                let tool = self.config.resolve_catalog_tool()?;
                tracing::debug!("Catalog tool: {}", tool.display());
                Box::new(ProcessCatalog::new(tool, path)?)
            }
            CatalogBackend::Sqlite => Box::new(SqliteCatalog::open(path)?),
        };
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(root: &Path, backend: CatalogBackend) -> App {
        App::new(Config {
            output_dir: Some(root.join("out").to_string_lossy().into_owned()),
            backend,
            ..Config::default()
        })
    }

    #[test]
    fn catalog_is_copied_once() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("arccreate.litedb");
        std::fs::write(&source, b"original").unwrap();
        let app = app(root.path(), CatalogBackend::Tool);

        let copy = app.prepare_catalog(&source).unwrap();
        assert_eq!(copy, root.path().join("out/arccreate.litedb"));

        std::fs::write(&copy, b"modified").unwrap();
        app.prepare_catalog(&source).unwrap();
        assert_eq!(std::fs::read(&copy).unwrap(), b"modified");
        assert_eq!(std::fs::read(&source).unwrap(), b"original");
    }

    #[test]
    fn missing_catalog_is_fatal_for_tool_backend() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("absent.litedb");

        assert!(app(root.path(), CatalogBackend::Tool).prepare_catalog(&source).is_err());

        let sqlite = app(root.path(), CatalogBackend::Sqlite);
        let copy = sqlite.prepare_catalog(&source).unwrap();
        let catalog = sqlite.open_catalog(&copy).unwrap();
        assert_eq!(catalog.level_count().unwrap(), 0);
    }
}
