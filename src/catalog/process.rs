//! External catalog tool integration
//!
//! The tool is invoked once per operation as
//! `<tool> <catalog file> <Operation> [json record]`.

use super::{Catalog, CatalogFile, CatalogLevel, CatalogPack};
use crate::error::{MigrateError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Catalog reached through a separate process
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    tool: PathBuf,
    catalog: PathBuf,
}

impl ProcessCatalog {
    pub fn new(tool: impl Into<PathBuf>, catalog: impl Into<PathBuf>) -> Result<Self> {
        let tool = tool.into();
        let catalog = catalog.into();
        if !tool.exists() {
            return Err(MigrateError::missing(tool));
        }
        if !catalog.exists() {
            return Err(MigrateError::missing(catalog));
        }
        Ok(Self { tool, catalog })
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog
    }

    fn run(&self, operation: &str, content: Option<&str>) -> Result<String> {
        let mut command = Command::new(&self.tool);
        command.arg(&self.catalog).arg(operation);
        if let Some(content) = content {
            command.arg(content);
        }

        let output = command
            .output()
            .map_err(|e| MigrateError::collaborator(operation, format!("failed to execute: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrateError::collaborator(
                operation,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| MigrateError::collaborator(operation, "output is not valid UTF-8"))
    }

    fn count(&self, operation: &str) -> Result<i64> {
        let stdout = self.run(operation, None)?;
        let trimmed = stdout.trim();
        trimmed.parse().map_err(|_| {
            MigrateError::collaborator(operation, format!("expected a count, got {trimmed:?}"))
        })
    }

    fn insert<T: Serialize>(&self, operation: &str, record: &T) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.run(operation, Some(&json))?;
        Ok(())
    }
}

impl Catalog for ProcessCatalog {
    fn level_count(&self) -> Result<i64> {
        self.count("LevelCount")
    }

    fn pack_count(&self) -> Result<i64> {
        self.count("PackCount")
    }

    fn add_level(&self, level: &CatalogLevel) -> Result<()> {
        tracing::debug!("AddLevel {}", level.identifier);
        self.insert("AddLevel", level)
    }

    fn add_pack(&self, pack: &CatalogPack) -> Result<()> {
        tracing::debug!("AddPack {}", pack.identifier);
        self.insert("AddPack", pack)
    }

    fn add_file(&self, file: &CatalogFile) -> Result<()> {
        tracing::trace!("AddFile {}", file.key);
        self.insert("AddFile", file)
    }
}
