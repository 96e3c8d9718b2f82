//! CLI command action handlers

use super::App;
use anyhow::{Context, Result};
use std::path::Path;

impl App {
    pub async fn cmd_migrate(&self, input: &Path, catalog: &Path) -> Result<()> {
        let catalog_path = self.prepare_catalog(catalog)?;
        let catalog = self.open_catalog(&catalog_path)?;
        let migration = self.migration(input);

        let report = migration
            .run(catalog.as_ref())
            .await
            .context("Migration failed")?;

        println!("Migration complete");
        println!("{:-<60}", "");
        match &report.extracted {
            Some(stats) => println!(
                "  Extracted: {} files from {} packs",
                stats.files, stats.packs
            ),
            None => println!("  Extracted: reused existing staging tree"),
        }
        println!(
            "  Levels:    {} (ids from {})",
            report.written.levels, report.first_level_id
        );
        println!(
            "  Packs:     {} (ids from {})",
            report.written.packs, report.first_pack_id
        );
        println!(
            "  Files:     {} ({} stored, {} duplicates)",
            report.written.files, report.stored, report.deduplicated
        );
        println!("  Store:     {}", migration.layout.store_dir().display());
        println!("  Catalog:   {}", catalog_path.display());
        Ok(())
    }

    pub async fn cmd_extract(&self, input: &Path) -> Result<()> {
        let migration = self.migration(input);
        match migration.extract().context("Extraction failed")? {
            Some(stats) => println!(
                "Extracted {} files ({} bytes) from {} packs into {}",
                stats.files,
                stats.bytes,
                stats.packs,
                migration.layout.staging_dir().display()
            ),
            None => println!(
                "Input not found; staging tree {} already present",
                migration.layout.staging_dir().display()
            ),
        }
        Ok(())
    }

    pub async fn cmd_counts(&self, catalog: &Path) -> Result<()> {
        let catalog = self.open_catalog(catalog)?;
        println!("Levels: {}", catalog.level_count()?);
        println!("Packs:  {}", catalog.pack_count()?);
        Ok(())
    }
}
