//! The four-stage migration pipeline

use crate::catalog::{apply_rewrite, write_catalog, Catalog, WriteStats};
use crate::config::OutputLayout;
use crate::convert::{convert_all, PackOptions, SourceLayout};
use crate::error::{MigrateError, Result};
use crate::extract::{extract_all, ExtractPlan, ExtractStats};
use crate::store::build_store;
use std::path::PathBuf;

/// Everything one run needs besides the catalog
#[derive(Debug, Clone)]
pub struct Migration {
    /// Directory holding `*.pack` files and their indices
    pub input: PathBuf,
    pub layout: OutputLayout,
    pub language: String,
    pub singles_pack_id: String,
    pub hash_workers: usize,
    /// `AddedDate` of every pack record
    pub added_date: i64,
}

/// Summary of a completed run
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// None when a previous staging tree was reused
    pub extracted: Option<ExtractStats>,
    pub first_level_id: i64,
    pub first_pack_id: i64,
    pub stored: usize,
    pub deduplicated: usize,
    pub written: WriteStats,
}

impl Migration {
    /// Run only the extraction stage
    pub fn extract(&self) -> Result<Option<ExtractStats>> {
        let staging = self.layout.staging_dir();
        match ExtractPlan::decide(&self.input, &staging)? {
            ExtractPlan::Extract => extract_all(&self.input, &staging).map(Some),
            ExtractPlan::Resume => Ok(None),
        }
    }

    /// Extract, convert, build the store and write the catalog
    pub async fn run(&self, catalog: &dyn Catalog) -> Result<MigrationReport> {
        tracing::info!("Extracting packs...");
        let extracted = self.extract()?;
        self.layout.ensure_dirs()?;

        // Working trees are transient; leftovers from a failed run would leak into the store
        let working = self.layout.working_dir();
        if working.exists() {
            tracing::debug!("Removing stale working tree {}", working.display());
            std::fs::remove_dir_all(&working)?;
        }

        let level_count = catalog.level_count()?;
        let pack_count = catalog.pack_count()?;
        if level_count < 0 || pack_count < 0 {
            return Err(MigrateError::collaborator(
                "Count",
                format!("negative counts: {level_count} levels, {pack_count} packs"),
            ));
        }

        tracing::info!("Converting songs and packs...");
        let source = SourceLayout::new(self.layout.staging_dir());
        let options = PackOptions {
            language: &self.language,
            singles_pack_id: &self.singles_pack_id,
            added_date: self.added_date,
        };
        let mut converted = convert_all(&source, &self.layout, level_count, pack_count, &options)?;

        tracing::info!("Moving files into the content store...");
        let store = build_store(&working, &self.layout.store_dir(), self.hash_workers).await?;

        tracing::info!("Updating catalog...");
        apply_rewrite(&mut converted.levels, &mut converted.packs, &store.rewrite)?;
        let written = write_catalog(catalog, &converted.levels, &converted.packs, &store.files)?;

        Ok(MigrationReport {
            extracted,
            first_level_id: level_count + 1,
            first_pack_id: pack_count + 1,
            stored: store.stored,
            deduplicated: store.deduplicated,
            written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogLevel, CatalogPack, LevelSettings, RecordType};
    use crate::db::SqliteCatalog;
    use serde_json::json;
    use std::path::Path;

    /// Pack builder: concatenates entries and writes the sibling index
    struct PackFixture {
        bytes: Vec<u8>,
        groups: Vec<(String, Vec<serde_json::Value>)>,
    }

    impl PackFixture {
        fn new() -> Self {
            Self {
                bytes: b"PACKHEADER".to_vec(),
                groups: Vec::new(),
            }
        }

        fn add(&mut self, group: &str, name: &str, content: &[u8]) -> &mut Self {
            let entry = json!({
                "OriginalFilename": name,
                "Offset": self.bytes.len(),
                "Length": content.len()
            });
            self.bytes.extend_from_slice(content);
            match self.groups.iter_mut().find(|(g, _)| g == group) {
                Some((_, entries)) => entries.push(entry),
                None => self.groups.push((group.to_string(), vec![entry])),
            }
            self
        }

        fn write(&self, dir: &Path, name: &str) {
            let groups: Vec<_> = self
                .groups
                .iter()
                .map(|(g, entries)| json!({"Name": g, "OrderedEntries": entries}))
                .collect();
            std::fs::write(dir.join(format!("{name}.pack")), &self.bytes).unwrap();
            std::fs::write(
                dir.join(format!("{name}.json")),
                json!({ "Groups": groups }).to_string(),
            )
            .unwrap();
        }
    }

    fn fixture_archive(dir: &Path) {
        let songlist = json!({"songs": [{
            "id": "s1", "set": "p1", "date": 1480000000,
            "bpm": "120-140", "bpm_base": 120, "side": 0, "bg": "",
            "title_localized": {"en": "Song One"}, "artist": "Artist",
            "difficulties": [
                {"ratingClass": 0, "rating": 3, "chartDesigner": "c0", "jacketDesigner": "j"},
                {"ratingClass": 2, "rating": 9, "chartDesigner": "c2", "jacketDesigner": "j"}
            ]
        }]});
        let packlist = json!({"packs": [{"id": "p1", "name_localized": {"en": "Pack One"}}]});

        let mut pack = PackFixture::new();
        pack.add("Fallback", "songs/s1/base.ogg", b"ogg audio")
            .add("jackets_large", "songs/s1/base.jpg", b"shared image")
            .add("charts", "songs/s1/0.aff", b"past chart")
            .add("charts", "songs/s1/2.aff", b"future chart")
            .add("not_audio", "img/bg/base_light.jpg", b"shared image")
            .add("packs", "songs/pack/select_p1.png", b"pack cover")
            .add("not_audio_or_images", "songs/songlist", songlist.to_string().as_bytes())
            .add("not_audio_or_images", "songs/packlist", packlist.to_string().as_bytes());
        pack.write(dir, "main");
    }

    fn seed_level(catalog: &SqliteCatalog, id: i64) {
        catalog
            .add_level(&CatalogLevel {
                id,
                record_type: RecordType::Level,
                identifier: format!("old.{id}"),
                is_default_asset: true,
                added_date: 0,
                version: 0,
                settings: LevelSettings {
                    charts: Vec::new(),
                    last_opened_chart_path: String::new(),
                },
                file_references: Vec::new(),
            })
            .unwrap();
    }

    fn migration(root: &Path) -> Migration {
        Migration {
            input: root.join("romfs"),
            layout: OutputLayout::new(root.join("out")),
            language: "en".to_string(),
            singles_pack_id: "single".to_string(),
            hash_workers: 2,
            added_date: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn end_to_end_single_song_single_pack() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("romfs")).unwrap();
        fixture_archive(&root.path().join("romfs"));

        let catalog = SqliteCatalog::open_in_memory().unwrap();
        seed_level(&catalog, 1);
        seed_level(&catalog, 2);

        let migration = migration(root.path());
        let report = migration.run(&catalog).await.unwrap();

        assert_eq!(report.extracted.as_ref().unwrap().files, 8);
        assert_eq!(report.first_level_id, 3);
        assert_eq!(report.first_pack_id, 1);
        assert_eq!(report.stored, 5);
        assert_eq!(report.deduplicated, 1);
        assert_eq!(report.written.levels, 1);
        assert_eq!(report.written.packs, 1);
        assert_eq!(report.written.files, 6);

        let levels = catalog.levels().unwrap();
        assert_eq!(levels.len(), 3);
        let level: CatalogLevel = levels[2].record().unwrap();
        assert_eq!(level.id, 3);
        assert_eq!(level.identifier, "p1.s1");
        assert_eq!(level.added_date, 1_480_000_000);

        let chart = &level.settings.charts[1];
        assert!(!chart.sync_base_bpm);
        assert_eq!(chart.bpm_text.as_deref(), Some("120 - 140"));
        assert_eq!(chart.difficulty, "Future 9");
        // Jacket and background share content, so they share a stored name
        assert_eq!(chart.jacket_path, chart.background_path);

        let store = migration.layout.store_dir();
        for reference in &level.file_references {
            assert!(store.join(reference).is_file(), "{reference} missing from store");
        }

        let packs = catalog.packs().unwrap();
        assert_eq!(packs.len(), 1);
        let pack: CatalogPack = packs[0].record().unwrap();
        assert_eq!(pack.id, 1);
        assert_eq!(pack.identifier, "p1");
        assert_eq!(pack.level_identifiers, vec!["p1.s1"]);
        assert!(store.join(&pack.image_path).is_file());

        let files = catalog.files().unwrap();
        let keys: Vec<&str> = files.iter().map(|f| f.real_path.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Level/p1.s1/0.aff",
                "Level/p1.s1/2.aff",
                "Level/p1.s1/base.jpg",
                "Level/p1.s1/base.ogg",
                "Level/p1.s1/base_light.jpg",
                "Pack/p1/select_p1.png"
            ]
        );
        assert!(!migration.layout.working_dir().exists());
    }

    #[tokio::test]
    async fn resumes_from_staging_when_input_is_gone() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("romfs")).unwrap();
        fixture_archive(&root.path().join("romfs"));

        let migration = migration(root.path());
        migration.extract().unwrap();
        std::fs::remove_dir_all(root.path().join("romfs")).unwrap();

        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let report = migration.run(&catalog).await.unwrap();
        assert!(report.extracted.is_none());
        assert_eq!(report.written.levels, 1);
    }

    #[tokio::test]
    async fn missing_input_and_staging_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let catalog = SqliteCatalog::open_in_memory().unwrap();

        let err = migration(root.path()).run(&catalog).await.unwrap_err();
        assert!(matches!(err, MigrateError::MissingInput { .. }));
        assert_eq!(catalog.level_count().unwrap(), 0);
    }
}
