//! Pack list → pack conversion

use super::level::LevelIndex;
use super::source::{localized, PackRecord, SourceLayout, SINGLES_COVER};
use super::{copy_asset, IdAllocator};
use crate::catalog::{CatalogPack, RecordType};
use crate::error::{MigrateError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Options that vary per run
#[derive(Debug, Clone)]
pub struct PackOptions<'a> {
    pub language: &'a str,
    pub singles_pack_id: &'a str,
    /// `AddedDate` stamped on every pack
    pub added_date: i64,
}

/// Convert the pack list. One record is produced per distinct target
/// identifier, with its id allocated by the first source pack naming it.
///
/// A sub-pack (`pack_parent` set) collapses into its parent: the levels of
/// the sub-pack's own set are appended to the parent record, skipping ones
/// already listed. The merged record therefore lists the levels of every set
/// that collapsed into it, and the parent's own name wins over sub-pack names.
pub fn convert_packs(
    source: &SourceLayout,
    pack_dir: &Path,
    packs: &[PackRecord],
    levels_by_set: &LevelIndex,
    ids: &mut IdAllocator,
    options: &PackOptions<'_>,
) -> Result<Vec<CatalogPack>> {
    let mut converted: Vec<CatalogPack> = Vec::new();
    let mut by_target: HashMap<String, usize> = HashMap::new();

    for pack in packs {
        tracing::info!("Converting pack {}...", pack.id);
        let target = pack.target_identifier();
        let name = localized(&pack.name_localized, options.language, &format!("pack {}", pack.id))?;

        // Keyed by the pack's own id, not the collapsed target
        let own_levels = levels_by_set
            .get(&pack.id)
            .filter(|levels| !levels.is_empty())
            .ok_or_else(|| {
                MigrateError::referential(format!("pack {} has no levels", pack.id))
            })?;

        if let Some(&slot) = by_target.get(target) {
            let existing = &mut converted[slot];
            tracing::debug!("Merging pack {} into {}", pack.id, existing.identifier);
            for level in own_levels {
                if !existing.level_identifiers.contains(level) {
                    existing.level_identifiers.push(level.clone());
                }
            }
            if pack.id == target {
                existing.pack_name = name.to_string();
            }
            continue;
        }

        let (image_path, external_image) = if target == options.singles_pack_id {
            let cover = source.singles_cover();
            if !cover.is_file() {
                return Err(MigrateError::missing(cover));
            }
            (SINGLES_COVER.to_string(), true)
        } else {
            let cover_name = format!("select_{target}.png");
            let record_dir = pack_dir.join(target);
            std::fs::create_dir_all(&record_dir)?;
            copy_asset(&source.pack_cover(&cover_name), &record_dir, &cover_name)?;
            (cover_name, false)
        };

        by_target.insert(target.to_string(), converted.len());
        converted.push(CatalogPack {
            id: ids.next_id(),
            record_type: RecordType::Pack,
            pack_name: name.to_string(),
            file_references: vec![image_path.clone()],
            image_path,
            level_identifiers: own_levels.clone(),
            identifier: target.to_string(),
            version: 0,
            added_date: options.added_date,
            is_default_asset: true,
            external_image,
        });
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::source::PackList;
    use serde_json::json;

    const OPTIONS: PackOptions<'static> = PackOptions {
        language: "en",
        singles_pack_id: "single",
        added_date: 42,
    };

    fn stage(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, relative.as_bytes()).unwrap();
    }

    fn packs(value: serde_json::Value) -> Vec<PackRecord> {
        serde_json::from_value::<PackList>(value).unwrap().packs
    }

    fn index(entries: &[(&str, &[&str])]) -> LevelIndex {
        entries
            .iter()
            .map(|(set, levels)| {
                (
                    set.to_string(),
                    levels.iter().map(|l| l.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn pack_receives_levels_of_its_own_set() {
        let staging = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        stage(staging.path(), "packs/songs/pack/select_p1.png");

        let converted = convert_packs(
            &SourceLayout::new(staging.path()),
            working.path(),
            &packs(json!({"packs": [{"id": "p1", "name_localized": {"en": "Pack One"}}]})),
            &index(&[("p1", &["p1.s1", "p1.s2"]), ("p2", &["p2.s9"])]),
            &mut IdAllocator::after(10),
            &OPTIONS,
        )
        .unwrap();

        assert_eq!(converted.len(), 1);
        let pack = &converted[0];
        assert_eq!(pack.id, 11);
        assert_eq!(pack.identifier, "p1");
        assert_eq!(pack.pack_name, "Pack One");
        assert_eq!(pack.level_identifiers, vec!["p1.s1", "p1.s2"]);
        assert_eq!(pack.image_path, "select_p1.png");
        assert_eq!(pack.file_references, vec!["select_p1.png"]);
        assert_eq!(pack.added_date, 42);
        assert!(working.path().join("p1/select_p1.png").is_file());
    }

    #[test]
    fn sub_packs_merge_into_parent() {
        let staging = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        stage(staging.path(), "packs/songs/pack/select_extend.png");

        let converted = convert_packs(
            &SourceLayout::new(staging.path()),
            working.path(),
            &packs(json!({"packs": [
                {"id": "extend_2", "pack_parent": "extend", "name_localized": {"en": "Extend 2"}},
                {"id": "extend", "name_localized": {"en": "Extend"}},
                {"id": "extend_3", "pack_parent": "extend", "name_localized": {"en": "Extend 3"}}
            ]})),
            &index(&[
                ("extend", &["extend.a"]),
                ("extend_2", &["extend_2.b"]),
                ("extend_3", &["extend_3.c"]),
            ]),
            &mut IdAllocator::after(0),
            &OPTIONS,
        )
        .unwrap();

        assert_eq!(converted.len(), 1);
        let pack = &converted[0];
        assert_eq!(pack.id, 1);
        assert_eq!(pack.identifier, "extend");
        assert_eq!(pack.pack_name, "Extend");
        assert_eq!(
            pack.level_identifiers,
            vec!["extend_2.b", "extend.a", "extend_3.c"]
        );
    }

    #[test]
    fn singles_cover_is_referenced_not_copied() {
        let staging = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        stage(
            staging.path(),
            "not_large_png/layouts/songselect/folder_singles.png",
        );

        let converted = convert_packs(
            &SourceLayout::new(staging.path()),
            working.path(),
            &packs(json!({"packs": [{"id": "single", "name_localized": {"en": "Memory Archive"}}]})),
            &index(&[("single", &["single.x"])]),
            &mut IdAllocator::after(0),
            &OPTIONS,
        )
        .unwrap();

        assert_eq!(converted[0].image_path, "folder_singles.png");
        assert!(converted[0].external_image);
        assert!(!working.path().join("single").exists());
    }

    #[test]
    fn pack_without_levels_is_referential_error() {
        let staging = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        stage(staging.path(), "packs/songs/pack/select_empty.png");

        let err = convert_packs(
            &SourceLayout::new(staging.path()),
            working.path(),
            &packs(json!({"packs": [{"id": "empty", "name_localized": {"en": "Empty"}}]})),
            &LevelIndex::new(),
            &mut IdAllocator::after(0),
            &OPTIONS,
        )
        .unwrap_err();
        assert!(matches!(err, MigrateError::ReferentialError(_)));
    }

    #[test]
    fn missing_cover_is_fatal() {
        let staging = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();

        let err = convert_packs(
            &SourceLayout::new(staging.path()),
            working.path(),
            &packs(json!({"packs": [{"id": "p1", "name_localized": {"en": "P"}}]})),
            &index(&[("p1", &["p1.s1"])]),
            &mut IdAllocator::after(0),
            &OPTIONS,
        )
        .unwrap_err();
        assert!(matches!(err, MigrateError::MissingInput { .. }));
    }
}
