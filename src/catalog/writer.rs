//! Rewriting record file references and inserting records

use super::{
    Catalog, CatalogFile, CatalogLevel, CatalogPack, FileKey, RewriteMap, LEVEL_KIND, PACK_KIND,
};
use crate::error::{MigrateError, Result};

/// Insertion statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    pub levels: usize,
    pub packs: usize,
    pub files: usize,
}

struct Resolver<'a> {
    map: &'a RewriteMap,
    kind: &'static str,
    identifier: &'a str,
}

impl Resolver<'_> {
    fn resolve(&self, name: &mut String) -> Result<()> {
        let key = FileKey::new(self.kind, self.identifier, name);
        match self.map.get(&key) {
            Some(stored) => {
                *name = stored.as_str().to_string();
                Ok(())
            }
            None => Err(MigrateError::referential(format!(
                "{} references {} which is not in the content store",
                self.identifier, key
            ))),
        }
    }
}

/// Replace every per-record file name with its stored name
pub fn apply_rewrite(
    levels: &mut [CatalogLevel],
    packs: &mut [CatalogPack],
    map: &RewriteMap,
) -> Result<()> {
    for level in levels.iter_mut() {
        let resolver = Resolver {
            map,
            kind: LEVEL_KIND,
            identifier: &level.identifier,
        };

        for chart in &mut level.settings.charts {
            resolver.resolve(&mut chart.chart_path)?;
            resolver.resolve(&mut chart.audio_path)?;
            resolver.resolve(&mut chart.jacket_path)?;
            resolver.resolve(&mut chart.background_path)?;
        }
        resolver.resolve(&mut level.settings.last_opened_chart_path)?;
        for reference in &mut level.file_references {
            resolver.resolve(reference)?;
        }
    }

    for pack in packs.iter_mut() {
        let resolver = Resolver {
            map,
            kind: PACK_KIND,
            identifier: &pack.identifier,
        };

        let external = pack.external_image.then(|| pack.image_path.clone());
        if external.is_none() {
            resolver.resolve(&mut pack.image_path)?;
        }
        for reference in &mut pack.file_references {
            if external.as_deref() == Some(reference.as_str()) {
                continue;
            }
            resolver.resolve(reference)?;
        }
    }

    Ok(())
}

/// Insert all levels, then all packs, then all files
pub fn write_catalog(
    catalog: &dyn Catalog,
    levels: &[CatalogLevel],
    packs: &[CatalogPack],
    files: &[CatalogFile],
) -> Result<WriteStats> {
    let mut stats = WriteStats::default();

    tracing::info!("Inserting {} levels...", levels.len());
    for level in levels {
        catalog.add_level(level)?;
        stats.levels += 1;
    }

    tracing::info!("Inserting {} packs...", packs.len());
    for pack in packs {
        catalog.add_pack(pack)?;
        stats.packs += 1;
    }

    tracing::info!("Inserting {} files...", files.len());
    for file in files {
        catalog.add_file(file)?;
        stats.files += 1;
    }

    Ok(stats)
}
