//! Metadata conversion: source song/pack lists → catalog records
//!
//! Each record gets a working directory holding exactly the files it
//! references; the store builder later hashes those trees.

pub mod level;
pub mod pack;
pub mod source;

pub use level::{background_name, bpm_display, convert_songs, DifficultyClass, LevelIndex};
pub use pack::{convert_packs, PackOptions};
pub use source::{PackList, PackRecord, SongList, SongRecord, SourceLayout};

use crate::catalog::{CatalogLevel, CatalogPack};
use crate::config::OutputLayout;
use crate::error::{MigrateError, Result};
use std::path::Path;

/// Sequential id source seeded from a catalog count
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// First id handed out is `count + 1`
    pub fn after(count: i64) -> Self {
        Self { next: count + 1 }
    }

    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> i64 {
        self.next
    }
}

/// Records produced by a conversion run
#[derive(Debug, Clone)]
pub struct Converted {
    pub levels: Vec<CatalogLevel>,
    pub packs: Vec<CatalogPack>,
}

/// Convert songs then packs, seeding ids from the catalog counts
pub fn convert_all(
    source: &SourceLayout,
    layout: &OutputLayout,
    level_count: i64,
    pack_count: i64,
    options: &PackOptions<'_>,
) -> Result<Converted> {
    let songs = source.load_songs()?;
    let packs = source.load_packs()?;

    let mut level_ids = IdAllocator::after(level_count);
    let (levels, levels_by_set) = convert_songs(
        source,
        &layout.level_dir(),
        &songs.songs,
        &mut level_ids,
        options.language,
    )?;

    let mut pack_ids = IdAllocator::after(pack_count);
    let packs = convert_packs(
        source,
        &layout.pack_dir(),
        &packs.packs,
        &levels_by_set,
        &mut pack_ids,
        options,
    )?;

    tracing::info!("Converted {} levels and {} packs", levels.len(), packs.len());
    Ok(Converted { levels, packs })
}

/// Copy a staged asset into a record directory under `name`
pub(crate) fn copy_asset(src: &Path, record_dir: &Path, name: &str) -> Result<()> {
    if !src.is_file() {
        return Err(MigrateError::missing(src));
    }
    let dest = record_dir.join(name);
    std::fs::copy(src, &dest)?;
    tracing::debug!("Copied {} -> {}", src.display(), dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_starts_after_count() {
        let mut ids = IdAllocator::after(41);
        assert_eq!(ids.next_id(), 42);
        assert_eq!(ids.next_id(), 43);
        assert_eq!(ids.peek(), 44);
    }

    #[test]
    fn empty_catalog_starts_at_one() {
        assert_eq!(IdAllocator::after(0).next_id(), 1);
    }
}
