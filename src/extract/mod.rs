//! Pack extraction into the staging tree
//!
//! Every `*.pack` file in the input directory has a sibling `*.json` index
//! describing groups of byte ranges. Each range is written verbatim to
//! `<staging>/<group>/<original filename>`.

mod index;

pub use index::{IndexEntry, IndexGroup, PackIndex};

use crate::error::{MigrateError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A pack file paired with its index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSource {
    pub pack: PathBuf,
    pub index: PathBuf,
}

/// Extraction statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    pub packs: usize,
    pub groups: usize,
    pub files: usize,
    pub bytes: u64,
}

impl ExtractStats {
    fn absorb(&mut self, other: ExtractStats) {
        self.packs += other.packs;
        self.groups += other.groups;
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// What to do with the extraction stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPlan {
    Extract,
    /// Input archive is gone but a previous run left a staging tree
    Resume,
}

impl ExtractPlan {
    pub fn decide(input: &Path, staging: &Path) -> Result<Self> {
        if input.exists() {
            Ok(ExtractPlan::Extract)
        } else if staging.is_dir() {
            tracing::warn!(
                "Input {} not found, reusing staged files in {}",
                input.display(),
                staging.display()
            );
            Ok(ExtractPlan::Resume)
        } else {
            Err(MigrateError::missing(input))
        }
    }
}

/// Find every pack in `dir`, sorted by file name, paired with its index
pub fn discover_packs(dir: &Path) -> Result<Vec<PackSource>> {
    if !dir.is_dir() {
        return Err(MigrateError::missing(dir));
    }

    let mut packs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("pack")
        })
        .collect();
    packs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    packs
        .into_iter()
        .map(|pack| {
            let index = pack.with_extension("json");
            if !index.is_file() {
                return Err(MigrateError::missing(index));
            }
            Ok(PackSource { pack, index })
        })
        .collect()
}

/// Extract one pack into the staging root
pub fn extract_pack(source: &PackSource, staging: &Path) -> Result<ExtractStats> {
    let index = PackIndex::load(&source.index)?;
    let mut pack = File::open(&source.pack).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MigrateError::missing(&source.pack),
        _ => MigrateError::Io(e),
    })?;
    let pack_len = pack.metadata()?.len();

    // Reject the whole pack before writing anything
    index.validate(pack_len)?;

    let mut stats = ExtractStats {
        packs: 1,
        ..Default::default()
    };

    for group in &index.groups {
        tracing::info!("Extracting group {}...", group.name);
        let group_dir = staging.join(sanitize_path(&group.name));
        std::fs::create_dir_all(&group_dir)?;
        stats.groups += 1;

        for entry in &group.ordered_entries {
            let relative = sanitize_path(&entry.original_filename);
            if relative.is_empty() {
                return Err(MigrateError::schema(format!(
                    "entry in group {} has no usable file name: {:?}",
                    group.name, entry.original_filename
                )));
            }
            let out_path = group_dir.join(&relative);
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            pack.seek(SeekFrom::Start(entry.offset))?;
            let mut out = File::create(&out_path)?;
            let written = std::io::copy(&mut (&mut pack).take(entry.length), &mut out)?;
            if written != entry.length {
                return Err(MigrateError::schema(format!(
                    "short read for {}/{}: expected {} bytes, got {}",
                    group.name, entry.original_filename, entry.length, written
                )));
            }

            tracing::trace!("{} ({} bytes)", out_path.display(), written);
            stats.files += 1;
            stats.bytes += written;
        }
    }

    Ok(stats)
}

/// Extract every pack in `input` in sorted order; later packs overwrite earlier ones
pub fn extract_all(input: &Path, staging: &Path) -> Result<ExtractStats> {
    let sources = discover_packs(input)?;
    std::fs::create_dir_all(staging)?;

    let mut total = ExtractStats::default();
    for source in &sources {
        tracing::info!(
            "Extracting pack {}...",
            source
                .pack
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default()
        );
        total.absorb(extract_pack(source, staging)?);
    }

    tracing::info!(
        "Extracted {} files ({} bytes) from {} packs",
        total.files,
        total.bytes,
        total.packs
    );
    Ok(total)
}

/// Sanitize path to prevent directory traversal
fn sanitize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("/")
}
