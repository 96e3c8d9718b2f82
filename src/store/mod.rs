//! Content-addressed file store
//!
//! Every file under the per-record working trees is moved to
//! `<store>/<sha1 hex><ext>`. Identical content collapses onto one stored
//! file, and re-running over the same content yields the same names.

use crate::catalog::{CatalogFile, FileKey, RewriteMap, StoredName, LEVEL_KIND, PACK_KIND};
use crate::error::{MigrateError, Result};
use futures::stream::{self, StreamExt};
use sha1::Digest;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of building the store
#[derive(Debug, Default)]
pub struct StoreReport {
    pub rewrite: RewriteMap,
    /// One entry per original file, in walk order
    pub files: Vec<CatalogFile>,
    /// Files moved into the store
    pub stored: usize,
    /// Files dropped because their content was already stored
    pub deduplicated: usize,
}

/// SHA-1 of a file's full contents as lowercase hex
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut sha = sha1::Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }

    Ok(format!("{:x}", sha.finalize()))
}

/// Stored name for a file with the given digest, keeping its extension
pub fn stored_name(path: &Path, hex_digest: &str) -> StoredName {
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    StoredName::from_digest(hex_digest, &extension)
}

/// Move `src` to `dest` unless `dest` already exists. The hard link either
/// claims the name or fails with `AlreadyExists`; in both cases the source
/// is removed. Returns whether this call stored the file.
fn claim(src: &Path, dest: &Path) -> std::io::Result<bool> {
    match std::fs::hard_link(src, dest) {
        Ok(()) => {
            std::fs::remove_file(src)?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            std::fs::remove_file(src)?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Remove the working root once it is empty. Other entries under it are left
/// alone, as is a root that was never created.
fn remove_working_root(working_root: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir(working_root) {
        Ok(()) => Ok(()),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::DirectoryNotEmpty
            ) =>
        {
            tracing::debug!("Keeping {}: {}", working_root.display(), e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Regular files of the level and pack working trees, sorted by path
fn collect_files(working_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for kind in [LEVEL_KIND, PACK_KIND] {
        let dir = working_root.join(kind);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Hash, move and deduplicate every working file, then remove the working trees
pub async fn build_store(working_root: &Path, store_dir: &Path, workers: usize) -> Result<StoreReport> {
    std::fs::create_dir_all(store_dir)?;
    let files = collect_files(working_root)?;
    tracing::info!("Hashing {} files with {} workers...", files.len(), workers);

    // Results come back in input order regardless of completion order
    let digests: Vec<_> = stream::iter(files.iter().cloned())
        .map(|path| tokio::task::spawn_blocking(move || hash_file(&path)))
        .buffered(workers.max(1))
        .collect()
        .await;

    let mut report = StoreReport::default();
    for (path, digest) in files.iter().zip(digests) {
        let digest = digest.map_err(|e| MigrateError::Io(std::io::Error::other(e)))??;

        let relative = path
            .strip_prefix(working_root)
            .map_err(|_| MigrateError::schema(format!("{} escaped the working tree", path.display())))?;
        let key = FileKey::from_relative(relative);
        let name = stored_name(path, &digest);

        if claim(path, &store_dir.join(name.as_str()))? {
            tracing::debug!("Stored {} as {}", key, name);
            report.stored += 1;
        } else {
            tracing::debug!("{} duplicates {}", key, name);
            report.deduplicated += 1;
        }

        report.files.push(CatalogFile {
            key: key.clone(),
            stored_name: name.clone(),
        });
        report.rewrite.insert(key, name);
    }

    for kind in [LEVEL_KIND, PACK_KIND] {
        let dir = working_root.join(kind);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
    }
    remove_working_root(working_root)?;

    tracing::info!(
        "Store holds {} new files ({} duplicates dropped)",
        report.stored,
        report.deduplicated
    );
    Ok(report)
}
