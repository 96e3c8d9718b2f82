//! Pack index documents

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sibling index of one pack file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackIndex {
    pub groups: Vec<IndexGroup>,
}

/// Entries sharing one destination subdirectory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexGroup {
    pub name: String,
    pub ordered_entries: Vec<IndexEntry>,
}

/// Byte range of a single file inside the pack
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexEntry {
    pub original_filename: String,
    pub offset: u64,
    pub length: u64,
}

impl IndexEntry {
    /// End of the byte range, or None on overflow
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}

impl PackIndex {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MigrateError::missing(path));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            MigrateError::schema(format!("invalid pack index {}: {}", path.display(), e))
        })
    }

    /// Check every entry against the pack's byte length
    pub fn validate(&self, pack_len: u64) -> Result<()> {
        for group in &self.groups {
            for entry in &group.ordered_entries {
                match entry.end() {
                    Some(end) if end <= pack_len => {}
                    _ => {
                        return Err(MigrateError::schema(format!(
                            "entry {}/{} [{}, +{}) exceeds pack length {}",
                            group.name, entry.original_filename, entry.offset, entry.length, pack_len
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.ordered_entries.len()).sum()
    }
}
