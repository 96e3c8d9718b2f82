//! Catalog records and the collaborator they are inserted through
//!
//! Records serialize to the catalog's wire shape (PascalCase keys, `_id`,
//! `Type`). Dates are plain integers.

mod process;
pub mod writer;

pub use process::ProcessCatalog;
pub use writer::{apply_rewrite, write_catalog, WriteStats};

use crate::error::Result;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// Working-tree directory and record type of levels
pub const LEVEL_KIND: &str = "Level";
/// Working-tree directory and record type of packs
pub const PACK_KIND: &str = "Pack";

/// Logical identity of a file: its path relative to the working root,
/// e.g. `Level/p1.s1/base.ogg`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    pub fn new(kind: &str, identifier: &str, name: &str) -> Self {
        Self(format!("{kind}/{identifier}/{name}"))
    }

    /// Build a key from a path relative to the working root, using `/` separators
    pub fn from_relative(path: &Path) -> Self {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical key of a file in the content store: `<hex digest><extension>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredName(String);

impl StoredName {
    /// `extension` is appended as-is and should carry its leading dot
    pub fn from_digest(hex_digest: &str, extension: &str) -> Self {
        Self(format!("{hex_digest}{extension}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Original relative path → stored name
pub type RewriteMap = BTreeMap<FileKey, StoredName>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    Level,
    Pack,
}

/// One playable song in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogLevel {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    /// `<set>.<song id>`
    pub identifier: String,
    pub is_default_asset: bool,
    pub added_date: i64,
    pub version: u32,
    pub settings: LevelSettings,
    pub file_references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LevelSettings {
    pub charts: Vec<Chart>,
    pub last_opened_chart_path: String,
}

/// One difficulty of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Chart {
    pub chart_path: String,
    pub audio_path: String,
    pub jacket_path: String,
    pub base_bpm: f64,
    pub title: String,
    pub composer: String,
    pub charter: String,
    pub illustrator: String,
    /// `"<difficulty name> <rating>"`
    pub difficulty: String,
    pub chart_constant: f64,
    pub difficulty_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<Skin>,
    pub sync_base_bpm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm_text: Option<String>,
    pub background_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Skin {
    pub side: SkinSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinSide {
    Light,
    Conflict,
}

impl SkinSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinSide::Light => "light",
            SkinSide::Conflict => "conflict",
        }
    }
}

/// A named collection of levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogPack {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    pub pack_name: String,
    pub image_path: String,
    pub level_identifiers: Vec<String>,
    pub identifier: String,
    pub version: u32,
    pub file_references: Vec<String>,
    pub added_date: i64,
    pub is_default_asset: bool,
    /// Cover is referenced by name only and never enters the store
    #[serde(skip)]
    pub external_image: bool,
}

/// Maps a file's logical key to its stored name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogFile {
    #[serde(rename = "_id")]
    pub key: FileKey,
    #[serde(rename = "RealPath")]
    pub stored_name: StoredName,
}

impl Serialize for CatalogFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "_id")]
            key: &'a FileKey,
            #[serde(rename = "RealPath")]
            real_path: &'a StoredName,
            #[serde(rename = "CorrectHashPath")]
            correct_hash_path: &'a StoredName,
        }

        Wire {
            key: &self.key,
            real_path: &self.stored_name,
            correct_hash_path: &self.stored_name,
        }
        .serialize(serializer)
    }
}

/// Target catalog. Counts seed id allocation; each insertion is one call.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    fn level_count(&self) -> Result<i64>;
    fn pack_count(&self) -> Result<i64>;
    fn add_level(&self, level: &CatalogLevel) -> Result<()>;
    fn add_pack(&self, pack: &CatalogPack) -> Result<()>;
    fn add_file(&self, file: &CatalogFile) -> Result<()>;
}
