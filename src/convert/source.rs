//! Source song/pack list documents and where staged assets live

use crate::error::{MigrateError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `{ "songs": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct SongList {
    pub songs: Vec<SongRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    pub id: String,
    pub set: String,
    #[serde(default)]
    pub date: i64,
    pub bpm: String,
    pub bpm_base: serde_json::Number,
    pub side: i64,
    #[serde(default)]
    pub bg: String,
    pub title_localized: BTreeMap<String, String>,
    pub artist: String,
    pub difficulties: Vec<Difficulty>,
    #[serde(default)]
    pub remote_dl: Option<bool>,
}

impl SongRecord {
    /// Directory name holding this song's audio, jacket and charts
    pub fn asset_dir_name(&self) -> String {
        if self.remote_dl.unwrap_or(false) {
            format!("dl_{}", self.id)
        } else {
            self.id.clone()
        }
    }

    /// `<set>.<id>`
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.set, self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difficulty {
    pub rating_class: i64,
    pub rating: i32,
    #[serde(default)]
    pub chart_designer: String,
    #[serde(default)]
    pub jacket_designer: String,
}

/// `{ "packs": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct PackList {
    pub packs: Vec<PackRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackRecord {
    pub id: String,
    #[serde(default)]
    pub pack_parent: Option<String>,
    pub name_localized: BTreeMap<String, String>,
}

impl PackRecord {
    /// Sub-packs collapse into their parent
    pub fn target_identifier(&self) -> &str {
        self.pack_parent.as_deref().unwrap_or(&self.id)
    }
}

/// Pick the configured language out of a localized map
pub fn localized<'a>(
    values: &'a BTreeMap<String, String>,
    language: &str,
    owner: &str,
) -> Result<&'a str> {
    values.get(language).map(String::as_str).ok_or_else(|| {
        MigrateError::schema(format!("{owner} has no '{language}' localization"))
    })
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(MigrateError::missing(path));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| MigrateError::schema(format!("invalid {}: {}", path.display(), e)))
}

/// Fixed locations of documents and assets inside the staging tree
#[derive(Debug, Clone)]
pub struct SourceLayout {
    staging: PathBuf,
}

impl SourceLayout {
    pub fn new(staging: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
        }
    }

    pub fn song_list(&self) -> PathBuf {
        self.staging.join("not_audio_or_images/songs/songlist")
    }

    pub fn pack_list(&self) -> PathBuf {
        self.staging.join("not_audio_or_images/songs/packlist")
    }

    pub fn load_songs(&self) -> Result<SongList> {
        load_document(&self.song_list())
    }

    pub fn load_packs(&self) -> Result<PackList> {
        load_document(&self.pack_list())
    }

    pub fn audio(&self, asset_dir: &str) -> PathBuf {
        self.staging.join("Fallback/songs").join(asset_dir).join("base.ogg")
    }

    pub fn jacket(&self, asset_dir: &str) -> PathBuf {
        self.staging
            .join("jackets_large/songs")
            .join(asset_dir)
            .join("base.jpg")
    }

    pub fn chart(&self, asset_dir: &str, chart_name: &str) -> PathBuf {
        self.staging.join("charts/songs").join(asset_dir).join(chart_name)
    }

    pub fn background(&self, name: &str) -> PathBuf {
        self.staging.join("not_audio/img/bg").join(name)
    }

    pub fn pack_cover(&self, name: &str) -> PathBuf {
        self.staging.join("packs/songs/pack").join(name)
    }

    pub fn singles_cover(&self) -> PathBuf {
        self.staging
            .join("not_large_png/layouts/songselect")
            .join(SINGLES_COVER)
    }
}

/// Cover shared by the singles pack
pub const SINGLES_COVER: &str = "folder_singles.png";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_songs_use_dl_prefixed_asset_dir() {
        let json = r#"{"songs": [
            {"id": "s1", "set": "p1", "date": 1, "bpm": "120", "bpm_base": 120, "side": 0,
             "title_localized": {"en": "One"}, "artist": "A", "difficulties": []},
            {"id": "s2", "set": "p1", "date": 1, "bpm": "120", "bpm_base": 120, "side": 0,
             "bg": "", "title_localized": {"en": "Two"}, "artist": "A", "difficulties": [],
             "remote_dl": true}
        ]}"#;
        let list: SongList = serde_json::from_str(json).unwrap();
        assert_eq!(list.songs[0].asset_dir_name(), "s1");
        assert_eq!(list.songs[1].asset_dir_name(), "dl_s2");
        assert_eq!(list.songs[1].identifier(), "p1.s2");
    }

    #[test]
    fn difficulty_fields_are_camel_case() {
        let json = r#"{"ratingClass": 3, "rating": 10, "ratingPlus": true,
                       "chartDesigner": "c", "jacketDesigner": "j"}"#;
        let diff: Difficulty = serde_json::from_str(json).unwrap();
        assert_eq!(diff.rating_class, 3);
        assert_eq!(diff.chart_designer, "c");
    }

    #[test]
    fn sub_pack_targets_parent() {
        let json = r#"{"packs": [
            {"id": "base", "name_localized": {"en": "Base"}},
            {"id": "extend_2", "pack_parent": "extend", "name_localized": {"en": "Ext 2"}}
        ]}"#;
        let list: PackList = serde_json::from_str(json).unwrap();
        assert_eq!(list.packs[0].target_identifier(), "base");
        assert_eq!(list.packs[1].target_identifier(), "extend");
    }

    #[test]
    fn missing_localization_is_schema_violation() {
        let mut names = BTreeMap::new();
        names.insert("ja".to_string(), "名前".to_string());
        assert!(matches!(
            localized(&names, "en", "pack base"),
            Err(MigrateError::SchemaViolation(_))
        ));
    }

    #[test]
    fn missing_song_list_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SourceLayout::new(dir.path());
        match layout.load_songs() {
            Err(MigrateError::MissingInput { path }) => assert!(path.ends_with("songs/songlist")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
