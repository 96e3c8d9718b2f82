//! Song → level conversion

use super::source::{localized, SongRecord, SourceLayout};
use super::{copy_asset, IdAllocator};
use crate::catalog::{Chart, CatalogLevel, LevelSettings, RecordType, Skin, SkinSide};
use crate::error::{MigrateError, Result};
use std::collections::HashMap;
use std::path::Path;

const AUDIO_FILE: &str = "base.ogg";
const JACKET_FILE: &str = "base.jpg";

/// Difficulty tier with its fixed display name and color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyClass {
    Past,
    Present,
    Future,
    Beyond,
}

impl DifficultyClass {
    pub fn from_rating_class(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Past),
            1 => Some(Self::Present),
            2 => Some(Self::Future),
            3 => Some(Self::Beyond),
            _ => None,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            Self::Past => 0,
            Self::Present => 1,
            Self::Future => 2,
            Self::Beyond => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Past => "Past",
            Self::Present => "Present",
            Self::Future => "Future",
            Self::Beyond => "Beyond",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Past => "#3A6B78FF",
            Self::Present => "#566947FF",
            Self::Future => "#482B54FF",
            Self::Beyond => "#7C1C30FF",
        }
    }

    /// Chart file name, e.g. `2.aff`
    pub fn chart_file(&self) -> String {
        format!("{}.aff", self.index())
    }
}

/// Skin hint: 0 → light, 1 → conflict, anything else → none
pub fn skin_for_side(side: i64) -> Option<SkinSide> {
    match side {
        0 => Some(SkinSide::Light),
        1 => Some(SkinSide::Conflict),
        _ => None,
    }
}

/// Returns `(sync_base_bpm, bpm_text)`. The display string is only kept
/// when it differs from the stringified base bpm.
pub fn bpm_display(bpm: &str, bpm_base: &serde_json::Number) -> (bool, Option<String>) {
    if bpm == bpm_base.to_string() {
        (true, None)
    } else {
        (false, Some(bpm.replace(' ', "").replace('-', " - ")))
    }
}

/// Background file name for one difficulty. An explicit song background
/// overrides the defaults; only side 0 selects the light variant.
pub fn background_name(song_bg: &str, class: DifficultyClass, side: i64) -> String {
    if !song_bg.is_empty() {
        return format!("{song_bg}.jpg");
    }
    let tier = if class == DifficultyClass::Beyond {
        "byd"
    } else {
        "base"
    };
    let variant = if side == 0 { "light" } else { "conflict" };
    format!("{tier}_{variant}.jpg")
}

/// Set id → level identifiers, in song-list order
pub type LevelIndex = HashMap<String, Vec<String>>;

/// Convert every song, copying its assets into `<level_dir>/<identifier>/`
pub fn convert_songs(
    source: &SourceLayout,
    level_dir: &Path,
    songs: &[SongRecord],
    ids: &mut IdAllocator,
    language: &str,
) -> Result<(Vec<CatalogLevel>, LevelIndex)> {
    let mut levels = Vec::with_capacity(songs.len());
    let mut index = LevelIndex::new();

    for song in songs {
        tracing::info!("Converting song {}...", song.id);
        let level = convert_song(source, level_dir, song, ids.next_id(), language)?;
        index
            .entry(song.set.clone())
            .or_default()
            .push(level.identifier.clone());
        levels.push(level);
    }

    Ok((levels, index))
}

fn convert_song(
    source: &SourceLayout,
    level_dir: &Path,
    song: &SongRecord,
    id: i64,
    language: &str,
) -> Result<CatalogLevel> {
    let identifier = song.identifier();
    let asset_dir = song.asset_dir_name();
    if song.difficulties.is_empty() {
        return Err(MigrateError::schema(format!(
            "song {} has no difficulties",
            song.id
        )));
    }

    let record_dir = level_dir.join(&identifier);
    std::fs::create_dir_all(&record_dir)?;

    let title = localized(&song.title_localized, language, &format!("song {}", song.id))?;
    let base_bpm = song.bpm_base.as_f64().ok_or_else(|| {
        MigrateError::schema(format!("song {} has a non-numeric bpm_base", song.id))
    })?;
    let (sync_base_bpm, bpm_text) = bpm_display(&song.bpm, &song.bpm_base);
    let skin = skin_for_side(song.side).map(|side| Skin { side });

    copy_asset(&source.audio(&asset_dir), &record_dir, AUDIO_FILE)?;
    copy_asset(&source.jacket(&asset_dir), &record_dir, JACKET_FILE)?;

    let mut charts = Vec::with_capacity(song.difficulties.len());
    let mut backgrounds: Vec<String> = Vec::new();

    for diff in &song.difficulties {
        let class = DifficultyClass::from_rating_class(diff.rating_class).ok_or_else(|| {
            MigrateError::schema(format!(
                "song {} has rating class {} outside 0..=3",
                song.id, diff.rating_class
            ))
        })?;

        let chart_file = class.chart_file();
        copy_asset(&source.chart(&asset_dir, &chart_file), &record_dir, &chart_file)?;

        // A name already placed in the record (jacket, chart or an earlier
        // background) is referenced as is and not listed twice
        let background = background_name(&song.bg, class, song.side);
        if !record_dir.join(&background).exists() {
            copy_asset(&source.background(&background), &record_dir, &background)?;
            backgrounds.push(background.clone());
        }

        charts.push(Chart {
            chart_path: chart_file,
            audio_path: AUDIO_FILE.to_string(),
            jacket_path: JACKET_FILE.to_string(),
            base_bpm,
            title: title.to_string(),
            composer: song.artist.clone(),
            charter: diff.chart_designer.clone(),
            illustrator: diff.jacket_designer.clone(),
            difficulty: format!("{} {}", class.name(), diff.rating),
            chart_constant: f64::from(diff.rating),
            difficulty_color: class.color().to_string(),
            skin: skin.clone(),
            sync_base_bpm,
            bpm_text: bpm_text.clone(),
            background_path: background,
        });
    }

    let file_references: Vec<String> = [AUDIO_FILE.to_string(), JACKET_FILE.to_string()]
        .into_iter()
        .chain(backgrounds)
        .chain(charts.iter().map(|c| c.chart_path.clone()))
        .collect();

    let last_opened_chart_path = charts
        .last()
        .map(|c| c.chart_path.clone())
        .unwrap_or_default();

    Ok(CatalogLevel {
        id,
        record_type: RecordType::Level,
        identifier,
        is_default_asset: true,
        added_date: song.date,
        version: 0,
        settings: LevelSettings {
            charts,
            last_opened_chart_path,
        },
        file_references,
    })
}
