//! Catalog row types

use rusqlite::Row;

/// Stored level or pack: id, identifier and the serialized record
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: i64,
    pub identifier: String,
    pub added_date: i64,
    pub body: String,
}

impl RecordRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            identifier: row.get(1)?,
            added_date: row.get(2)?,
            body: row.get(3)?,
        })
    }

    pub fn record<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Stored file mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub real_path: String,
    pub stored_name: String,
}

impl FileRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            real_path: row.get(0)?,
            stored_name: row.get(1)?,
        })
    }
}
