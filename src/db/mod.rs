//! SQLite catalog backend

mod schema;

pub use schema::*;

use crate::catalog::{Catalog, CatalogFile, CatalogLevel, CatalogPack};
use crate::error::{MigrateError, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Embedded catalog with thread-safe access
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

fn failure(operation: &str) -> impl Fn(rusqlite::Error) -> MigrateError + '_ {
    move |e| MigrateError::collaborator(operation, e.to_string())
}

impl SqliteCatalog {
    /// Open or create the catalog at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(failure("Open"))?;
        let catalog = Self {
            conn: Mutex::new(conn),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// In-memory catalog (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(failure("Open"))?;
        let catalog = Self {
            conn: Mutex::new(conn),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MigrateError::collaborator("Lock", "catalog connection poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            -- Levels; identifiers are not deduplicated
            CREATE TABLE IF NOT EXISTS levels (
                id INTEGER PRIMARY KEY,
                identifier TEXT NOT NULL,
                added_date INTEGER NOT NULL,
                body TEXT NOT NULL
            );

            -- Packs
            CREATE TABLE IF NOT EXISTS packs (
                id INTEGER PRIMARY KEY,
                identifier TEXT NOT NULL,
                added_date INTEGER NOT NULL,
                body TEXT NOT NULL
            );

            -- Original relative path -> content store name
            CREATE TABLE IF NOT EXISTS files (
                real_path TEXT PRIMARY KEY,
                stored_name TEXT NOT NULL
            );
            "#,
        )
        .map_err(failure("InitSchema"))
    }

    fn count(&self, operation: &str, table: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(failure(operation))
    }

    fn insert_record(
        &self,
        operation: &str,
        table: &str,
        id: i64,
        identifier: &str,
        added_date: i64,
        body: &str,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO {table} (id, identifier, added_date, body) VALUES (?1, ?2, ?3, ?4)"),
            params![id, identifier, added_date, body],
        )
        .map_err(failure(operation))?;
        Ok(())
    }

    fn records(&self, table: &str) -> Result<Vec<RecordRow>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, identifier, added_date, body FROM {table} ORDER BY id ASC"
            ))
            .map_err(failure("Query"))?;
        let rows = stmt
            .query_map([], |row| RecordRow::from_row(row))
            .map_err(failure("Query"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(failure("Query"))?;
        Ok(rows)
    }

    /// All stored levels, ordered by id
    pub fn levels(&self) -> Result<Vec<RecordRow>> {
        self.records("levels")
    }

    /// All stored packs, ordered by id
    pub fn packs(&self) -> Result<Vec<RecordRow>> {
        self.records("packs")
    }

    /// All stored file mappings, ordered by path
    pub fn files(&self) -> Result<Vec<FileRow>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT real_path, stored_name FROM files ORDER BY real_path ASC")
            .map_err(failure("Query"))?;
        let rows = stmt
            .query_map([], |row| FileRow::from_row(row))
            .map_err(failure("Query"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(failure("Query"))?;
        Ok(rows)
    }
}

impl Catalog for SqliteCatalog {
    fn level_count(&self) -> Result<i64> {
        self.count("LevelCount", "levels")
    }

    fn pack_count(&self) -> Result<i64> {
        self.count("PackCount", "packs")
    }

    fn add_level(&self, level: &CatalogLevel) -> Result<()> {
        let body = serde_json::to_string(level)?;
        self.insert_record(
            "AddLevel",
            "levels",
            level.id,
            &level.identifier,
            level.added_date,
            &body,
        )
    }

    fn add_pack(&self, pack: &CatalogPack) -> Result<()> {
        let body = serde_json::to_string(pack)?;
        self.insert_record(
            "AddPack",
            "packs",
            pack.id,
            &pack.identifier,
            pack.added_date,
            &body,
        )
    }

    fn add_file(&self, file: &CatalogFile) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO files (real_path, stored_name) VALUES (?1, ?2)",
            params![file.key.as_str(), file.stored_name.as_str()],
        )
        .map_err(failure("AddFile"))?;
        Ok(())
    }
}
