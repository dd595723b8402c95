use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::store::ScoreStore;

/// One persisted best result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRecord {
    pub key: String,
    pub value: f64,
    pub updated_at: DateTime<Local>,
}

/// SQLite-backed best-record store
#[derive(Debug)]
pub struct RecordsDb {
    conn: Connection,
}

impl RecordsDb {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open the database under the user's state directory
    pub fn open_default() -> Result<Self, StoreError> {
        let path = Self::default_path();
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    pub fn default_path() -> PathBuf {
        AppDirs::db_path().unwrap_or_else(|| PathBuf::from("lockbuster_records.db"))
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS best_records (
                key TEXT PRIMARY KEY,
                value REAL NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(RecordsDb { conn })
    }

    /// All stored records ordered by key
    pub fn all_records(&self) -> Result<Vec<BestRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM best_records ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            let updated_at: String = row.get(2)?;
            let updated_at = DateTime::parse_from_rfc3339(&updated_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "updated_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(BestRecord {
                key: row.get(0)?,
                value: row.get(1)?,
                updated_at,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Delete every record, returning how many were removed
    pub fn clear(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM best_records", [])?)
    }

    /// Write all records as CSV with a header row
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, StoreError> {
        let records = self.all_records()?;
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(["key", "value", "updated_at"])
            .map_err(|e| StoreError::Io(e.to_string()))?;
        for record in &records {
            let value = record.value.to_string();
            let updated_at = record.updated_at.to_rfc3339();
            wtr.write_record([record.key.as_str(), value.as_str(), updated_at.as_str()])
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        wtr.flush()?;

        Ok(records.len())
    }
}

impl ScoreStore for RecordsDb {
    fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM best_records WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO best_records (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
