//! SQLite-backed dedup store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{DedupStats, DedupStore, StoreError};
use crate::stream::Resolution;

/// SQLite-backed dedup store.
///
/// A single connection serializes all access, which gives read-your-writes.
/// Single marks run in autocommit mode and a submission record runs in one
/// transaction. With `synchronous = FULL` a mark is on disk when the call
/// returns.
pub struct SqliteDedupStore {
    conn: Mutex<Connection>,
}

impl SqliteDedupStore {
    /// Open (or create) the database file and ensure the schema.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;

            CREATE TABLE IF NOT EXISTS attempted_hashes (
                info_hash TEXT PRIMARY KEY,
                recorded_at TEXT
            );

            CREATE TABLE IF NOT EXISTS cached_quality (
                imdb_id TEXT NOT NULL,
                resolution INTEGER NOT NULL,
                season INTEGER,
                recorded_at TEXT
            );
            "#,
        )
        .map_err(db_err)?;

        // Migration: databases created before timestamps were tracked
        let _ = conn.execute("ALTER TABLE attempted_hashes ADD COLUMN recorded_at TEXT", []);
        let _ = conn.execute("ALTER TABLE cached_quality ADD COLUMN recorded_at TEXT", []);

        // NULL seasons are distinct under a plain primary key, so movie rows
        // are keyed through IFNULL. Older files may hold duplicate movie rows.
        conn.execute_batch(
            r#"
            DELETE FROM cached_quality
            WHERE rowid NOT IN (
                SELECT MIN(rowid) FROM cached_quality
                GROUP BY imdb_id, resolution, IFNULL(season, -1)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_cached_quality_key
                ON cached_quality(imdb_id, resolution, IFNULL(season, -1));
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl DedupStore for SqliteDedupStore {
    fn has_attempted(&self, info_hash: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM attempted_hashes WHERE info_hash = ?1",
                params![info_hash],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn mark_attempted(&self, info_hash: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO attempted_hashes (info_hash, recorded_at) VALUES (?1, ?2)",
            params![info_hash, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn has_cached_quality(
        &self,
        imdb_id: &str,
        resolution: Resolution,
        season: Option<u32>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        // `IS` compares NULL to NULL as equal
        let found = conn
            .query_row(
                "SELECT 1 FROM cached_quality WHERE imdb_id = ?1 AND resolution = ?2 AND season IS ?3",
                params![imdb_id, resolution.height(), season],
                |_| Ok(()),
            )
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    fn mark_cached_quality(
        &self,
        imdb_id: &str,
        resolution: Resolution,
        season: Option<u32>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO cached_quality (imdb_id, resolution, season, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![imdb_id, resolution.height(), season, Utc::now().to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn record_submission(
        &self,
        info_hash: &str,
        imdb_id: &str,
        resolution: Resolution,
        seasons: &[Option<u32>],
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT OR IGNORE INTO attempted_hashes (info_hash, recorded_at) VALUES (?1, ?2)",
            params![info_hash, now],
        )
        .map_err(db_err)?;
        for season in seasons {
            tx.execute(
                "INSERT OR IGNORE INTO cached_quality (imdb_id, resolution, season, recorded_at) VALUES (?1, ?2, ?3, ?4)",
                params![imdb_id, resolution.height(), season, now],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)
    }

    fn stats(&self) -> Result<DedupStats, StoreError> {
        let conn = self.lock()?;
        let attempted: i64 = conn
            .query_row("SELECT COUNT(*) FROM attempted_hashes", [], |row| row.get(0))
            .map_err(db_err)?;
        let cached: i64 = conn
            .query_row("SELECT COUNT(*) FROM cached_quality", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(DedupStats {
            attempted_hashes: attempted as u64,
            cached_qualities: cached as u64,
        })
    }
}
