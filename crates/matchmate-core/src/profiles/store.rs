//! SQLite-backed profile store.
//!
//! Durable keyed storage for profile entities. The query surface is
//! exactly what the sync engine consumes: fetch-all, fetch-by-status,
//! fetch-by-id, single upsert, and an atomic batch upsert. No delete
//! operation exists; profiles persist indefinitely once fetched.
//!
//! Thread-safe via an internal mutex on the connection.

use crate::error::{MatchError, Result};
use crate::profiles::types::{Profile, ProfileStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// SQLite-backed profile store.
pub struct ProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProfileStore {
    /// Open (or create) a store at the specified database path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MatchError::io_with_path(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(db_path).map_err(|e| MatchError::Database {
            message: format!("Failed to open profile database: {}", e),
            source: Some(e),
        })?;

        // WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| MatchError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store (used by tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| MatchError::Database {
            message: format!("Failed to open in-memory database: {}", e),
            source: Some(e),
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                location_label TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                image BLOB,
                status TEXT NOT NULL,
                gender TEXT NOT NULL,
                nationality TEXT NOT NULL,
                synced_with_server INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_profiles_status
                ON profiles(status);
            "#,
        )
        .map_err(|e| MatchError::Database {
            message: format!("Failed to initialize profile schema: {}", e),
            source: Some(e),
        })?;
        Ok(())
    }

    /// Fetch all profiles, oldest first.
    pub fn fetch_all(&self) -> Result<Vec<Profile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, display_name, age, location_label, email, phone, image,
                    status, gender, nationality, synced_with_server, created_at
             FROM profiles ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], row_to_profile)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Fetch profiles with the given status, oldest first.
    pub fn fetch_by_status(&self, status: ProfileStatus) -> Result<Vec<Profile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, display_name, age, location_label, email, phone, image,
                    status, gender, nationality, synced_with_server, created_at
             FROM profiles WHERE status = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![status.as_str()], row_to_profile)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Fetch a single profile by its stable remote identifier.
    pub fn fetch_by_id(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, display_name, age, location_label, email, phone, image,
                    status, gender, nationality, synced_with_server, created_at
             FROM profiles WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row(params![id], row_to_profile)
            .optional()?)
    }

    /// Upsert a single profile.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        let conn = self.lock()?;
        upsert(&conn, profile)?;
        Ok(())
    }

    /// Upsert a batch of profiles inside one transaction.
    ///
    /// The whole batch lands or none of it does; a consumer reading the
    /// store never observes a partially-saved sync cycle.
    pub fn upsert_all(&self, profiles: &[Profile]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for profile in profiles {
            upsert(&tx, profile)?;
        }
        tx.commit()?;
        debug!("Persisted batch of {} profiles", profiles.len());
        Ok(())
    }

    /// Count profiles whose local changes have not been synced upstream.
    pub fn count_unsynced(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE synced_with_server = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| MatchError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }
}

fn upsert(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, display_name, age, location_label, email, phone,
                               image, status, gender, nationality, synced_with_server, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             display_name = excluded.display_name,
             age = excluded.age,
             location_label = excluded.location_label,
             email = excluded.email,
             phone = excluded.phone,
             image = excluded.image,
             status = excluded.status,
             gender = excluded.gender,
             nationality = excluded.nationality,
             synced_with_server = excluded.synced_with_server",
        params![
            profile.id,
            profile.display_name,
            profile.age,
            profile.location_label,
            profile.email,
            profile.phone,
            profile.image_bytes,
            profile.status.as_str(),
            profile.gender,
            profile.nationality,
            profile.synced_with_server as i64,
            profile.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let status_str: String = row.get(7)?;
    let status = ProfileStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown profile status: {}", status_str).into(),
        )
    })?;

    let created_str: String = row.get(11)?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(Profile {
        id: row.get(0)?,
        display_name: row.get(1)?,
        age: row.get(2)?,
        location_label: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        image_bytes: row.get(6)?,
        status,
        gender: row.get(8)?,
        nationality: row.get(9)?,
        synced_with_server: row.get::<_, i64>(10)? != 0,
        created_at,
    })
}
