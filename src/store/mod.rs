//! Skill storage with SQLite
//!
//! `SkillStore` is the write side: identity resolution and snapshot
//! recording, each an atomic statement or transaction. Reads go through
//! `SkillReader`, which has no write operations.

mod queries;
mod schema;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::skill::{Skill, SkillRecord};

pub use queries::{HighscoreEntry, PlayerOverview, PlayerSkills, SkillReader};
pub use schema::SCHEMA;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A tracked player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub created_on: DateTime<Utc>,
}

pub struct SkillStore {
    conn: Arc<Mutex<Connection>>,
}

impl SkillStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Read-only view sharing this store's connection.
    pub fn reader(&self) -> SkillReader {
        SkillReader::from_shared(Arc::clone(&self.conn))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        lock(&self.conn)
    }

    /// Hold the connection; every other store call blocks until the guard
    /// is dropped.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> MutexGuard<'_, Connection> {
        self.lock()
    }

    // ============================================
    // PLAYERS
    // ============================================

    /// Resolve an account name to its player, creating the player on first
    /// sight.
    ///
    /// The insert is a no-op when the username already exists, so concurrent
    /// callers all read back the same row. `created_on` is only used when the
    /// row is created.
    pub fn get_or_create_player(
        &self,
        username: &str,
        created_on: DateTime<Utc>,
    ) -> Result<Player> {
        let conn = self.lock();

        conn.execute(
            "INSERT INTO players (id, username, created_on) VALUES (?1, ?2, ?3)
             ON CONFLICT(username) DO NOTHING",
            params![
                Uuid::new_v4().to_string(),
                username,
                encode_timestamp(created_on),
            ],
        )?;

        find_player(&conn, username)?.ok_or_else(|| Error::NotFound(username.to_string()))
    }

    pub fn player_count(&self) -> Result<i64> {
        let count = self
            .lock()
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
        Ok(count)
    }

    // ============================================
    // SNAPSHOTS
    // ============================================

    /// Persist one day's snapshot of every given skill, all or nothing.
    ///
    /// Existing rows for the same (player, skill, day) are overwritten.
    pub fn record_snapshots(
        &self,
        player_id: &str,
        day: NaiveDate,
        skills: &BTreeMap<Skill, SkillRecord>,
    ) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let day = encode_day(day);

        {
            let mut stmt = tx.prepare(
                "INSERT INTO skill_snapshots (player_id, skill, day, level, experience)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(player_id, skill, day) DO UPDATE SET
                     level = excluded.level,
                     experience = excluded.experience",
            )?;

            for (skill, record) in skills {
                stmt.execute(params![
                    player_id,
                    skill.as_str(),
                    day,
                    record.level,
                    record.experience,
                ])?;
            }
        }

        // Dropping an uncommitted transaction rolls it back.
        tx.commit()?;
        Ok(())
    }

    pub fn snapshot_count(&self, player_id: &str, day: NaiveDate) -> Result<i64> {
        let count = self.lock().query_row(
            "SELECT COUNT(*) FROM skill_snapshots WHERE player_id = ?1 AND day = ?2",
            params![player_id, encode_day(day)],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ============================================
// SHARED HELPERS
// ============================================

/// Every write is a single statement or transaction, so a connection left
/// behind by a panicking holder is still consistent.
fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn encode_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Corrupt(format!("timestamp '{raw}': {e}")))
}

fn find_player(conn: &Connection, username: &str) -> Result<Option<Player>> {
    let row = conn.query_row(
        "SELECT id, username, created_on FROM players WHERE username = ?",
        params![username],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );

    match row {
        Ok((id, username, created_on)) => Ok(Some(Player {
            id,
            username,
            created_on: decode_timestamp(&created_on)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
