//! Read-only queries over recorded snapshots

use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{decode_timestamp, find_player, lock, Player, BUSY_TIMEOUT};
use crate::error::{Error, Result};
use crate::skill::{Skill, SkillRecord};

/// Latest recorded value of each of a player's skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSkills {
    pub skills: BTreeMap<Skill, SkillRecord>,
}

impl PlayerSkills {
    pub fn get(&self, skill: Skill) -> Option<&SkillRecord> {
        self.skills.get(&skill)
    }

    pub fn total_level(&self) -> u32 {
        self.skills.values().map(|s| u32::from(s.level)).sum()
    }

    pub fn total_experience(&self) -> f64 {
        self.skills.values().map(|s| s.experience).sum()
    }
}

/// One row of a skill's highscore table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighscoreEntry {
    pub player_id: String,
    pub username: String,
    pub level: u8,
    pub experience: f64,
}

/// A player together with the latest value of each of their skills.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOverview {
    #[serde(flatten)]
    pub player: Player,
    pub skills: BTreeMap<Skill, SkillRecord>,
    pub total_level: u32,
    pub total_experience: f64,
}

/// Query layer handed to presentation code. Exposes no writes.
#[derive(Clone)]
pub struct SkillReader {
    conn: Arc<Mutex<Connection>>,
}

impl SkillReader {
    /// Open an existing database read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self::from_shared(Arc::new(Mutex::new(conn))))
    }

    pub(super) fn from_shared(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        lock(&self.conn)
    }

    /// All known players, unordered.
    pub fn get_all_players(&self) -> Result<Vec<Player>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, username, created_on FROM players")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, username, created_on)| {
                Ok(Player {
                    id,
                    username,
                    created_on: decode_timestamp(&created_on)?,
                })
            })
            .collect()
    }

    /// Every player with their latest skills, ordered by username.
    pub fn get_player_overviews(&self) -> Result<Vec<PlayerOverview>> {
        let mut players = self.get_all_players()?;
        players.sort_by(|a, b| a.username.cmp(&b.username));

        players
            .into_iter()
            .map(|player| {
                let skills = self.get_player_skills(&player.username)?;
                Ok(PlayerOverview {
                    total_level: skills.total_level(),
                    total_experience: skills.total_experience(),
                    skills: skills.skills,
                    player,
                })
            })
            .collect()
    }

    pub fn get_player(&self, username: &str) -> Result<Player> {
        find_player(&self.lock(), username)?
            .ok_or_else(|| Error::NotFound(format!("player '{username}'")))
    }

    /// Latest value of every skill recorded for `username`. Each skill is
    /// resolved to its own most recent day.
    pub fn get_player_skills(&self, username: &str) -> Result<PlayerSkills> {
        let conn = self.lock();
        let player = find_player(&conn, username)?
            .ok_or_else(|| Error::NotFound(format!("player '{username}'")))?;

        let mut stmt = conn.prepare(
            r#"SELECT s.skill, s.level, s.experience
               FROM skill_snapshots s
               WHERE s.player_id = ?1
                 AND s.day = (SELECT MAX(latest.day) FROM skill_snapshots latest
                              WHERE latest.player_id = s.player_id
                                AND latest.skill = s.skill)"#,
        )?;

        let rows = stmt
            .query_map(params![player.id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u8>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let skills = rows
            .into_iter()
            .map(|(name, level, experience)| {
                Ok((decode_skill(&name)?, SkillRecord { level, experience }))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(PlayerSkills { skills })
    }

    /// Every player's latest snapshot of `skill`, highest experience first.
    /// Equal experience ranks the higher level first, then by username.
    pub fn get_highscores(&self, skill: &str) -> Result<Vec<HighscoreEntry>> {
        let skill: Skill = skill.parse()?;

        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"SELECT p.id, p.username, s.level, s.experience
               FROM skill_snapshots s
               JOIN players p ON p.id = s.player_id
               WHERE s.skill = ?1
                 AND s.day = (SELECT MAX(latest.day) FROM skill_snapshots latest
                              WHERE latest.player_id = s.player_id
                                AND latest.skill = s.skill)
               ORDER BY s.experience DESC, s.level DESC, p.username ASC"#,
        )?;

        let rows = stmt
            .query_map(params![skill.as_str()], |row| {
                Ok(HighscoreEntry {
                    player_id: row.get(0)?,
                    username: row.get(1)?,
                    level: row.get(2)?,
                    experience: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn decode_skill(name: &str) -> Result<Skill> {
    name.parse()
        .map_err(|_| Error::Corrupt(format!("unknown skill '{name}'")))
}
