//! Player sources
//!
//! A source enumerates the game server's player records and normalizes each
//! one. Records that fail to parse are reported alongside the batch rather
//! than failing the whole listing.

mod save_file;

pub use save_file::{parse_save, SaveDirectory};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::skill::{Skill, SkillRecord};

/// One player as read from the game server, in canonical units.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlayer {
    pub account_name: String,
    pub experience: BTreeMap<Skill, f64>,
    pub levels: BTreeMap<Skill, u8>,
    pub created_on: DateTime<Utc>,
}

impl NormalizedPlayer {
    /// Level and experience paired per skill. Skills missing either half are
    /// left out.
    pub fn skills(&self) -> BTreeMap<Skill, SkillRecord> {
        self.levels
            .iter()
            .filter_map(|(skill, &level)| {
                self.experience
                    .get(skill)
                    .map(|&experience| (*skill, SkillRecord { level, experience }))
            })
            .collect()
    }
}

/// Result of listing a source: the players that parsed, plus a parse error
/// for every record that didn't.
#[derive(Debug, Default)]
pub struct PlayerBatch {
    pub players: Vec<NormalizedPlayer>,
    pub skipped: Vec<Error>,
}

impl PlayerBatch {
    pub fn push(&mut self, record: Result<NormalizedPlayer>) {
        match record {
            Ok(player) => self.players.push(player),
            Err(e) => self.skipped.push(e),
        }
    }
}

/// Player source trait
pub trait PlayerSource: Send + Sync {
    /// Human-readable identifier used in logs
    fn id(&self) -> &str;

    /// Check if the backing location exists
    fn is_available(&self) -> bool;

    /// Enumerate and parse every available player record.
    ///
    /// Only fails with `Error::SourceUnavailable` when the enumeration itself
    /// fails; individual bad records end up in `PlayerBatch::skipped`.
    fn list_all_players(&self) -> Result<PlayerBatch>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::TimeZone;

    /// Player with every skill at the same level and experience.
    pub fn player(name: &str, level: u8, experience: f64) -> NormalizedPlayer {
        NormalizedPlayer {
            account_name: name.to_string(),
            experience: Skill::ALL.iter().map(|&s| (s, experience)).collect(),
            levels: Skill::ALL.iter().map(|&s| (s, level)).collect(),
            created_on: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    /// In-memory source returning a fixed listing.
    pub struct StaticSource {
        players: Option<Vec<NormalizedPlayer>>,
    }

    impl StaticSource {
        pub fn new(players: Vec<NormalizedPlayer>) -> Self {
            Self {
                players: Some(players),
            }
        }

        pub fn unavailable() -> Self {
            Self { players: None }
        }
    }

    impl PlayerSource for StaticSource {
        fn id(&self) -> &str {
            "static"
        }

        fn is_available(&self) -> bool {
            self.players.is_some()
        }

        fn list_all_players(&self) -> Result<PlayerBatch> {
            match &self.players {
                Some(players) => Ok(PlayerBatch {
                    players: players.clone(),
                    skipped: vec![],
                }),
                None => Err(Error::SourceUnavailable {
                    path: "static".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                }),
            }
        }
    }
}
