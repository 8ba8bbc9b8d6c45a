//! Void save-file source
//!
//! Reads player saves written by the Void game server.
//! Data format: one TOML file per player in the server's save directory:
//!   accountName = "Zezima"
//!   experience = [...]   # one entry per skill, experience x 10
//!   levels = [...]       # one entry per skill
//!   [variables]
//!   creation = 1700000000000   # epoch millis
//!
//! Saves carry many more keys than these; they are ignored.

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{NormalizedPlayer, PlayerBatch, PlayerSource};
use crate::error::{Error, Result};
use crate::skill::{level_for, Skill, MAX_LEVEL, MIN_LEVEL};

/// Saves store experience at ten times its displayed value.
const EXPERIENCE_SCALE: f64 = 10.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRecord {
    account_name: String,
    experience: Vec<i64>,
    levels: Vec<i64>,
    variables: SaveVariables,
}

#[derive(Debug, Deserialize)]
struct SaveVariables {
    creation: i64,
}

/// Decode one save file's contents. `path` is only used for error reporting.
pub fn parse_save(path: &Path, contents: &str) -> Result<NormalizedPlayer> {
    let save: SaveRecord =
        toml::from_str(contents).map_err(|e| Error::parse(path, e.message().to_string()))?;

    if save.account_name.trim().is_empty() {
        return Err(Error::parse(path, "empty accountName"));
    }

    for (field, len) in [
        ("experience", save.experience.len()),
        ("levels", save.levels.len()),
    ] {
        if len != Skill::COUNT {
            return Err(Error::parse(
                path,
                format!("{field} has {len} entries, expected {}", Skill::COUNT),
            ));
        }
    }

    let mut experience = BTreeMap::new();
    let mut levels = BTreeMap::new();

    for (index, skill) in Skill::ALL.into_iter().enumerate() {
        let skill_experience = save.experience[index] as f64 / EXPERIENCE_SCALE;

        let level = if skill.is_derived() {
            level_for(skill_experience)
        } else {
            u8::try_from(save.levels[index])
                .ok()
                .filter(|level| (MIN_LEVEL..=MAX_LEVEL).contains(level))
                .ok_or_else(|| {
                    Error::parse(
                        path,
                        format!("{skill} level {} out of range", save.levels[index]),
                    )
                })?
        };

        experience.insert(skill, skill_experience);
        levels.insert(skill, level);
    }

    let created_on = Utc
        .timestamp_millis_opt(save.variables.creation)
        .single()
        .ok_or_else(|| {
            Error::parse(
                path,
                format!("creation timestamp {} out of range", save.variables.creation),
            )
        })?;

    Ok(NormalizedPlayer {
        account_name: save.account_name,
        experience,
        levels,
        created_on,
    })
}

/// Directory of `*.toml` player saves.
pub struct SaveDirectory {
    base_path: PathBuf,
}

impl SaveDirectory {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn unavailable(&self, source: std::io::Error) -> Error {
        Error::SourceUnavailable {
            path: self.base_path.clone(),
            source,
        }
    }

    /// Paths of every save file, sorted so runs process players in a stable
    /// order.
    fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut saves = vec![];

        for entry in fs::read_dir(&self.base_path).map_err(|e| self.unavailable(e))? {
            let path = entry.map_err(|e| self.unavailable(e))?.path();
            if path.is_file() && path.extension().map(|e| e == "toml").unwrap_or(false) {
                saves.push(path);
            }
        }

        saves.sort();
        Ok(saves)
    }
}

impl PlayerSource for SaveDirectory {
    fn id(&self) -> &str {
        "void:saves"
    }

    fn is_available(&self) -> bool {
        self.base_path.is_dir()
    }

    fn list_all_players(&self) -> Result<PlayerBatch> {
        let saves = self.discover()?;
        debug!(count = saves.len(), path = %self.base_path.display(), "Discovered save files");

        let batch = saves.iter().fold(PlayerBatch::default(), |mut batch, path| {
            let record = fs::read_to_string(path)
                .map_err(|e| Error::parse(path, format!("unreadable: {e}")))
                .and_then(|contents| parse_save(path, &contents));
            batch.push(record);
            batch
        });

        Ok(batch)
    }
}
