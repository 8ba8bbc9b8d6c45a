//! Skill catalog
//!
//! The save format stores experience and levels as parallel lists whose
//! positions follow `Skill::ALL`. The order is part of the format and must
//! never change.

mod experience;

pub use experience::{level_for, EXPERIENCE_TABLE, MAX_LEVEL, MIN_LEVEL};

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Skill {
    Attack,
    Defence,
    Strength,
    Constitution,
    Ranged,
    Prayer,
    Magic,
    Cooking,
    Woodcutting,
    Fletching,
    Fishing,
    Firemaking,
    Crafting,
    Smithing,
    Mining,
    Herblore,
    Agility,
    Thieving,
    Slayer,
    Farming,
    Runecrafting,
    Hunter,
    Construction,
    Summoning,
    Dungeoneering,
}

impl Skill {
    /// Every skill, in save-file order.
    pub const ALL: [Skill; 25] = [
        Skill::Attack,
        Skill::Defence,
        Skill::Strength,
        Skill::Constitution,
        Skill::Ranged,
        Skill::Prayer,
        Skill::Magic,
        Skill::Cooking,
        Skill::Woodcutting,
        Skill::Fletching,
        Skill::Fishing,
        Skill::Firemaking,
        Skill::Crafting,
        Skill::Smithing,
        Skill::Mining,
        Skill::Herblore,
        Skill::Agility,
        Skill::Thieving,
        Skill::Slayer,
        Skill::Farming,
        Skill::Runecrafting,
        Skill::Hunter,
        Skill::Construction,
        Skill::Summoning,
        Skill::Dungeoneering,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Attack => "Attack",
            Skill::Defence => "Defence",
            Skill::Strength => "Strength",
            Skill::Constitution => "Constitution",
            Skill::Ranged => "Ranged",
            Skill::Prayer => "Prayer",
            Skill::Magic => "Magic",
            Skill::Cooking => "Cooking",
            Skill::Woodcutting => "Woodcutting",
            Skill::Fletching => "Fletching",
            Skill::Fishing => "Fishing",
            Skill::Firemaking => "Firemaking",
            Skill::Crafting => "Crafting",
            Skill::Smithing => "Smithing",
            Skill::Mining => "Mining",
            Skill::Herblore => "Herblore",
            Skill::Agility => "Agility",
            Skill::Thieving => "Thieving",
            Skill::Slayer => "Slayer",
            Skill::Farming => "Farming",
            Skill::Runecrafting => "Runecrafting",
            Skill::Hunter => "Hunter",
            Skill::Construction => "Construction",
            Skill::Summoning => "Summoning",
            Skill::Dungeoneering => "Dungeoneering",
        }
    }

    /// Whether the save's level for this skill is unreliable and has to be
    /// derived from experience instead.
    pub fn is_derived(&self) -> bool {
        matches!(self, Skill::Constitution)
    }
}

/// One skill's level and canonical experience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillRecord {
    pub level: u8,
    pub experience: f64,
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = Error;

    /// Case-insensitive lookup by display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Skill::ALL
            .iter()
            .copied()
            .find(|skill| skill.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidSkill(s.to_string()))
    }
}

impl Serialize for Skill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
