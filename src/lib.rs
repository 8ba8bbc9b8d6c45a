pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scrape;
pub mod skill;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use scrape::{run_scheduled, ScrapeReport, Scraper};
pub use skill::{level_for, Skill, SkillRecord};
pub use source::{NormalizedPlayer, PlayerBatch, PlayerSource, SaveDirectory};
pub use store::{HighscoreEntry, Player, PlayerOverview, PlayerSkills, SkillReader, SkillStore};
