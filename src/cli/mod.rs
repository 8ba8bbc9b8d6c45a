//! Command implementations

pub mod highscores;
pub mod players;
pub mod scrape;
pub mod skills;
pub mod watch;
