//! SQLite schema definition
//!
//! - `players.username` is unique so concurrent first sightings of the same
//!   account converge on one row.
//! - One snapshot per (player, skill, day); re-recording a day overwrites it.
//! - Level and experience bounds are enforced here, so a bad value fails the
//!   whole snapshot transaction.

pub const SCHEMA: &str = r#"
-- ============================================
-- PLAYERS
-- ============================================

CREATE TABLE IF NOT EXISTS players (
    id TEXT PRIMARY KEY,                   -- UUID, assigned once
    username TEXT NOT NULL UNIQUE,         -- accountName from the save
    created_on TEXT NOT NULL               -- RFC 3339, from the save's creation time
);

-- ============================================
-- SKILL SNAPSHOTS
-- ============================================

CREATE TABLE IF NOT EXISTS skill_snapshots (
    player_id TEXT NOT NULL,
    skill TEXT NOT NULL,                   -- 'Attack', 'Defence', ...
    day TEXT NOT NULL,                     -- YYYY-MM-DD (UTC)
    level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 99),
    experience REAL NOT NULL CHECK (experience >= 0),
    PRIMARY KEY (player_id, skill, day),
    FOREIGN KEY(player_id) REFERENCES players(id)
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_snapshots_skill_day ON skill_snapshots(skill, day);
"#;
