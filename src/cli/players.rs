//! Players command implementation

use anyhow::Result;

use crate::skill::Skill;
use crate::store::{PlayerOverview, SkillReader};

/// Column headings for the skill grid, in `Skill::ALL` order.
const SKILL_COLUMNS: [&str; Skill::COUNT] = [
    "Att", "Def", "Str", "HP", "Rng", "Pra", "Mag", "Coo", "WC", "Fle", "Fis", "FM", "Cra",
    "Smi", "Min", "Her", "Agi", "Thi", "Sla", "Far", "RC", "Hun", "Con", "Sum", "Dun",
];

pub fn run(reader: &SkillReader, json: bool, with_skills: bool) -> Result<()> {
    if with_skills {
        return overview(reader, json);
    }

    let mut players = reader.get_all_players()?;
    players.sort_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()));

    if json {
        println!("{}", serde_json::to_string_pretty(&players)?);
        return Ok(());
    }

    if players.is_empty() {
        println!("No players found. Run 'skilltrack scrape' first.");
        return Ok(());
    }

    println!("{:<38} {:<14} {}", "ID", "Created", "Username");
    println!("{}", "-".repeat(70));

    for player in players {
        println!(
            "{:<38} {:<14} {}",
            player.id,
            player.created_on.format("%Y-%m-%d"),
            player.username
        );
    }

    Ok(())
}

/// Every player's latest level in every skill, one row per player.
fn overview(reader: &SkillReader, json: bool) -> Result<()> {
    let overviews = reader.get_player_overviews()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overviews)?);
        return Ok(());
    }

    if overviews.is_empty() {
        println!("No players found. Run 'skilltrack scrape' first.");
        return Ok(());
    }

    let header: String = SKILL_COLUMNS.iter().map(|c| format!("{c:>4}")).collect();
    println!("{:<20}{} {:>6}", "Username", header, "Total");
    println!("{}", "-".repeat(20 + 4 * Skill::COUNT + 7));

    for player in &overviews {
        println!(
            "{:<20}{} {:>6}",
            player.player.username,
            skill_cells(player),
            player.total_level
        );
    }

    Ok(())
}

fn skill_cells(player: &PlayerOverview) -> String {
    Skill::ALL
        .iter()
        .map(|skill| match player.skills.get(skill) {
            Some(record) => format!("{:>4}", record.level),
            None => format!("{:>4}", "-"),
        })
        .collect()
}
