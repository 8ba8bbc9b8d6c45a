//! Highscores command implementation

use anyhow::Result;

use crate::skill::Skill;
use crate::store::SkillReader;

pub fn run(reader: &SkillReader, skill: &str, json: bool) -> Result<()> {
    let entries = reader.get_highscores(skill)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    // Already validated by the query; used for display casing.
    let title = skill.parse::<Skill>()?;
    println!("{} highscores\n", title);

    if entries.is_empty() {
        println!("No snapshots recorded for {} yet.", title);
        return Ok(());
    }

    println!("{:<6} {:<20} {:>6} {:>18}", "Rank", "Username", "Level", "Experience");
    println!("{}", "-".repeat(53));

    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:<6} {:<20} {:>6} {:>18.2}",
            rank + 1,
            entry.username,
            entry.level,
            entry.experience
        );
    }

    Ok(())
}
