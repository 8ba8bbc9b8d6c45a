//! Skills command implementation

use anyhow::Result;

use crate::skill::Skill;
use crate::store::SkillReader;

pub fn run(reader: &SkillReader, username: &str, json: bool) -> Result<()> {
    let player = reader.get_player(username)?;
    let skills = reader.get_player_skills(&player.username)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(50));
    println!("Player: {}", player.username);
    println!("Created: {}", player.created_on.format("%Y-%m-%d"));
    println!("{}", "=".repeat(50));

    if skills.skills.is_empty() {
        println!("\nNo skills recorded yet.");
        return Ok(());
    }

    println!("{:<16} {:>6} {:>18}", "Skill", "Level", "Experience");
    for skill in Skill::ALL {
        if let Some(record) = skills.get(skill) {
            println!(
                "{:<16} {:>6} {:>18.2}",
                skill.as_str(),
                record.level,
                record.experience
            );
        }
    }

    println!("{}", "-".repeat(42));
    println!(
        "{:<16} {:>6} {:>18.2}",
        "Total",
        skills.total_level(),
        skills.total_experience()
    );

    Ok(())
}
