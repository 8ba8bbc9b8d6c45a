use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use skilltrack::cli::{highscores, players, scrape, skills, watch};
use skilltrack::config::Config;
use skilltrack::scrape::Scraper;
use skilltrack::source::{PlayerSource, SaveDirectory};
use skilltrack::store::{SkillReader, SkillStore};

#[derive(Parser)]
#[command(name = "skilltrack")]
#[command(about = "Skill snapshot ingestion and highscores for Void game server saves")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "skilltrack.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape all player saves once
    Scrape,

    /// Scrape on the configured interval until interrupted
    Watch,

    /// List tracked players
    Players {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Include every player's latest skill levels
        #[arg(long)]
        skills: bool,
    },

    /// Show a player's latest skills
    Skills {
        /// Account name
        username: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the highscore table for a skill
    Highscores {
        /// Skill name (Attack, Defence, ...)
        skill: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).context("unable to load configuration")?;
    skilltrack::logging::init(&config.logging.level);
    tracing::debug!("Configuration loaded");

    match cli.command {
        Commands::Scrape => {
            let scraper = build_scraper(&config)?;
            scrape::run(&scraper).await?;
        }
        Commands::Watch => {
            let scraper = build_scraper(&config)?;
            watch::run(&scraper, config.poll_interval()).await?;
        }
        Commands::Players { json, skills: with_skills } => {
            players::run(&open_reader(&config)?, json, with_skills)?;
        }
        Commands::Skills { username, json } => {
            skills::run(&open_reader(&config)?, &username, json)?;
        }
        Commands::Highscores { skill, json } => {
            highscores::run(&open_reader(&config)?, &skill, json)?;
        }
    }

    Ok(())
}

fn build_scraper(config: &Config) -> Result<Scraper> {
    let db_path = config.database_path();
    let store = SkillStore::open(&db_path)
        .with_context(|| format!("unable to open database at {}", db_path.display()))?;
    let source = SaveDirectory::new(config.data_dir());

    if !source.is_available() {
        tracing::warn!(path = %source.base_path().display(), "Save directory does not exist yet");
    }

    Ok(Scraper::new(Arc::new(source), Arc::new(store)))
}

fn open_reader(config: &Config) -> Result<SkillReader> {
    let db_path = config.database_path();
    SkillReader::open(&db_path)
        .with_context(|| format!("unable to open database at {}", db_path.display()))
}
