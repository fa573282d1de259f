//! QuizBoard console game.
//!
//! A line-oriented driver over the quiz board engine, suitable for playing in
//! a terminal or scripting from another process:
//!
//! ```bash
//! cargo run -p quizboard -- --players Ada,Alan --tier intermediate
//! ```

mod headless;

use anyhow::{Context, Result};
use clap::Parser;
use quizboard_core::{GameConfig, Tier};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// QuizBoard - roll, land, answer, race to the winning score
#[derive(Parser, Debug)]
#[command(name = "quizboard")]
#[command(about = "Turn-based quiz board game", long_about = None)]
#[command(version)]
pub struct Args {
    /// Player names, comma separated
    #[arg(short, long, value_delimiter = ',', default_value = "Player 1,Player 2")]
    pub players: Vec<String>,

    /// Difficulty tier (beginner, intermediate, expert)
    #[arg(short, long)]
    pub tier: Option<Tier>,

    /// Score needed to win
    #[arg(long)]
    pub winning_score: Option<u32>,

    /// Seed for dice and question draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Save file; the game resumes from it on start
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Custom question bank (JSON)
    #[arg(long)]
    pub bank: Option<PathBuf>,

    /// Longest chain of extra rolls from sixes
    #[arg(long)]
    pub max_extra_rolls: Option<u32>,

    /// Skip animation and feedback delays
    #[arg(long)]
    pub fast: bool,

    /// Ignore any saved game and start a new one
    #[arg(long)]
    pub fresh: bool,
}

impl Args {
    /// Environment defaults with command-line flags on top.
    fn config(&self) -> Result<GameConfig> {
        let mut config = GameConfig::from_env().context("Invalid QUIZBOARD_* environment")?;
        if let Some(tier) = self.tier {
            config = config.with_tier(tier);
        }
        if let Some(score) = self.winning_score {
            config = config.with_winning_score(score);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(path) = &self.save {
            config = config.with_save_path(path);
        }
        if let Some(path) = &self.bank {
            config = config.with_bank_path(path);
        }
        if let Some(max) = self.max_extra_rolls {
            config = config.with_max_extra_rolls(max);
        }
        if self.fast {
            config = config.with_pacing(0, 0, 0);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr so stdout stays a clean transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.config()?;
    info!(tier = %config.tier, winning_score = config.winning_score, "Starting QuizBoard");

    headless::run(config, &args.players, args.fresh).await
}
