//! Command-line host for the rules engine: replays recorded games and runs bot games.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use catan_rules::BotDifficulty;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod script;

use script::{Outcome, ReplayScript, Simulation, Summary};

#[derive(Parser)]
#[command(name = "catan-replay")]
#[command(about = "Replay and simulate games", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a recorded script and print the final standings
    Replay {
        /// JSON file with `config` and `actions`
        file: PathBuf,

        /// Print the final state as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Let bots play a game from a seed
    Simulate {
        #[arg(long, default_value_t = 1)]
        seed: u32,

        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=4))]
        players: u8,

        /// Use the Cities & Knights rules
        #[arg(long)]
        expansion: bool,

        /// Stop after this many turns if nobody has won
        #[arg(long, default_value_t = 200)]
        turns: u32,

        #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,

        /// Write a replay script for the game
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Difficulty {
    Easy,
    Medium,
}

impl From<Difficulty> for BotDifficulty {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => BotDifficulty::Easy,
            Difficulty::Medium => BotDifficulty::Medium,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Replay { file, json } => {
            let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let outcome = ReplayScript::from_json(&text)?.run()?;
            info!(file = %file.display(), "replay finished");
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.state)?);
            } else {
                println!("{}", Summary(&outcome));
            }
        }
        Command::Simulate {
            seed,
            players,
            expansion,
            turns,
            difficulty,
            out,
        } => {
            let simulation = Simulation {
                seed,
                players: usize::from(players),
                expansion,
                turns,
                difficulty: difficulty.into(),
            };
            let (script, state) = simulation.run()?;
            if let Some(path) = out {
                fs::write(&path, script.to_json()?).with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), actions = script.actions.len(), "script saved");
            }
            let outcome = Outcome {
                applied: state.action_log.len(),
                rejected: 0,
                state,
            };
            println!("{}", Summary(&outcome));
        }
    }
    Ok(())
}
