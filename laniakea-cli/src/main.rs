//! Laniakea CLI - Command-line interface
//!
//! Commands:
//! - show: Print an initial board and its legal actions
//! - actions: Describe the action space of a variant
//! - selfplay: Play MCTS games and report results

mod selfplay;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use laniakea_core::{GameAdapter, Player, RuleSet};

#[derive(Parser)]
#[command(name = "laniakea")]
#[command(about = "Laniakea board game engine with AlphaZero-style search")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an initial board and its legal actions
    Show {
        /// Variant name (standard, small) or ruleset JSON file
        #[arg(long, default_value = "standard")]
        variant: String,

        /// Use the fixed tile layout instead of a random one
        #[arg(long)]
        fixture: bool,

        /// List every legal action for White
        #[arg(long)]
        list: bool,
    },
    /// Describe the action space of a variant
    Actions {
        /// Variant name (standard, small) or ruleset JSON file
        #[arg(long, default_value = "standard")]
        variant: String,
    },
    /// Play MCTS games and report results
    Selfplay(selfplay::SelfplayArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { variant, fixture, list } => show(&variant, fixture, list, cli.seed),
        Commands::Actions { variant } => actions(&variant),
        Commands::Selfplay(args) => selfplay::run(args, cli.seed),
    }
}

/// Resolve a built-in variant name or load a ruleset file
pub fn load_variant(name: &str) -> Result<RuleSet> {
    if let Some(ruleset) = RuleSet::by_name(name) {
        return Ok(ruleset);
    }
    RuleSet::load(Path::new(name))
        .with_context(|| format!("Unknown variant or unreadable ruleset: {}", name))
}

fn show(variant: &str, fixture: bool, list: bool, seed: Option<u64>) -> Result<()> {
    let adapter = GameAdapter::new(load_variant(variant)?)?;
    let board = if fixture {
        adapter.initial_fixture()
    } else {
        let mut rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        adapter.initial_state(&mut rng)?
    };

    let legal = adapter.legal_actions(&board, Player::White)?;
    println!("{}", board);
    println!("Legal actions for White: {}", legal.len());

    if list {
        for action in legal {
            let turn = adapter.turn_for(action, Player::White)?;
            println!("  {:>9}  {}", action, turn);
        }
    }
    Ok(())
}

fn actions(variant: &str) -> Result<()> {
    let ruleset = load_variant(variant)?;
    let adapter = GameAdapter::new(ruleset)?;
    let codec = adapter.codec();

    println!("Variant:        {}", adapter.ruleset().name);
    println!("Board:          {}x{}", codec.geometry().cols, codec.geometry().rows);
    println!("Moves:          {}", codec.move_count());
    println!("Second radix:   {}", codec.second_radix());
    println!("Insert radix:   {}", codec.insert_radix());
    println!("Action size:    {}", codec.action_size());
    Ok(())
}
