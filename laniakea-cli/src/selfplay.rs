//! Selfplay command - play MCTS games and report results
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_adapter(), play_games(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: oracle construction and formatting utilities

use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use laniakea_core::{ActionIndex, GameAdapter, GameResult, Player};
use laniakea_mcts::{Mcts, MctsConfig, Oracle, RolloutOracle, UniformOracle};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Who plays against the searching side
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Opponent {
    /// Uniformly random legal turns; colors alternate between games
    Random,
    /// MCTS plays both sides, sharing one tree
    Mcts,
}

/// Which oracle guides the search
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OracleKind {
    /// Uniform priors, neutral value
    Uniform,
    /// Uniform priors, value from a random playout
    Rollout,
}

#[derive(Args, Clone, Debug)]
pub struct SelfplayArgs {
    /// Variant name (standard, small) or ruleset JSON file
    #[arg(long, default_value = "small")]
    pub variant: String,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// MCTS simulations per turn
    #[arg(long, default_value = "25")]
    pub simulations: u32,

    /// Exploration constant
    #[arg(long, default_value = "1.0")]
    pub c_puct: f32,

    /// Plies sampled proportionally to visits before play turns greedy
    #[arg(long, default_value = "5")]
    pub temperature_threshold: u32,

    /// Maximum plies per game
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Opponent of the searching side
    #[arg(long, value_enum, default_value = "random")]
    pub opponent: Opponent,

    /// Oracle used by the search
    #[arg(long, value_enum, default_value = "rollout")]
    pub oracle: OracleKind,

    /// Ply limit for rollout playouts
    #[arg(long, default_value = "40")]
    pub rollout_plies: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    result: GameResult,
    plies: u32,
    /// Side played by MCTS, `None` when it played both
    mcts_color: Option<Player>,
    actions: Vec<ActionIndex>,
}

/// Aggregated selfplay results
#[derive(Clone, Debug)]
struct SelfplayResults {
    games: Vec<GameRecord>,
    white_wins: usize,
    black_wins: usize,
    unfinished: usize,
    mcts_wins: usize,
    avg_plies: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run selfplay command
///
/// 1. Resolve the variant
/// 2. Play the games in parallel
/// 3. Report results
pub fn run(args: SelfplayArgs, seed: Option<u64>) -> Result<()> {
    let adapter = load_adapter(&args)?;

    tracing::info!(
        "Starting selfplay: {} ({} games, {} simulations, opponent={:?}, oracle={:?})",
        adapter.ruleset().name,
        args.games,
        args.simulations,
        args.opponent,
        args.oracle
    );

    let results = play_games(&adapter, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_adapter(args: &SelfplayArgs) -> Result<GameAdapter> {
    let ruleset = crate::load_variant(&args.variant)?;
    Ok(GameAdapter::new(ruleset)?)
}

/// Play all games, one search tree per game
fn play_games(adapter: &GameAdapter, args: &SelfplayArgs, seed: Option<u64>) -> Result<SelfplayResults> {
    let base_seed: u64 = create_rng(seed).gen();

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games as u64);
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games")?
                .progress_chars("##-"),
        );
        pb
    };

    let games = (0..args.games)
        .into_par_iter()
        .map(|game_idx| {
            let record = play_single_game(
                adapter,
                args,
                game_idx + 1,
                base_seed.wrapping_add(game_idx as u64),
            );
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish_and_clear();

    for record in &games {
        tracing::info!(
            "Game {}: {:?} ({} plies)",
            record.game_number,
            record.result,
            record.plies
        );
    }

    Ok(compute_statistics(games))
}

/// Report selfplay results
fn report_results(results: &SelfplayResults, args: &SelfplayArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game from a random tile layout
fn play_single_game(
    adapter: &GameAdapter,
    args: &SelfplayArgs,
    game_number: usize,
    seed: u64,
) -> Result<GameRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let config = MctsConfig::default()
        .with_simulations(args.simulations)
        .with_c_puct(args.c_puct)
        .with_temperature_threshold(args.temperature_threshold);
    let mut mcts = Mcts::new(adapter.clone(), build_oracle(adapter, args, seed), config);

    // Alternate colors for fairness
    let mcts_color = match args.opponent {
        Opponent::Mcts => None,
        Opponent::Random if game_number % 2 == 1 => Some(Player::White),
        Opponent::Random => Some(Player::Black),
    };

    let mut state = adapter.initial_state(&mut rng)?;
    let mut player = Player::White;
    let mut actions = Vec::new();
    let mut plies = 0;

    while state.result() == GameResult::Ongoing && plies < args.max_turns {
        let (next, to_move, action) = if mcts_color.map_or(true, |c| c == player) {
            let action = mcts.choose_action(&state, player, plies, &mut rng)?;
            let (next, to_move) = adapter.apply_action(&state, player, action)?;
            (next, to_move, action)
        } else {
            adapter.apply_random_action(&state, player, &mut rng)?
        };

        tracing::debug!("Game {} ply {}: {:?} plays {}", game_number, plies, player, action);
        state = next;
        player = to_move;
        actions.push(action);
        plies += 1;
    }

    Ok(GameRecord {
        game_number,
        result: state.result(),
        plies,
        mcts_color,
        actions,
    })
}

/// Compute aggregate statistics from game records
fn compute_statistics(games: Vec<GameRecord>) -> SelfplayResults {
    let white_wins = games
        .iter()
        .filter(|g| g.result == GameResult::WhiteWins)
        .count();
    let black_wins = games
        .iter()
        .filter(|g| g.result == GameResult::BlackWins)
        .count();
    let unfinished = games
        .iter()
        .filter(|g| g.result == GameResult::Ongoing)
        .count();
    let mcts_wins = games
        .iter()
        .filter(|g| match (g.mcts_color, g.result) {
            (Some(Player::White), GameResult::WhiteWins) => true,
            (Some(Player::Black), GameResult::BlackWins) => true,
            _ => false,
        })
        .count();

    let total_plies: u32 = games.iter().map(|g| g.plies).sum();
    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    SelfplayResults {
        games,
        white_wins,
        black_wins,
        unfinished,
        mcts_wins,
        avg_plies,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn build_oracle(adapter: &GameAdapter, args: &SelfplayArgs, seed: u64) -> Box<dyn Oracle> {
    match args.oracle {
        OracleKind::Uniform => Box::new(UniformOracle::new(adapter.codec().clone())),
        OracleKind::Rollout => Box::new(RolloutOracle::new(adapter.clone(), args.rollout_plies, seed)),
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &SelfplayResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: String,
        plies: u32,
        mcts_color: Option<String>,
        actions: Vec<ActionIndex>,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        white_wins: usize,
        black_wins: usize,
        unfinished: usize,
        mcts_wins: usize,
        avg_plies: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        white_wins: results.white_wins,
        black_wins: results.black_wins,
        unfinished: results.unfinished,
        mcts_wins: results.mcts_wins,
        avg_plies: results.avg_plies,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: format!("{:?}", g.result),
                plies: g.plies,
                mcts_color: g.mcts_color.map(|c| format!("{:?}", c)),
                actions: g.actions.clone(),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &SelfplayResults) {
    let total = results.games.len();

    println!("\n=== Selfplay Results ===");
    println!("Total games: {}", total);
    println!(
        "White wins:  {} ({:.1}%)",
        results.white_wins,
        percent(results.white_wins, total)
    );
    println!(
        "Black wins:  {} ({:.1}%)",
        results.black_wins,
        percent(results.black_wins, total)
    );
    println!(
        "Unfinished:  {} ({:.1}%)",
        results.unfinished,
        percent(results.unfinished, total)
    );
    let vs_random = results.games.iter().filter(|g| g.mcts_color.is_some()).count();
    if vs_random > 0 {
        println!(
            "MCTS wins:   {} of {} ({:.1}%)",
            results.mcts_wins,
            vs_random,
            percent(results.mcts_wins, vs_random)
        );
    }
    println!("Avg plies:   {:.1}", results.avg_plies);

    println!("\nGame details:");
    for game in &results.games {
        let side = match game.mcts_color {
            Some(color) => format!("MCTS as {:?}", color),
            None => "MCTS both sides".to_string(),
        };
        println!(
            "  Game {}: {:?} in {} plies ({})",
            game.game_number, game.result, game.plies, side
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
