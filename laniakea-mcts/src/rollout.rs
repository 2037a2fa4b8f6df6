//! Rollout (simulation) strategies for MCTS
//!
//! A rollout plays uniformly random legal turns from a position until the
//! game ends or a ply limit is hit. `RolloutOracle` wraps this as an oracle:
//! uniform priors, value from one playout.

use crate::oracle::{Oracle, OracleError, Prediction, UniformOracle};
use laniakea_core::{evaluate, Board, GameAdapter, GameResult, Heuristics, Player, Turn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// ROLLOUT RESULT
// ============================================================================

/// Result of a rollout simulation
#[derive(Clone, Debug)]
pub struct RolloutResult {
    /// Final game result
    pub result: GameResult,
    /// Number of turns played
    pub plies_played: u32,
    /// Position where the rollout stopped
    pub board: Board,
    /// Side to move in `board`
    pub to_move: Player,
}

impl RolloutResult {
    /// Outcome for `player`: +1 win, -1 loss, heuristic estimate if unfinished
    pub fn value_for(&self, player: Player, heuristics: &Heuristics) -> f32 {
        match self.result {
            GameResult::WhiteWins if player == Player::White => 1.0,
            GameResult::BlackWins if player == Player::Black => 1.0,
            GameResult::WhiteWins | GameResult::BlackWins => -1.0,
            GameResult::Ongoing => evaluate(&self.board, player, heuristics),
        }
    }
}

// ============================================================================
// CPU ROLLOUT
// ============================================================================

/// Perform a single random rollout on CPU
///
/// Plays random legal turns until the game ends or max_plies is reached.
pub fn cpu_rollout<R: Rng>(board: &Board, to_move: Player, max_plies: u32, rng: &mut R) -> RolloutResult {
    let mut current = board.clone();
    let mut player = to_move;
    let mut plies_played = 0;

    while current.result() == GameResult::Ongoing && plies_played < max_plies {
        let turns = current.legal_turns(player);

        if turns.is_empty() {
            // No legal turns - game should have ended, break
            break;
        }

        let turn = select_random_turn(&turns, rng);
        if current.execute_turn(&turn, player).is_err() {
            break;
        }
        player = player.opponent();
        plies_played += 1;
    }

    RolloutResult {
        result: current.result(),
        plies_played,
        board: current,
        to_move: player,
    }
}

/// Select a random turn uniformly from the list
fn select_random_turn<R: Rng>(turns: &[Turn], rng: &mut R) -> Turn {
    let idx = rng.gen_range(0..turns.len());
    turns[idx]
}

// ============================================================================
// ROLLOUT ORACLE
// ============================================================================

/// Oracle that scores a board with one random playout
///
/// Each call draws a fresh stream from `seed` and a call counter, so a
/// single oracle gives reproducible but varied playouts.
#[derive(Debug)]
pub struct RolloutOracle {
    adapter: GameAdapter,
    max_plies: u32,
    seed: u64,
    calls: AtomicU64,
    heuristics: Heuristics,
}

impl RolloutOracle {
    pub fn new(adapter: GameAdapter, max_plies: u32, seed: u64) -> Self {
        Self {
            adapter,
            max_plies,
            seed,
            calls: AtomicU64::new(0),
            heuristics: Heuristics::default(),
        }
    }

    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }
}

impl Oracle for RolloutOracle {
    fn predict(&self, board: &Board) -> Result<Prediction, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(call));
        // Canonical boards always have White to move
        let rollout = cpu_rollout(board, Player::White, self.max_plies, &mut rng);

        Ok(Prediction {
            policy: UniformOracle::uniform_policy(self.adapter.codec()),
            value: rollout.value_for(Player::White, &self.heuristics),
        })
    }
}
