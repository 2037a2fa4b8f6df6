//! MCTS Search Loop
//!
//! Implements the AlphaZero-style recursive simulation over canonical
//! boards (White always to move):
//! 1. Cycle guard - a state already on the current path scores 0
//! 2. Terminal - cached game outcome
//! 3. Expansion - oracle priors masked to legal actions, value returned
//! 4. Selection - PUCT, recurse, back up the running mean
//!
//! Values are from the perspective of the side to move and are negated
//! one ply up.

use crate::oracle::{legal_priors, Oracle, OracleError};
use crate::tree::{NodeStats, SearchTables};
use crate::MctsConfig;
use laniakea_core::{ActionIndex, Board, GameAdapter, GameError, Player, StateKey};
use rand::Rng;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("No legal actions available")]
    NoLegalActions,
}

// ============================================================================
// ACTION DISTRIBUTION
// ============================================================================

/// Probabilities over the root's legal actions
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDistribution {
    /// (action, probability) in ascending action order
    entries: Vec<(ActionIndex, f32)>,
    action_size: usize,
}

impl ActionDistribution {
    pub fn entries(&self) -> &[(ActionIndex, f32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn probability(&self, action: ActionIndex) -> f32 {
        self.entries
            .binary_search_by_key(&action, |&(a, _)| a)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Full-length vector over the action space
    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.action_size];
        for &(action, p) in &self.entries {
            if let Some(slot) = dense.get_mut(action as usize) {
                *slot = p;
            }
        }
        dense
    }

    /// Most probable action, lowest index on ties
    pub fn best(&self) -> Option<ActionIndex> {
        let mut best: Option<(ActionIndex, f32)> = None;
        for &(action, p) in &self.entries {
            match best {
                Some((_, top)) if p <= top => {}
                _ => best = Some((action, p)),
            }
        }
        best.map(|(a, _)| a)
    }

    /// Draw an action proportionally to its probability
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<ActionIndex> {
        let mut remaining: f32 = rng.gen();
        for &(action, p) in &self.entries {
            if remaining < p {
                return Some(action);
            }
            remaining -= p;
        }
        // Rounding left a sliver of mass; take the last action with any
        self.entries.iter().rev().find(|(_, p)| *p > 0.0).map(|&(a, _)| a)
    }
}

/// Turn root visit counts into a distribution
///
/// Temperature 0 puts all mass on one most-visited action (random among
/// ties, so all-zero counts pick any action); otherwise counts are raised
/// to `1 / temperature` and normalized, with all-zero counts giving a
/// uniform distribution.
pub fn visit_distribution<R: Rng>(
    counts: &[(ActionIndex, u32)],
    temperature: f32,
    action_size: usize,
    rng: &mut R,
) -> Result<ActionDistribution, SearchError> {
    if counts.is_empty() {
        return Err(SearchError::NoLegalActions);
    }

    let max = counts.iter().map(|&(_, n)| n).max().unwrap_or(0);
    let entries: Vec<(ActionIndex, f32)> = if temperature <= 0.0 {
        let top: Vec<ActionIndex> = counts
            .iter()
            .filter(|&&(_, n)| n == max)
            .map(|&(a, _)| a)
            .collect();
        let chosen = top[rng.gen_range(0..top.len())];
        counts
            .iter()
            .map(|&(a, _)| (a, if a == chosen { 1.0 } else { 0.0 }))
            .collect()
    } else if max == 0 {
        let p = 1.0 / counts.len() as f32;
        counts.iter().map(|&(a, _)| (a, p)).collect()
    } else {
        // Scaling by the max keeps powf in range for small temperatures
        let exponent = 1.0 / temperature as f64;
        let weights: Vec<f64> = counts
            .iter()
            .map(|&(_, n)| (n as f64 / max as f64).powf(exponent))
            .collect();
        let total: f64 = weights.iter().sum();
        counts
            .iter()
            .zip(weights)
            .map(|(&(a, _), w)| (a, (w / total) as f32))
            .collect()
    };

    Ok(ActionDistribution {
        entries,
        action_size,
    })
}

// ============================================================================
// SEARCH
// ============================================================================

/// One search tree bound to an oracle
pub struct Mcts<O: Oracle> {
    adapter: GameAdapter,
    oracle: O,
    config: MctsConfig,
    tables: SearchTables,
}

impl<O: Oracle> Mcts<O> {
    pub fn new(adapter: GameAdapter, oracle: O, config: MctsConfig) -> Self {
        Self {
            adapter,
            oracle,
            config,
            tables: SearchTables::default(),
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn adapter(&self) -> &GameAdapter {
        &self.adapter
    }

    pub fn tables(&self) -> &SearchTables {
        &self.tables
    }

    /// Drop all statistics
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Run one simulation from a canonical board
    ///
    /// Returns the backed-up value negated, i.e. from the perspective of the
    /// player who moved into `board`.
    pub fn search(&mut self, board: &Board) -> Result<f32, SearchError> {
        let mut path = FxHashSet::default();
        self.simulate(board, &mut path)
    }

    fn simulate(&mut self, board: &Board, path: &mut FxHashSet<StateKey>) -> Result<f32, SearchError> {
        let key = board.state_key();
        if !path.insert(key.clone()) {
            trace!(nodes = self.tables.len(), "cycle on simulation path, scoring 0");
            return Ok(0.0);
        }
        let value = self.visit(board, &key, path);
        path.remove(&key);
        value
    }

    fn visit(
        &mut self,
        board: &Board,
        key: &StateKey,
        path: &mut FxHashSet<StateKey>,
    ) -> Result<f32, SearchError> {
        let adapter = &self.adapter;
        let outcome = self
            .tables
            .terminal_value(key, || adapter.terminal_value(board, Player::White));
        if outcome != 0 {
            return Ok(-(outcome as f32));
        }

        if !self.tables.is_expanded(key) {
            let value = self.expand(board, key)?;
            return Ok(-value);
        }

        let c_puct = self.config.c_puct;
        let (edge, action) = {
            let node = self.tables.node(key).ok_or(SearchError::NoLegalActions)?;
            let edge = node.select(c_puct).ok_or(SearchError::NoLegalActions)?;
            (edge, node.edges[edge].action)
        };

        let (next, to_move) = self.adapter.apply_action(board, Player::White, action)?;
        let next = self.adapter.canonical_form(&next, to_move);
        trace!(action, depth = path.len(), "descending");
        let value = self.simulate(&next, path)?;

        if let Some(node) = self.tables.node_mut(key) {
            node.update(edge, value);
        }
        Ok(-value)
    }

    /// Query the oracle for a new leaf and store its priors
    fn expand(&mut self, board: &Board, key: &StateKey) -> Result<f32, SearchError> {
        let legal = self.adapter.legal_actions(board, Player::White)?;
        let prediction = self.oracle.predict(board)?;

        let priors = match legal_priors(&prediction.policy, &legal, self.adapter.codec())? {
            Some(priors) => priors,
            None => {
                warn!(
                    legal = legal.len(),
                    "oracle put no mass on legal actions, using uniform priors"
                );
                vec![1.0 / legal.len().max(1) as f32; legal.len()]
            }
        };

        debug!(legal = legal.len(), value = prediction.value, "expanded node");
        self.tables.insert_node(key.clone(), NodeStats::new(&legal, &priors));
        Ok(prediction.value.clamp(-1.0, 1.0))
    }

    /// Run `num_simulations` simulations and read the root visit counts
    pub fn action_probabilities<R: Rng>(
        &mut self,
        board: &Board,
        num_simulations: u32,
        temperature: f32,
        rng: &mut R,
    ) -> Result<ActionDistribution, SearchError> {
        for _ in 0..num_simulations {
            self.search(board)?;
        }

        let key = board.state_key();
        let counts = match self.tables.node(&key) {
            Some(node) => node.visit_counts(),
            None => self
                .adapter
                .legal_actions(board, Player::White)?
                .into_iter()
                .map(|a| (a, 0))
                .collect(),
        };
        visit_distribution(&counts, temperature, self.adapter.action_size(), rng)
    }

    /// Pick an action for `player` on `state` using the configured budget
    ///
    /// The returned index is relative to `player`'s canonical view and can
    /// be passed straight to `GameAdapter::apply_action`.
    pub fn choose_action<R: Rng>(
        &mut self,
        state: &Board,
        player: Player,
        ply: u32,
        rng: &mut R,
    ) -> Result<ActionIndex, SearchError> {
        let canonical = self.adapter.canonical_form(state, player);
        let temperature = self.config.temperature_at(ply);
        let distribution =
            self.action_probabilities(&canonical, self.config.num_simulations, temperature, rng)?;
        distribution.sample(rng).ok_or(SearchError::NoLegalActions)
    }
}
