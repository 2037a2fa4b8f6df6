//! Laniakea MCTS - AlphaZero-style tree search
//!
//! This crate provides search over canonical Laniakea boards:
//! - Oracle trait for policy/value estimates, with uniform and rollout oracles
//! - Statistics tables keyed by exact state keys (PUCT selection)
//! - Recursive simulation with a per-path cycle guard
//! - Visit-count action distributions with temperature

pub mod oracle;
pub mod rollout;
pub mod tree;
pub mod search;

pub use oracle::{legal_priors, Oracle, OracleError, Policy, Prediction, UniformOracle};
pub use rollout::{cpu_rollout, RolloutOracle, RolloutResult};
pub use search::{visit_distribution, ActionDistribution, Mcts, SearchError};
pub use tree::{Edge, NodeStats, SearchTables};

/// MCTS configuration
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// Simulations per move decision
    pub num_simulations: u32,
    /// Exploration constant in PUCT
    pub c_puct: f32,
    /// Temperature for early-game move choice
    pub temperature: f32,
    /// Plies played at `temperature` before switching to greedy choice
    pub temperature_threshold: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 25,
            c_puct: 1.0,
            temperature: 1.0,
            temperature_threshold: 5,
        }
    }
}

impl MctsConfig {
    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Builder pattern: set exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set temperature.
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    /// Builder pattern: set the ply after which play turns greedy.
    pub fn with_temperature_threshold(mut self, plies: u32) -> Self {
        self.temperature_threshold = plies;
        self
    }

    /// Temperature to use at a given ply of the game
    pub fn temperature_at(&self, ply: u32) -> f32 {
        if ply < self.temperature_threshold {
            self.temperature
        } else {
            0.0
        }
    }
}
