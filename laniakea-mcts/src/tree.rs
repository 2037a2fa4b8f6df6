//! Search statistics
//!
//! Nodes live in hash maps keyed by the exact byte key of a canonical
//! board, so transpositions share statistics. Two different boards never
//! share a key; a collision would corrupt the search rather than slow it.

use laniakea_core::{ActionIndex, StateKey};
use rustc_hash::FxHashMap;

/// Added under the square root so unvisited nodes still rank by prior
pub const EPS: f32 = 1e-8;

// ============================================================================
// TYPES
// ============================================================================

/// Statistics for one legal action of a node
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub action: ActionIndex,
    /// Prior probability from the oracle
    pub prior: f32,
    /// Times this action was taken
    pub visits: u32,
    /// Mean value for the side to move at the parent
    pub q: f32,
}

/// Statistics for an expanded node
#[derive(Clone, Debug, Default)]
pub struct NodeStats {
    /// Number of times this node was visited after expansion
    pub visits: u32,
    /// Legal actions in ascending index order
    pub edges: Vec<Edge>,
}

impl NodeStats {
    /// Create a node from its legal actions and their priors
    pub fn new(actions: &[ActionIndex], priors: &[f32]) -> Self {
        let edges = actions
            .iter()
            .zip(priors)
            .map(|(&action, &prior)| Edge {
                action,
                prior,
                visits: 0,
                q: 0.0,
            })
            .collect();
        Self { visits: 0, edges }
    }

    /// PUCT score of an edge
    ///
    /// Q + c * P * sqrt(N) / (1 + n) once visited, c * P * sqrt(N + eps) before.
    pub fn puct(&self, edge: &Edge, c_puct: f32) -> f32 {
        let parent = self.visits as f32;
        if edge.visits > 0 {
            edge.q + c_puct * edge.prior * parent.sqrt() / (1.0 + edge.visits as f32)
        } else {
            c_puct * edge.prior * (parent + EPS).sqrt()
        }
    }

    /// Index of the edge to follow; ties go to the lowest action index
    pub fn select(&self, c_puct: f32) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, edge) in self.edges.iter().enumerate() {
            let score = self.puct(edge, c_puct);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Fold a simulation value into the running mean of an edge
    pub fn update(&mut self, edge: usize, value: f32) {
        if let Some(e) = self.edges.get_mut(edge) {
            e.q = (e.visits as f32 * e.q + value) / (e.visits as f32 + 1.0);
            e.visits += 1;
        }
        self.visits += 1;
    }

    /// (action, visits) pairs in ascending action order
    pub fn visit_counts(&self) -> Vec<(ActionIndex, u32)> {
        self.edges.iter().map(|e| (e.action, e.visits)).collect()
    }
}

// ============================================================================
// TABLES
// ============================================================================

/// Transposition tables for one search tree
#[derive(Debug, Default)]
pub struct SearchTables {
    nodes: FxHashMap<StateKey, NodeStats>,
    terminal: FxHashMap<StateKey, i8>,
}

impl SearchTables {
    pub fn node(&self, key: &StateKey) -> Option<&NodeStats> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: &StateKey) -> Option<&mut NodeStats> {
        self.nodes.get_mut(key)
    }

    pub fn insert_node(&mut self, key: StateKey, stats: NodeStats) {
        self.nodes.insert(key, stats);
    }

    pub fn is_expanded(&self, key: &StateKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Cached terminal value, computing it on first sight
    pub fn terminal_value(&mut self, key: &StateKey, compute: impl FnOnce() -> i8) -> i8 {
        if let Some(&value) = self.terminal.get(key) {
            return value;
        }
        let value = compute();
        self.terminal.insert(key.clone(), value);
        value
    }

    /// Number of expanded nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.terminal.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
