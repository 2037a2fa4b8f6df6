//! Laniakea Core - rules engine
//!
//! This crate provides the game logic for Laniakea:
//! - Board geometry (rectangular grid, home and scoring areas)
//! - Bit-packed stacks, turtles and sliding tiles
//! - Rule variants, board state, move generation and turn execution
//! - Flat action-space codec and the adapter used by search
//! - Tensor planes and a heuristic evaluation

pub mod board;
pub mod pieces;
pub mod error;
pub mod ruleset;
pub mod game;
pub mod actions;
pub mod adapter;
pub mod planes;
pub mod eval;

// Re-exports for convenient access
pub use board::{Cell, Geometry, InsertSlot, Position, DIRECTIONS};
pub use pieces::{Player, Square, Tile, TileSupply, MAX_STACK};
pub use error::GameError;
pub use ruleset::{RuleSet, Rules};
pub use game::{Board, FirstStep, GameResult, Move, SecondStep, StateKey, Turn};
pub use actions::{ActionCodec, ActionIndex, ActionMask};
pub use adapter::GameAdapter;
pub use eval::{evaluate, Heuristics};
