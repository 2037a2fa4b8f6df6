//! Errors raised by the rules engine

use crate::game::{Move, Turn};
use crate::pieces::Player;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("action index {index} is outside the action space of size {size}")]
    InvalidAction { index: u64, size: u64 },

    #[error("move {0} is not in the move table")]
    UnknownMove(Move),

    #[error("insertion slot {slot} is out of range")]
    InvalidInsert { slot: u8 },

    #[error("{player:?} cannot play {turn}")]
    IllegalMove { turn: Turn, player: Player },

    #[error("{player:?} has no legal turn")]
    NoLegalTurns { player: Player },

    #[error("invalid rule set: {0}")]
    InvalidRuleSet(String),

    #[error("tile supply exhausted during setup")]
    TileSupplyExhausted,

    #[error("corrupt board: {0}")]
    Corrupt(String),
}
