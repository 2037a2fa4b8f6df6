//! Board to tensor encoding for neural oracles
//!
//! Layout is `[cols][rows][CHANNELS]`, flattened row-major.
//!
//! ```text
//! 0      turtle
//! 1      empty cell
//! 2..=4  white piece at stack level 0..=2 (bottom to top)
//! 5..=7  black piece at stack level 0..=2
//! 8      side to move is white
//! 9, 10  white / black home count
//! 11, 12 white / black scored count
//! 13..16 spare tile code one-hot
//! ```

use crate::board::{Cell, Geometry};
use crate::game::Board;
use crate::pieces::{Player, MAX_STACK};

pub const CHANNELS: usize = 17;

const TURTLE: usize = 0;
const EMPTY: usize = 1;
const WHITE_LEVELS: usize = 2;
const BLACK_LEVELS: usize = WHITE_LEVELS + MAX_STACK;
const TO_MOVE: usize = 8;
const HOME: usize = 9;
const SCORED: usize = 11;
const SPARE: usize = 13;

/// Tensor shape for a geometry
pub fn shape(geometry: Geometry) -> [usize; 3] {
    [geometry.cols as usize, geometry.rows as usize, CHANNELS]
}

/// Flat offset of one channel of one cell
pub fn plane_index(geometry: Geometry, cell: Cell, channel: usize) -> usize {
    (cell.x as usize * geometry.rows as usize + cell.y as usize) * CHANNELS + channel
}

/// Encode a board with `player` to move
pub fn encode(board: &Board, player: Player) -> Vec<f32> {
    let geometry = board.geometry();
    let rules = board.rules();
    let mut planes = vec![0.0f32; geometry.area() * CHANNELS];

    let pieces = rules.pieces_per_side as f32;
    let target = rules.score_target as f32;
    let mut meta = [0.0f32; CHANNELS];
    meta[TO_MOVE] = if player == Player::White { 1.0 } else { 0.0 };
    meta[HOME] = board.home(Player::White) as f32 / pieces;
    meta[HOME + 1] = board.home(Player::Black) as f32 / pieces;
    meta[SCORED] = board.scored(Player::White) as f32 / target;
    meta[SCORED + 1] = board.scored(Player::Black) as f32 / target;
    meta[SPARE + board.spare().code() as usize] = 1.0;

    for cell in geometry.cells() {
        let base = plane_index(geometry, cell, 0);
        let out = &mut planes[base..base + CHANNELS];
        out[TO_MOVE..].copy_from_slice(&meta[TO_MOVE..]);

        let square = board.square(cell);
        if square.is_turtle() {
            out[TURTLE] = 1.0;
        } else if square.is_empty() {
            out[EMPTY] = 1.0;
        } else {
            for (level, piece) in square.pieces().enumerate() {
                let offset = match piece {
                    Player::White => WHITE_LEVELS,
                    Player::Black => BLACK_LEVELS,
                };
                out[offset + level] = 1.0;
            }
        }
    }
    planes
}
