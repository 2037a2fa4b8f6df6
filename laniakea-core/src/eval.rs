//! Position evaluation

use crate::game::Board;
use crate::pieces::Player;
use serde::{Deserialize, Serialize};

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Heuristics {
    /// Per scored piece, relative to the score target
    pub score_weight: f32,
    /// Per unit of forward progress of a movable top piece
    pub advance_weight: f32,
    /// Per piece on the board rather than at home
    pub play_weight: f32,
    /// Per available first move
    pub mobility_weight: f32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            score_weight: 2.0,
            advance_weight: 0.3,
            play_weight: 0.1,
            mobility_weight: 0.02,
        }
    }
}

/// Forward progress of the pieces `color` can move, in rows crossed
fn advancement(board: &Board, color: Player) -> f32 {
    let geometry = board.geometry();
    let rows = geometry.rows as f32;
    geometry
        .cells()
        .filter(|&cell| board.square(cell).top() == Some(color))
        .map(|cell| match color {
            Player::White => (cell.y + 1) as f32 / rows,
            Player::Black => (geometry.rows - cell.y) as f32 / rows,
        })
        .sum()
}

/// Evaluate a position for `color`, squashed into [-1, 1]
pub fn evaluate(board: &Board, color: Player, heuristics: &Heuristics) -> f32 {
    let opponent = color.opponent();
    if board.is_win(color) {
        return 1.0;
    }
    if board.is_win(opponent) {
        return -1.0;
    }

    let target = board.rules().score_target as f32;
    let mut score = heuristics.score_weight
        * (board.scored(color) as f32 - board.scored(opponent) as f32)
        / target;
    score += heuristics.advance_weight * (advancement(board, color) - advancement(board, opponent));
    score += heuristics.play_weight * (board.on_board(color) as f32 - board.on_board(opponent) as f32);

    if heuristics.mobility_weight.abs() > 0.001 {
        let mine = board.step_moves(color, None).len() as f32;
        let theirs = board.step_moves(opponent, None).len() as f32;
        score += heuristics.mobility_weight * (mine - theirs);
    }

    score.tanh()
}
