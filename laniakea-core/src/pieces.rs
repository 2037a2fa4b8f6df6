//! Pieces, stacks and tiles
//!
//! A square holds nothing, a turtle, or a stack of up to three pieces packed
//! into 4-bit nibbles. The most significant used nibble is the bottom piece,
//! the lowest nibble is the top piece (the only one that moves).
//!
//! ```text
//! 0x0000 -> empty
//! 0xFFFF -> turtle
//! 0x0003 -> one black piece
//! 0x0011 -> two white pieces
//! 0x0313 -> black, white, black (bottom to top)
//! ```

use crate::error::GameError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tallest stack a square can hold
pub const MAX_STACK: usize = 3;

const WHITE_NIBBLE: u16 = 0b0001;
const BLACK_NIBBLE: u16 = 0b0011;
const TURTLE_RAW: u16 = 0xFFFF;

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    White = 0,
    Black = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Index into per-player counters
    pub fn index(self) -> usize {
        self as usize
    }

    /// +1 for white, -1 for black
    pub fn sign(self) -> i8 {
        match self {
            Player::White => 1,
            Player::Black => -1,
        }
    }

    fn nibble(self) -> u16 {
        match self {
            Player::White => WHITE_NIBBLE,
            Player::Black => BLACK_NIBBLE,
        }
    }

    fn from_nibble(nibble: u16) -> Self {
        if nibble == WHITE_NIBBLE {
            Player::White
        } else {
            Player::Black
        }
    }
}

// ============================================================================
// SQUARES
// ============================================================================

/// Contents of one board cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square(u16);

impl Square {
    pub const EMPTY: Square = Square(0);
    pub const TURTLE: Square = Square(TURTLE_RAW);

    /// Build a stack from pieces listed bottom to top
    pub fn stack(pieces: &[Player]) -> Option<Self> {
        if pieces.len() > MAX_STACK {
            return None;
        }
        Some(Square(
            pieces.iter().fold(0, |acc, p| (acc << 4) | p.nibble()),
        ))
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_turtle(self) -> bool {
        self.0 == TURTLE_RAW
    }

    /// Number of stacked pieces (0 for turtles)
    pub fn height(self) -> usize {
        if self.is_turtle() {
            return 0;
        }
        let bits = 16 - self.0.leading_zeros() as usize;
        bits.div_ceil(4)
    }

    pub fn is_full(self) -> bool {
        self.height() >= MAX_STACK
    }

    /// Owner of the topmost piece
    pub fn top(self) -> Option<Player> {
        if self.is_turtle() || self.is_empty() {
            None
        } else {
            Some(Player::from_nibble(self.0 & 0xF))
        }
    }

    /// Put a piece on top; None for turtles and full stacks
    pub fn push(self, player: Player) -> Option<Self> {
        if self.is_turtle() || self.is_full() {
            return None;
        }
        Some(Square((self.0 << 4) | player.nibble()))
    }

    /// Take the top piece off
    pub fn pop(self) -> Option<(Self, Player)> {
        let top = self.top()?;
        Some((Square(self.0 >> 4), top))
    }

    /// Pieces from bottom to top
    pub fn pieces(self) -> impl Iterator<Item = Player> {
        let raw = self.0;
        let height = self.height();
        (0..height)
            .rev()
            .map(move |level| Player::from_nibble((raw >> (level * 4)) & 0xF))
    }

    /// Number of pieces of one color in the stack
    pub fn count(self, player: Player) -> usize {
        self.pieces().filter(|&p| p == player).count()
    }

    /// Same stack with every piece's color flipped
    pub fn swap_colors(self) -> Self {
        if self.is_turtle() {
            return self;
        }
        let flipped: Vec<Player> = self.pieces().map(Player::opponent).collect();
        Square::stack(&flipped).unwrap_or(self)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_turtle() {
            return write!(f, "XXX");
        }
        let mut text: String = self
            .pieces()
            .map(|p| match p {
                Player::White => 'W',
                Player::Black => 'B',
            })
            .collect();
        while text.len() < MAX_STACK {
            text.push('.');
        }
        write!(f, "{}", text)
    }
}

// ============================================================================
// TILES
// ============================================================================

/// Two-cell terrain pattern, in the order the cells are laid at the
/// insertion edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    DoubleTurtle = 0,
    TurtleOpen = 1,
    Open = 2,
    OpenTurtle = 3,
}

impl Tile {
    pub const ALL: [Tile; 4] = [
        Tile::DoubleTurtle,
        Tile::TurtleOpen,
        Tile::Open,
        Tile::OpenTurtle,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Tile::ALL.get(code as usize).copied()
    }

    /// Tile from the turtle flags of its two cells
    pub fn from_turtles(first: bool, second: bool) -> Self {
        match (first, second) {
            (true, true) => Tile::DoubleTurtle,
            (true, false) => Tile::TurtleOpen,
            (false, false) => Tile::Open,
            (false, true) => Tile::OpenTurtle,
        }
    }

    pub fn squares(self) -> [Square; 2] {
        let cell = |turtle: bool| if turtle { Square::TURTLE } else { Square::EMPTY };
        match self {
            Tile::DoubleTurtle => [cell(true), cell(true)],
            Tile::TurtleOpen => [cell(true), cell(false)],
            Tile::Open => [cell(false), cell(false)],
            Tile::OpenTurtle => [cell(false), cell(true)],
        }
    }

    /// Same tile laid the other way round
    pub fn reversed(self) -> Self {
        match self {
            Tile::TurtleOpen => Tile::OpenTurtle,
            Tile::OpenTurtle => Tile::TurtleOpen,
            other => other,
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.squares();
        let mark = |s: Square| if s.is_turtle() { 'X' } else { '.' };
        write!(f, "[{}{}]", mark(a), mark(b))
    }
}

/// Physical tiles left to place during setup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSupply {
    pub double_turtle: u8,
    /// Placeable in either orientation
    pub single_turtle: u8,
    pub open: u8,
}

impl TileSupply {
    pub fn remaining(&self) -> u32 {
        self.double_turtle as u32 + self.single_turtle as u32 + self.open as u32
    }

    /// Draw a random tile kind among those still available
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Result<Tile, GameError> {
        let mut kinds = Vec::with_capacity(3);
        if self.double_turtle > 0 {
            kinds.push(0);
        }
        if self.single_turtle > 0 {
            kinds.push(1);
        }
        if self.open > 0 {
            kinds.push(2);
        }
        if kinds.is_empty() {
            return Err(GameError::TileSupplyExhausted);
        }

        match kinds[rng.gen_range(0..kinds.len())] {
            0 => {
                self.double_turtle -= 1;
                Ok(Tile::DoubleTurtle)
            }
            1 => {
                self.single_turtle -= 1;
                if rng.gen_bool(0.5) {
                    Ok(Tile::TurtleOpen)
                } else {
                    Ok(Tile::OpenTurtle)
                }
            }
            _ => {
                self.open -= 1;
                Ok(Tile::Open)
            }
        }
    }
}
