//! Grid geometry: cells, off-board positions and insertion slots

use crate::pieces::Player;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of the standard board
pub const STANDARD_COLS: i8 = 8;

/// Playable rows of the standard board
pub const STANDARD_ROWS: i8 = 6;

/// Direction vectors (dx, dy)
/// Index: 0=right, 1=forward for white, 2=left, 3=forward for black
pub const DIRECTIONS: [(i8, i8); 4] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
];

/// Insertion slot: `0..rows` pushes a row from the left, `rows..2*rows`
/// from the right, `2*rows` means no insertion this turn
pub type InsertSlot = u8;

/// A playable cell, `x` is the column and `y` the row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i8,
    pub y: i8,
}

impl Cell {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

/// Where a move starts or ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// The mover's off-board home area
    Home,
    /// The mover's off-board scoring area
    Score,
    Board(Cell),
}

impl Position {
    pub const fn at(x: i8, y: i8) -> Self {
        Position::Board(Cell::new(x, y))
    }

    pub fn cell(self) -> Option<Cell> {
        match self {
            Position::Board(cell) => Some(cell),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Home => write!(f, "home"),
            Position::Score => write!(f, "score"),
            Position::Board(cell) => write!(f, "({},{})", cell.x, cell.y),
        }
    }
}

/// Board dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub cols: i8,
    pub rows: i8,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(STANDARD_COLS, STANDARD_ROWS)
    }
}

impl Geometry {
    pub const fn new(cols: i8, rows: i8) -> Self {
        Self { cols, rows }
    }

    /// Number of playable cells
    pub fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Check if coordinates are on the board
    pub fn contains(&self, x: i8, y: i8) -> bool {
        (0..self.cols).contains(&x) && (0..self.rows).contains(&y)
    }

    /// Row-major index of a cell
    pub fn index(&self, cell: Cell) -> usize {
        cell.y as usize * self.cols as usize + cell.x as usize
    }

    /// All cells, row by row from row 0
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (cols, rows) = (self.cols, self.rows);
        (0..rows).flat_map(move |y| (0..cols).map(move |x| Cell::new(x, y)))
    }

    /// Row a player enters the board on
    pub fn home_row(&self, player: Player) -> i8 {
        match player {
            Player::White => 0,
            Player::Black => self.rows - 1,
        }
    }

    /// Where a piece leaving the board at (x, y) ends up
    ///
    /// Sideways and backward exits return home, forward exits score.
    pub fn exit_position(&self, player: Player, x: i8, y: i8) -> Position {
        if !(0..self.cols).contains(&x) {
            return Position::Home;
        }
        let forward = match player {
            Player::White => y >= self.rows,
            Player::Black => y < 0,
        };
        if forward {
            Position::Score
        } else {
            Position::Home
        }
    }

    /// Number of real insertion slots (two per row)
    pub fn insert_slots(&self) -> u8 {
        self.rows as u8 * 2
    }

    /// Sentinel slot meaning "skip the insertion"
    pub fn no_insert(&self) -> InsertSlot {
        self.insert_slots()
    }

    /// Insertion slots available after a move landed on `landing`
    pub fn insert_options(&self, landing: Position) -> Vec<InsertSlot> {
        match landing {
            Position::Board(cell) => vec![cell.y as u8, (cell.y + self.rows) as u8],
            Position::Score => (0..self.insert_slots()).collect(),
            Position::Home => vec![self.no_insert()],
        }
    }

    /// Rotate a cell by 180 degrees
    pub fn mirror_cell(&self, cell: Cell) -> Cell {
        Cell::new(self.cols - 1 - cell.x, self.rows - 1 - cell.y)
    }

    /// Rotate a position by 180 degrees; off-board areas are fixed points
    pub fn mirror_position(&self, pos: Position) -> Position {
        match pos {
            Position::Board(cell) => Position::Board(self.mirror_cell(cell)),
            other => other,
        }
    }

    /// Map an insertion slot onto the opposite side of the rotated board
    pub fn mirror_slot(&self, slot: InsertSlot) -> InsertSlot {
        if slot >= self.insert_slots() {
            slot
        } else {
            self.insert_slots() - 1 - slot
        }
    }
}
