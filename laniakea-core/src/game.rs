//! Board state, move generation and turn execution

use crate::board::{Cell, Geometry, InsertSlot, Position, DIRECTIONS};
use crate::error::GameError;
use crate::pieces::{Player, Square, Tile};
use crate::ruleset::{RuleSet, Rules};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    WhiteWins,
    BlackWins,
}

/// A single piece movement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// The move that would undo this one
    pub fn reversed(self) -> Self {
        Self::new(self.to, self.from)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// One full player action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub first: Move,
    pub second: Option<Move>,
    pub insert: InsertSlot,
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        if let Some(second) = self.second {
            write!(f, " {}", second)?;
        }
        write!(f, " @{}", self.insert)
    }
}

/// A legal second move and the insertions it allows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecondStep {
    pub mv: Move,
    pub inserts: Vec<InsertSlot>,
}

/// A legal first move with everything that may follow it
///
/// `inserts` is only filled when the turn ends after this move, that is
/// when the variant has no second move or no second move is possible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirstStep {
    pub mv: Move,
    pub seconds: Vec<SecondStep>,
    pub inserts: Vec<InsertSlot>,
}

/// Exact byte serialization of a board, used as a transposition key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Fixture terrain for tile slots other than the first in each row
const FIXTURE_PATTERN: [Tile; 4] = [
    Tile::TurtleOpen,
    Tile::Open,
    Tile::OpenTurtle,
    Tile::DoubleTurtle,
];

/// Fixed 6x5 opening, rows bottom to top, tiles left to right
const SMALL_FIXTURE: [[Tile; 3]; 5] = [
    [Tile::Open, Tile::DoubleTurtle, Tile::DoubleTurtle],
    [Tile::TurtleOpen, Tile::TurtleOpen, Tile::Open],
    [Tile::Open, Tile::Open, Tile::TurtleOpen],
    [Tile::OpenTurtle, Tile::OpenTurtle, Tile::OpenTurtle],
    [Tile::OpenTurtle, Tile::Open, Tile::OpenTurtle],
];
const SMALL_FIXTURE_SPARE: Tile = Tile::OpenTurtle;

/// Board state (clone to mutate)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    rules: Rules,
    /// Row-major cells
    squares: Vec<Square>,
    home: [u8; 2],
    scored: [u8; 2],
    spare: Tile,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Board with no turtles and every piece at home
    pub fn empty(rules: Rules) -> Self {
        Self {
            rules,
            squares: vec![Square::EMPTY; rules.geometry.area()],
            home: [rules.pieces_per_side; 2],
            scored: [0; 2],
            spare: Tile::Open,
        }
    }

    /// Deterministic layout used by tests and demos
    ///
    /// The 6x5 board gets its fixed opening grid; other sizes get a
    /// repeating pattern with an open first tile in every row.
    pub fn fixture(ruleset: &RuleSet) -> Self {
        let mut board = Self::empty(ruleset.rules());
        let geometry = board.geometry();
        if geometry == Geometry::new(6, 5) {
            for (y, row) in SMALL_FIXTURE.iter().enumerate() {
                for (t, &tile) in row.iter().enumerate() {
                    board.lay_tile(y as i8, t as i8, tile);
                }
            }
            board.spare = SMALL_FIXTURE_SPARE;
            return board;
        }
        for y in 0..geometry.rows {
            for t in 1..geometry.cols / 2 {
                let tile = FIXTURE_PATTERN[(y + t) as usize % FIXTURE_PATTERN.len()];
                board.lay_tile(y, t, tile);
            }
        }
        board
    }

    /// Randomized layout drawn from the variant's tile supply
    ///
    /// Every row gets one open tile at a random slot; the remaining slots
    /// and the spare are drawn from the supply, which must end up empty.
    pub fn random<R: Rng>(ruleset: &RuleSet, rng: &mut R) -> Result<Self, GameError> {
        ruleset.validate()?;
        let mut board = Self::empty(ruleset.rules());
        let mut supply = ruleset.tiles;
        let tiles_per_row = ruleset.cols / 2;

        for y in 0..ruleset.rows {
            let open_slot = rng.gen_range(0..tiles_per_row);
            for t in 0..tiles_per_row {
                let tile = if t == open_slot {
                    Tile::Open
                } else {
                    supply.draw(rng)?
                };
                board.lay_tile(y, t, tile);
            }
        }
        board.spare = supply.draw(rng)?;

        if supply.remaining() != 0 {
            return Err(GameError::InvalidRuleSet(format!(
                "{} tiles left over after setup",
                supply.remaining()
            )));
        }
        Ok(board)
    }

    fn lay_tile(&mut self, y: i8, slot: i8, tile: Tile) {
        let geometry = self.geometry();
        for (offset, square) in tile.squares().into_iter().enumerate() {
            let cell = Cell::new(slot * 2 + offset as i8, y);
            self.squares[geometry.index(cell)] = square;
        }
    }

    /// Move a piece from its owner's home straight onto a cell
    pub fn place(&mut self, cell: Cell, color: Player) -> Result<(), GameError> {
        if self.home[color.index()] == 0 {
            return Err(GameError::Corrupt(format!("{:?} has no piece at home", color)));
        }
        let idx = self.cell_index(cell)?;
        let stacked = self.squares[idx]
            .push(color)
            .ok_or_else(|| GameError::Corrupt(format!("cannot stack on {:?}", cell)))?;
        self.squares[idx] = stacked;
        self.home[color.index()] -= 1;
        Ok(())
    }

    /// Turn an unoccupied cell into a turtle or back into open ground
    pub fn set_terrain(&mut self, cell: Cell, turtle: bool) -> Result<(), GameError> {
        let idx = self.cell_index(cell)?;
        if self.squares[idx].height() > 0 {
            return Err(GameError::Corrupt(format!("{:?} holds pieces", cell)));
        }
        self.squares[idx] = if turtle { Square::TURTLE } else { Square::EMPTY };
        Ok(())
    }

    pub fn set_spare(&mut self, tile: Tile) {
        self.spare = tile;
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn geometry(&self) -> Geometry {
        self.rules.geometry
    }

    fn cell_index(&self, cell: Cell) -> Result<usize, GameError> {
        if self.geometry().contains(cell.x, cell.y) {
            Ok(self.geometry().index(cell))
        } else {
            Err(GameError::Corrupt(format!("{:?} is off the board", cell)))
        }
    }

    /// Contents of an on-board cell; off-board cells read as turtles
    pub fn square(&self, cell: Cell) -> Square {
        match self.cell_index(cell) {
            Ok(idx) => self.squares[idx],
            Err(_) => Square::TURTLE,
        }
    }

    pub fn home(&self, color: Player) -> u8 {
        self.home[color.index()]
    }

    pub fn scored(&self, color: Player) -> u8 {
        self.scored[color.index()]
    }

    pub fn spare(&self) -> Tile {
        self.spare
    }

    /// Pieces of one color anywhere in a stack on the board
    pub fn on_board(&self, color: Player) -> usize {
        self.squares.iter().map(|sq| sq.count(color)).sum()
    }

    /// Home + board + scored, constant over a game
    pub fn total_pieces(&self, color: Player) -> usize {
        self.home(color) as usize + self.on_board(color) + self.scored(color) as usize
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Single moves available to `color`, excluding the reversal of `last`
    pub fn step_moves(&self, color: Player, last: Option<Move>) -> Vec<Move> {
        let geometry = self.geometry();
        let forbidden = last.map(Move::reversed);
        let mut moves = Vec::new();

        for cell in geometry.cells() {
            let square = self.square(cell);
            if square.top() != Some(color) {
                continue;
            }
            let distance = square.height() as i8;
            for &(dx, dy) in &DIRECTIONS {
                if let Some(to) = self.slide(color, cell, dx, dy, distance) {
                    // Corner cells can exit home two ways
                    let mv = Move::new(Position::Board(cell), to);
                    if !moves.contains(&mv) {
                        moves.push(mv);
                    }
                }
            }
        }

        if self.home(color) > 0 {
            let y = geometry.home_row(color);
            for x in 0..geometry.cols {
                let cell = Cell::new(x, y);
                let square = self.square(cell);
                if !square.is_turtle() && !square.is_full() {
                    moves.push(Move::new(Position::Home, Position::Board(cell)));
                }
            }
        }

        if let Some(forbidden) = forbidden {
            moves.retain(|&mv| mv != forbidden);
        }
        moves
    }

    /// Where the top piece of `cell` lands sliding `distance` cells, if the
    /// path is clear
    fn slide(&self, color: Player, cell: Cell, dx: i8, dy: i8, distance: i8) -> Option<Position> {
        let geometry = self.geometry();
        for step in 1..=distance {
            let (x, y) = (cell.x + dx * step, cell.y + dy * step);
            if !geometry.contains(x, y) {
                return Some(geometry.exit_position(
                    color,
                    cell.x + dx * distance,
                    cell.y + dy * distance,
                ));
            }
            let square = self.square(Cell::new(x, y));
            if square.is_turtle() {
                return None;
            }
            if step == distance {
                if square.is_full() {
                    return None;
                }
                return Some(Position::at(x, y));
            }
        }
        None
    }

    /// Full legal-move tree for `color`
    pub fn legal_moves(&self, color: Player) -> Vec<FirstStep> {
        let geometry = self.geometry();
        let mut steps = Vec::new();

        for mv in self.step_moves(color, None) {
            let Ok(after) = self.after_move(color, mv) else {
                continue;
            };

            let mut seconds = Vec::new();
            if self.rules.second_move {
                for second in after.step_moves(color, Some(mv)) {
                    seconds.push(SecondStep {
                        mv: second,
                        inserts: geometry.insert_options(second.to),
                    });
                }
            }

            let inserts = if seconds.is_empty() {
                geometry.insert_options(mv.to)
            } else {
                Vec::new()
            };
            steps.push(FirstStep { mv, seconds, inserts });
        }
        steps
    }

    /// Flattened list of every legal turn
    pub fn legal_turns(&self, color: Player) -> Vec<Turn> {
        let mut turns = Vec::new();
        for step in self.legal_moves(color) {
            if step.seconds.is_empty() {
                for &insert in &step.inserts {
                    turns.push(Turn {
                        first: step.mv,
                        second: None,
                        insert,
                    });
                }
            }
            for second in &step.seconds {
                for &insert in &second.inserts {
                    turns.push(Turn {
                        first: step.mv,
                        second: Some(second.mv),
                        insert,
                    });
                }
            }
        }
        turns
    }

    /// Check a turn against the rules without enumerating every turn
    pub fn is_legal_turn(&self, turn: &Turn, color: Player) -> bool {
        if !self.step_moves(color, None).contains(&turn.first) {
            return false;
        }
        let Ok(after) = self.after_move(color, turn.first) else {
            return false;
        };
        let seconds = if self.rules.second_move {
            after.step_moves(color, Some(turn.first))
        } else {
            Vec::new()
        };

        let landing = match (turn.second, seconds.is_empty()) {
            (None, true) => turn.first.to,
            (Some(second), false) if seconds.contains(&second) => second.to,
            _ => return false,
        };
        self.geometry().insert_options(landing).contains(&turn.insert)
    }

    /// At least one first move exists
    pub fn has_legal_moves(&self, color: Player) -> bool {
        !self.step_moves(color, None).is_empty()
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    fn after_move(&self, color: Player, mv: Move) -> Result<Board, GameError> {
        let mut next = self.clone();
        next.apply_move(color, mv)?;
        Ok(next)
    }

    /// Move one piece without checking legality; fails without mutating if
    /// the source has no piece of `color` or the destination cannot take it
    pub fn apply_move(&mut self, color: Player, mv: Move) -> Result<(), GameError> {
        let source = match mv.from {
            Position::Home => {
                if self.home(color) == 0 {
                    return Err(GameError::Corrupt(format!("{:?} has no piece at home", color)));
                }
                None
            }
            Position::Board(cell) => {
                let idx = self.cell_index(cell)?;
                match self.squares[idx].pop() {
                    Some((rest, top)) if top == color => Some((idx, rest)),
                    _ => return Err(GameError::UnknownMove(mv)),
                }
            }
            Position::Score => return Err(GameError::UnknownMove(mv)),
        };

        let target = match mv.to {
            Position::Board(cell) => {
                let idx = self.cell_index(cell)?;
                let stacked = self.squares[idx]
                    .push(color)
                    .ok_or(GameError::UnknownMove(mv))?;
                Some((idx, stacked))
            }
            _ => None,
        };

        match source {
            Some((idx, rest)) => self.squares[idx] = rest,
            None => self.home[color.index()] -= 1,
        }
        match (target, mv.to) {
            (Some((idx, stacked)), _) => self.squares[idx] = stacked,
            (None, Position::Score) => self.scored[color.index()] += 1,
            (None, _) => self.home[color.index()] += 1,
        }
        Ok(())
    }

    /// Validate and play a full turn; the board is untouched on error
    pub fn execute_turn(&mut self, turn: &Turn, color: Player) -> Result<(), GameError> {
        if !self.is_legal_turn(turn, color) {
            return Err(GameError::IllegalMove { turn: *turn, player: color });
        }

        let mut next = self.clone();
        next.apply_move(color, turn.first)?;
        if let Some(second) = turn.second {
            next.apply_move(color, second)?;
        }
        if turn.insert != self.geometry().no_insert() {
            next.insert_tile(turn.insert)?;
        }
        *self = next;
        Ok(())
    }

    /// Slide the spare tile into a row
    ///
    /// Slots below `rows` push from the left, the rest from the right. The
    /// two cells pushed off the far edge lose their pieces to their owners'
    /// homes and become the new spare. Tile cells are read left to right.
    pub fn insert_tile(&mut self, slot: InsertSlot) -> Result<(), GameError> {
        let geometry = self.geometry();
        if slot >= geometry.insert_slots() {
            return Err(GameError::InvalidInsert { slot });
        }
        let rows = geometry.rows as u8;
        let from_left = slot < rows;
        let y = (if from_left { slot } else { slot - rows }) as usize;

        let cols = geometry.cols as usize;
        let start = y * cols;
        let row = &mut self.squares[start..start + cols];

        let ejected = if from_left {
            [row[cols - 2], row[cols - 1]]
        } else {
            [row[0], row[1]]
        };
        for square in ejected {
            for piece in square.pieces() {
                self.home[piece.index()] += 1;
            }
        }

        let laid = self.spare.squares();
        if from_left {
            row.copy_within(0..cols - 2, 2);
            row[..2].copy_from_slice(&laid);
        } else {
            row.copy_within(2..cols, 0);
            row[cols - 2..].copy_from_slice(&laid);
        }
        self.spare = Tile::from_turtles(ejected[0].is_turtle(), ejected[1].is_turtle());
        Ok(())
    }

    // ========================================================================
    // RESULTS AND KEYS
    // ========================================================================

    /// Scored enough pieces, or the opponent is stuck
    pub fn is_win(&self, color: Player) -> bool {
        self.scored(color) >= self.rules.score_target || !self.has_legal_moves(color.opponent())
    }

    pub fn result(&self) -> GameResult {
        if self.is_win(Player::White) {
            GameResult::WhiteWins
        } else if self.is_win(Player::Black) {
            GameResult::BlackWins
        } else {
            GameResult::Ongoing
        }
    }

    /// Cells as big-endian `u16`, then home, scored and spare
    pub fn state_key(&self) -> StateKey {
        let mut bytes = Vec::with_capacity(self.squares.len() * 2 + 5);
        for square in &self.squares {
            bytes.extend_from_slice(&square.raw().to_be_bytes());
        }
        bytes.extend_from_slice(&self.home);
        bytes.extend_from_slice(&self.scored);
        bytes.push(self.spare.code());
        StateKey(bytes.into_boxed_slice())
    }

    /// Same position seen from the other side of the table: colors swapped,
    /// board rotated 180 degrees, spare tile reversed
    pub fn flipped(&self) -> Board {
        let geometry = self.geometry();
        let mut squares = vec![Square::EMPTY; self.squares.len()];
        for cell in geometry.cells() {
            squares[geometry.index(geometry.mirror_cell(cell))] =
                self.squares[geometry.index(cell)].swap_colors();
        }
        Board {
            rules: self.rules,
            squares,
            home: [self.home[1], self.home[0]],
            scored: [self.scored[1], self.scored[0]],
            spare: self.spare.reversed(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "W home {} scored {} | B home {} scored {} | spare {}",
            self.home(Player::White),
            self.scored(Player::White),
            self.home(Player::Black),
            self.scored(Player::Black),
            self.spare
        )?;
        let geometry = self.geometry();
        for y in (0..geometry.rows).rev() {
            write!(f, "{} |", y)?;
            for x in 0..geometry.cols {
                write!(f, " {}", self.square(Cell::new(x, y)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn standard_empty() -> Board {
        Board::empty(RuleSet::standard().rules())
    }

    /// Play random turns to reach a mid-game position
    fn midgame(seed: u64, plies: usize) -> (Board, Player) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut board = Board::random(&RuleSet::standard(), &mut rng).unwrap();
        let mut color = Player::White;
        for _ in 0..plies {
            if board.result() != GameResult::Ongoing {
                break;
            }
            let turns = board.legal_turns(color);
            let turn = turns[rng.gen_range(0..turns.len())];
            board.execute_turn(&turn, color).unwrap();
            color = color.opponent();
        }
        (board, color)
    }

    #[test]
    fn test_fixture_layout() {
        let board = Board::fixture(&RuleSet::standard());
        for color in [Player::White, Player::Black] {
            assert_eq!(board.home(color), 8);
            assert_eq!(board.total_pieces(color), 8);
        }
        for y in 0..6 {
            assert!(board.square(Cell::new(0, y)).is_empty());
            assert!(board.square(Cell::new(1, y)).is_empty());
        }
        assert!(board.square(Cell::new(2, 0)).is_empty());
        assert!(board.square(Cell::new(4, 0)).is_empty());
        assert!(board.square(Cell::new(5, 0)).is_turtle());
        assert!(board.square(Cell::new(6, 1)).is_turtle());
        assert_eq!(board.spare(), Tile::Open);
    }

    #[test]
    fn test_small_fixture_layout() {
        let board = Board::fixture(&RuleSet::small());
        let turtles: Vec<(i8, i8)> = board
            .geometry()
            .cells()
            .filter(|&cell| board.square(cell).is_turtle())
            .map(|cell| (cell.x, cell.y))
            .collect();
        assert_eq!(
            turtles,
            vec![
                (2, 0), (3, 0), (4, 0), (5, 0),
                (0, 1), (2, 1),
                (4, 2),
                (1, 3), (3, 3), (5, 3),
                (1, 4), (5, 4),
            ]
        );
        assert_eq!(board.spare(), Tile::OpenTurtle);
        assert_eq!(board.home(Player::White), 8);

        // Only the two open cells of the bottom row admit White
        let actions = board.legal_turns(Player::White);
        assert_eq!(actions.len(), 4);
        assert!(actions.iter().all(|t| t.first.from == Position::Home && t.insert % 5 == 0));
    }

    #[test]
    fn test_fixture_first_moves_avoid_turtles() {
        let board = Board::fixture(&RuleSet::standard());
        let steps = board.legal_moves(Player::White);
        assert!(!steps.is_empty());
        for step in &steps {
            assert_eq!(step.mv.from, Position::Home);
            let cell = step.mv.to.cell().unwrap();
            assert_eq!(cell.y, 0);
            assert!(!board.square(cell).is_turtle());
            assert!(!step.seconds.is_empty());
        }
    }

    #[test]
    fn test_random_setup_uses_whole_supply() {
        let ruleset = RuleSet::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            let board = Board::random(&ruleset, &mut rng).unwrap();
            let on_board = board.squares.iter().filter(|sq| sq.is_turtle()).count();
            let in_spare = board.spare().squares().iter().filter(|sq| sq.is_turtle()).count();
            let expected = 2 * ruleset.tiles.double_turtle as usize + ruleset.tiles.single_turtle as usize;
            assert_eq!(on_board + in_spare, expected);
        }
    }

    #[test]
    fn test_stack_height_sets_distance() {
        let mut board = standard_empty();
        board.place(Cell::new(3, 2), Player::Black).unwrap();
        board.place(Cell::new(3, 2), Player::White).unwrap();

        let moves = board.step_moves(Player::White, None);
        let from = Position::at(3, 2);
        let targets: Vec<Position> = moves
            .iter()
            .filter(|mv| mv.from == from)
            .map(|mv| mv.to)
            .collect();
        assert_eq!(
            targets,
            vec![Position::at(5, 2), Position::at(3, 4), Position::at(1, 2), Position::at(3, 0)]
        );
    }

    #[test]
    fn test_turtle_blocks_path_and_destination() {
        let mut board = standard_empty();
        board.place(Cell::new(3, 1), Player::White).unwrap();
        board.place(Cell::new(3, 1), Player::White).unwrap();
        board.set_terrain(Cell::new(3, 2), true).unwrap();
        board.set_terrain(Cell::new(1, 1), true).unwrap();

        let moves = board.step_moves(Player::White, None);
        let from = Position::at(3, 1);
        assert!(!moves.contains(&Move::new(from, Position::at(3, 3))));
        assert!(!moves.contains(&Move::new(from, Position::at(1, 1))));
        assert!(moves.contains(&Move::new(from, Position::at(5, 1))));
    }

    #[test]
    fn test_full_stack_is_not_a_destination() {
        let mut board = standard_empty();
        for color in [Player::Black, Player::White, Player::Black] {
            board.place(Cell::new(4, 3), color).unwrap();
        }
        board.place(Cell::new(4, 2), Player::White).unwrap();

        let moves = board.step_moves(Player::White, None);
        assert!(!moves.contains(&Move::new(Position::at(4, 2), Position::at(4, 3))));
        assert!(moves.contains(&Move::new(Position::at(4, 2), Position::at(5, 2))));
    }

    #[test]
    fn test_exits_go_home_or_score() {
        let mut board = standard_empty();
        board.place(Cell::new(0, 5), Player::White).unwrap();
        let moves = board.step_moves(Player::White, None);
        let from = Position::at(0, 5);
        assert!(moves.contains(&Move::new(from, Position::Score)));
        assert!(moves.contains(&Move::new(from, Position::Home)));
    }

    #[test]
    fn test_corner_exit_listed_once() {
        let mut board = standard_empty();
        board.place(Cell::new(0, 0), Player::White).unwrap();
        let from_corner: Vec<Move> = board
            .step_moves(Player::White, None)
            .into_iter()
            .filter(|mv| mv.from == Position::at(0, 0))
            .collect();
        assert_eq!(
            from_corner,
            vec![
                Move::new(Position::at(0, 0), Position::at(1, 0)),
                Move::new(Position::at(0, 0), Position::at(0, 1)),
                Move::new(Position::at(0, 0), Position::Home),
            ]
        );
    }

    #[test]
    fn test_no_home_entries_without_pieces_at_home() {
        let mut board = standard_empty();
        for x in 0..7 {
            board.place(Cell::new(x, 2), Player::White).unwrap();
        }
        assert_eq!(board.home(Player::White), 1);
        assert!(board
            .step_moves(Player::White, None)
            .iter()
            .any(|mv| mv.from == Position::Home));

        board.place(Cell::new(7, 2), Player::White).unwrap();
        assert_eq!(board.home(Player::White), 0);
        let moves = board.step_moves(Player::White, None);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|mv| mv.from != Position::Home));
        assert!(board.legal_moves(Player::White).iter().all(|s| s.mv.from != Position::Home));
    }

    #[test]
    fn test_landing_home_skips_insertion() {
        let ruleset = RuleSet::small();
        let fixture = Board::fixture(&ruleset);
        let mut board = fixture.clone();
        board.place(Cell::new(0, 0), Player::White).unwrap();

        let no_insert = board.geometry().no_insert();
        let back_home = Turn {
            first: Move::new(Position::at(0, 0), Position::Home),
            second: None,
            insert: no_insert,
        };
        assert!(board.legal_turns(Player::White).contains(&back_home));
        let pushed = Turn { insert: 0, ..back_home };
        assert!(!board.is_legal_turn(&pushed, Player::White));

        board.execute_turn(&back_home, Player::White).unwrap();
        // Every row and the spare are as laid out, the piece is home again
        assert_eq!(board, fixture);
        assert_eq!(board.spare(), Tile::OpenTurtle);
    }

    #[test]
    fn test_no_reversal_in_second_moves() {
        for seed in 0..5 {
            let (board, color) = midgame(seed, 12);
            for step in board.legal_moves(color) {
                let reversal = step.mv.reversed();
                assert!(step.seconds.iter().all(|s| s.mv != reversal));
            }
        }
    }

    #[test]
    fn test_insert_from_left() {
        let mut board = standard_empty();
        board.place(Cell::new(0, 2), Player::White).unwrap();
        board.place(Cell::new(6, 2), Player::Black).unwrap();
        board.place(Cell::new(7, 2), Player::White).unwrap();
        board.set_terrain(Cell::new(5, 2), true).unwrap();
        board.set_spare(Tile::TurtleOpen);

        board.insert_tile(2).unwrap();

        assert!(board.square(Cell::new(0, 2)).is_turtle());
        assert!(board.square(Cell::new(1, 2)).is_empty());
        assert_eq!(board.square(Cell::new(2, 2)).top(), Some(Player::White));
        assert!(board.square(Cell::new(7, 2)).is_turtle());
        assert_eq!(board.spare(), Tile::Open);
        assert_eq!(board.home(Player::White), 7);
        assert_eq!(board.home(Player::Black), 8);
        for color in [Player::White, Player::Black] {
            assert_eq!(board.total_pieces(color), 8);
        }
    }

    #[test]
    fn test_insert_from_right() {
        let mut board = standard_empty();
        board.set_terrain(Cell::new(0, 4), true).unwrap();
        board.place(Cell::new(1, 4), Player::Black).unwrap();
        board.place(Cell::new(2, 4), Player::Black).unwrap();
        board.set_spare(Tile::OpenTurtle);

        board.insert_tile(6 + 4).unwrap();

        assert_eq!(board.square(Cell::new(0, 4)).top(), Some(Player::Black));
        assert!(board.square(Cell::new(6, 4)).is_empty());
        assert!(board.square(Cell::new(7, 4)).is_turtle());
        assert_eq!(board.spare(), Tile::TurtleOpen);
        assert_eq!(board.home(Player::Black), 7);
        assert_eq!(board.total_pieces(Player::Black), 8);
        assert_eq!(board.insert_tile(12), Err(GameError::InvalidInsert { slot: 12 }));
    }

    #[test]
    fn test_fixture_end_to_end_turn() {
        let mut board = Board::fixture(&RuleSet::standard());
        let before = board.state_key();
        let turn = Turn {
            first: Move::new(Position::Home, Position::at(0, 0)),
            second: Some(Move::new(Position::at(0, 0), Position::at(0, 1))),
            insert: 1,
        };
        assert!(board.legal_turns(Player::White).contains(&turn));

        board.execute_turn(&turn, Player::White).unwrap();

        assert_eq!(board.total_pieces(Player::White), 8);
        assert_eq!(board.square(Cell::new(2, 1)).top(), Some(Player::White));
        assert_eq!(board.spare(), Tile::TurtleOpen);
        assert_ne!(board.state_key(), before);
    }

    #[test]
    fn test_illegal_turn_leaves_board_untouched() {
        let mut board = Board::fixture(&RuleSet::standard());
        let snapshot = board.clone();
        let turn = Turn {
            first: Move::new(Position::Home, Position::at(0, 0)),
            second: Some(Move::new(Position::at(0, 1), Position::at(0, 0))),
            insert: 0,
        };
        assert!(matches!(
            board.execute_turn(&turn, Player::White),
            Err(GameError::IllegalMove { .. })
        ));
        assert_eq!(board, snapshot);

        let skipped_second = Turn {
            first: Move::new(Position::Home, Position::at(0, 0)),
            second: None,
            insert: 0,
        };
        assert!(board.execute_turn(&skipped_second, Player::White).is_err());
    }

    #[test]
    fn test_random_play_conserves_pieces() {
        for seed in 0..5 {
            let (board, _) = midgame(100 + seed, 30);
            for color in [Player::White, Player::Black] {
                assert_eq!(board.total_pieces(color), 8);
            }
            assert!(board.squares.iter().all(|sq| sq.height() <= 3));
        }
    }

    #[test]
    fn test_win_by_score() {
        let ruleset = RuleSet::small();
        let mut board = Board::empty(ruleset.rules());
        board.place(Cell::new(2, 4), Player::White).unwrap();
        let turn = Turn {
            first: Move::new(Position::at(2, 4), Position::Score),
            second: None,
            insert: 3,
        };
        board.execute_turn(&turn, Player::White).unwrap();
        assert!(board.is_win(Player::White));
        assert_eq!(board.result(), GameResult::WhiteWins);
    }

    #[test]
    fn test_win_by_stalemate() {
        let mut board = standard_empty();
        for x in 0..8 {
            board.set_terrain(Cell::new(x, 5), true).unwrap();
        }
        assert!(!board.has_legal_moves(Player::Black));
        assert!(board.is_win(Player::White));
        assert!(!board.is_win(Player::Black));
    }

    #[test]
    fn test_state_key_is_exact() {
        let board = Board::fixture(&RuleSet::standard());
        assert_eq!(board.state_key(), board.clone().state_key());
        assert_eq!(board.state_key().as_bytes().len(), 48 * 2 + 5);

        let mut other = board.clone();
        other.set_spare(Tile::DoubleTurtle);
        assert_ne!(board.state_key(), other.state_key());
    }

    #[test]
    fn test_flipped_is_involution() {
        let (board, _) = midgame(7, 10);
        assert_eq!(board.flipped().flipped(), board);
        assert_eq!(board.flipped().home(Player::White), board.home(Player::Black));
    }
}
