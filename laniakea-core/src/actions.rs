//! Flat action space
//!
//! Every geometrically possible move gets a stable id, and a turn is packed
//! into one integer by mixed radix:
//!
//! ```text
//! index = (id(first) * M2 + id(second)) * R + insert
//! ```
//!
//! `M` is the move count, `M2 = M + 1` when turns carry a second move (the
//! extra id stands for "no second move") and `1` otherwise, and
//! `R = 2 * rows + 1` covers every insertion slot plus the skip sentinel.

use crate::board::{Geometry, InsertSlot, Position, DIRECTIONS};
use crate::error::GameError;
use crate::game::{Move, Turn};
use crate::ruleset::Rules;
use rustc_hash::FxHashMap;

/// Index into the flat action space
pub type ActionIndex = u32;

/// Longest slide, equal to the tallest stack
const MAX_DISTANCE: i8 = 3;

/// Immutable move table plus the turn packing built on it
#[derive(Clone, Debug)]
pub struct ActionCodec {
    geometry: Geometry,
    second_move: bool,
    moves: Vec<Move>,
    ids: FxHashMap<Move, u32>,
}

impl ActionCodec {
    /// Build the move table from the board geometry
    pub fn new(rules: &Rules) -> Self {
        let geometry = rules.geometry;
        let mut codec = Self {
            geometry,
            second_move: rules.second_move,
            moves: Vec::new(),
            ids: FxHashMap::default(),
        };

        for from in geometry.cells() {
            for &(dx, dy) in &DIRECTIONS {
                for distance in 1..=MAX_DISTANCE {
                    let (x, y) = (from.x + dx * distance, from.y + dy * distance);
                    let to = if geometry.contains(x, y) {
                        Position::at(x, y)
                    } else {
                        Position::Home
                    };
                    codec.register(Move::new(Position::Board(from), to));
                }
            }
        }

        for x in 0..geometry.cols {
            codec.register(Move::new(Position::Home, Position::at(x, 0)));
            codec.register(Move::new(Position::Home, Position::at(x, geometry.rows - 1)));
        }

        // Scoring exits from each side's last three rows
        for x in 0..geometry.cols {
            for i in 0..MAX_DISTANCE {
                codec.register(Move::new(Position::at(x, i), Position::Score));
            }
        }
        for x in 0..geometry.cols {
            for i in 0..MAX_DISTANCE {
                codec.register(Move::new(Position::at(x, geometry.rows - 1 - i), Position::Score));
            }
        }

        codec
    }

    fn register(&mut self, mv: Move) {
        if !self.ids.contains_key(&mv) {
            self.ids.insert(mv, self.moves.len() as u32);
            self.moves.push(mv);
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Number of distinct moves `M`
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Reserved id meaning "no second move"
    pub fn null_move(&self) -> u32 {
        self.moves.len() as u32
    }

    /// Radix of the second-move digit
    pub fn second_radix(&self) -> u32 {
        if self.second_move {
            self.moves.len() as u32 + 1
        } else {
            1
        }
    }

    /// Radix of the insertion digit, including the skip sentinel
    pub fn insert_radix(&self) -> u32 {
        self.geometry.insert_slots() as u32 + 1
    }

    pub fn action_size(&self) -> usize {
        self.moves.len() * self.second_radix() as usize * self.insert_radix() as usize
    }

    /// Move table in id order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn move_id(&self, mv: &Move) -> Option<u32> {
        self.ids.get(mv).copied()
    }

    pub fn move_at(&self, id: u32) -> Option<Move> {
        self.moves.get(id as usize).copied()
    }

    fn second_digit(&self, second: Option<Move>) -> Result<u32, GameError> {
        match (second, self.second_move) {
            (None, true) => Ok(self.null_move()),
            (None, false) => Ok(0),
            (Some(mv), true) => self.move_id(&mv).ok_or(GameError::UnknownMove(mv)),
            (Some(mv), false) => Err(GameError::UnknownMove(mv)),
        }
    }

    /// Pack a turn into its action index
    pub fn encode(&self, turn: &Turn) -> Result<ActionIndex, GameError> {
        let first = self
            .move_id(&turn.first)
            .ok_or(GameError::UnknownMove(turn.first))?;
        let second = self.second_digit(turn.second)?;
        if turn.insert as u32 >= self.insert_radix() {
            return Err(GameError::InvalidInsert { slot: turn.insert });
        }
        Ok((first * self.second_radix() + second) * self.insert_radix() + turn.insert as u32)
    }

    /// Split an index into its (first, second, insert) digits
    pub fn split(&self, index: ActionIndex) -> Result<(u32, u32, u32), GameError> {
        if index as usize >= self.action_size() {
            return Err(GameError::InvalidAction {
                index: index as u64,
                size: self.action_size() as u64,
            });
        }
        let insert = index % self.insert_radix();
        let rest = index / self.insert_radix();
        Ok((rest / self.second_radix(), rest % self.second_radix(), insert))
    }

    /// Unpack an action index into a turn
    pub fn decode(&self, index: ActionIndex) -> Result<Turn, GameError> {
        let (first, second, insert) = self.split(index)?;
        let invalid = || GameError::InvalidAction {
            index: index as u64,
            size: self.action_size() as u64,
        };

        let first = self.move_at(first).ok_or_else(invalid)?;
        let second = if self.second_move && second != self.null_move() {
            Some(self.move_at(second).ok_or_else(invalid)?)
        } else {
            None
        };
        Ok(Turn {
            first,
            second,
            insert: insert as InsertSlot,
        })
    }

    fn mirror_move(&self, mv: Move) -> Move {
        Move::new(
            self.geometry.mirror_position(mv.from),
            self.geometry.mirror_position(mv.to),
        )
    }

    /// The same turn played by the other side of a rotated board
    pub fn mirror(&self, turn: &Turn) -> Turn {
        Turn {
            first: self.mirror_move(turn.first),
            second: turn.second.map(|mv| self.mirror_move(mv)),
            insert: self.geometry.mirror_slot(turn.insert),
        }
    }

    /// Mirror an action index
    pub fn mirror_action(&self, index: ActionIndex) -> Result<ActionIndex, GameError> {
        self.encode(&self.mirror(&self.decode(index)?))
    }
}

// ============================================================================
// ACTION MASK
// ============================================================================

/// Dense bitset over the action space
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionMask {
    words: Vec<u64>,
    len: usize,
}

impl ActionMask {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, index: ActionIndex) {
        let i = index as usize;
        if i < self.len {
            self.words[i / 64] |= 1 << (i % 64);
        }
    }

    pub fn contains(&self, index: ActionIndex) -> bool {
        let i = index as usize;
        i < self.len && self.words[i / 64] & (1 << (i % 64)) != 0
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ActionIndex> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| (w * 64 + bit) as ActionIndex)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;
    use crate::pieces::Player;
    use crate::ruleset::RuleSet;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn board_move(from: (i8, i8), to: (i8, i8)) -> Move {
        Move::new(Position::at(from.0, from.1), Position::at(to.0, to.1))
    }

    #[test]
    fn test_table_sizes() {
        let standard = ActionCodec::new(&RuleSet::standard().rules());
        assert_eq!(standard.move_count(), 520);
        assert_eq!(standard.second_radix(), 521);
        assert_eq!(standard.insert_radix(), 13);
        assert_eq!(standard.action_size(), 3_521_960);

        let small = ActionCodec::new(&RuleSet::small().rules());
        assert_eq!(small.move_count(), 300);
        assert_eq!(small.second_radix(), 1);
        assert_eq!(small.action_size(), 3_300);
    }

    #[test]
    fn test_table_order() {
        let codec = ActionCodec::new(&RuleSet::standard().rules());
        assert_eq!(codec.move_at(0), Some(board_move((0, 0), (1, 0))));
        assert_eq!(
            codec.move_at(6),
            Some(Move::new(Position::at(0, 0), Position::Home))
        );
        assert_eq!(
            codec.move_id(&Move::new(Position::Home, Position::at(0, 0))),
            Some(456)
        );
        assert_eq!(
            codec.move_id(&Move::new(Position::at(0, 0), Position::Score)),
            Some(472)
        );
    }

    #[test]
    fn test_round_trip_small_exhaustive() {
        let codec = ActionCodec::new(&RuleSet::small().rules());
        for index in 0..codec.action_size() as ActionIndex {
            let turn = codec.decode(index).unwrap();
            assert!(turn.second.is_none());
            assert_eq!(codec.encode(&turn).unwrap(), index);
        }
    }

    #[test]
    fn test_round_trip_standard_sampled() {
        let codec = ActionCodec::new(&RuleSet::standard().rules());
        for index in (0..codec.action_size() as ActionIndex).step_by(997) {
            let turn = codec.decode(index).unwrap();
            assert_eq!(codec.encode(&turn).unwrap(), index);
        }
        let last = codec.action_size() as ActionIndex - 1;
        let turn = codec.decode(last).unwrap();
        assert_eq!(turn.second, None);
        assert_eq!(turn.insert, 12);
    }

    #[test]
    fn test_invalid_indices_and_moves() {
        let codec = ActionCodec::new(&RuleSet::standard().rules());
        let size = codec.action_size() as ActionIndex;
        assert!(matches!(
            codec.decode(size),
            Err(GameError::InvalidAction { .. })
        ));

        let bogus = board_move((0, 0), (5, 5));
        let turn = Turn { first: bogus, second: None, insert: 0 };
        assert_eq!(codec.encode(&turn), Err(GameError::UnknownMove(bogus)));

        let turn = Turn { first: board_move((0, 0), (1, 0)), second: None, insert: 13 };
        assert_eq!(codec.encode(&turn), Err(GameError::InvalidInsert { slot: 13 }));

        let small = ActionCodec::new(&RuleSet::small().rules());
        let turn = Turn {
            first: board_move((0, 0), (1, 0)),
            second: Some(board_move((1, 0), (2, 0))),
            insert: 0,
        };
        assert!(small.encode(&turn).is_err());
    }

    #[test]
    fn test_mirror() {
        let codec = ActionCodec::new(&RuleSet::standard().rules());
        for &mv in codec.moves() {
            assert!(codec.move_id(&codec.mirror_move(mv)).is_some(), "{} has no mirror", mv);
        }

        let turn = Turn {
            first: Move::new(Position::Home, Position::at(2, 0)),
            second: Some(board_move((2, 0), (2, 1))),
            insert: 1,
        };
        let mirrored = codec.mirror(&turn);
        assert_eq!(mirrored.first, Move::new(Position::Home, Position::at(5, 5)));
        assert_eq!(mirrored.second, Some(board_move((5, 5), (5, 4))));
        assert_eq!(mirrored.insert, 10);
        assert_eq!(codec.mirror(&mirrored), turn);

        for index in (0..codec.action_size() as ActionIndex).step_by(1009) {
            let twice = codec.mirror_action(codec.mirror_action(index).unwrap()).unwrap();
            assert_eq!(twice, index);
        }
    }

    #[test]
    fn test_legal_turns_are_encodable() {
        let ruleset = RuleSet::standard();
        let codec = ActionCodec::new(&ruleset.rules());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::random(&ruleset, &mut rng).unwrap();
        let mut color = Player::White;

        for _ in 0..10 {
            let turns = board.legal_turns(color);
            if turns.is_empty() {
                break;
            }
            for turn in &turns {
                let index = codec.encode(turn).unwrap();
                assert_eq!(&codec.decode(index).unwrap(), turn);
            }
            let turn = turns[rng.gen_range(0..turns.len())];
            board.execute_turn(&turn, color).unwrap();
            color = color.opponent();
        }
    }

    #[test]
    fn test_action_mask() {
        let mut mask = ActionMask::new(130);
        for i in [0, 63, 64, 129, 500] {
            mask.set(i);
        }
        assert_eq!(mask.count(), 4);
        assert!(mask.contains(64));
        assert!(!mask.contains(65));
        assert!(!mask.contains(500));
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![0, 63, 64, 129]);
    }
}
