//! Game interface consumed by search
//!
//! Actions are always expressed from the mover's canonical perspective:
//! White's turns encode as-is, Black's turns are mirrored onto the rotated
//! board first. An action chosen on `canonical_form(state, player)` can
//! therefore be applied directly to `state` for `player`.

use crate::actions::{ActionCodec, ActionIndex, ActionMask};
use crate::error::GameError;
use crate::game::{Board, StateKey, Turn};
use crate::pieces::Player;
use crate::ruleset::RuleSet;
use rand::Rng;
use std::sync::Arc;

/// Rule variant plus its shared action table
#[derive(Clone, Debug)]
pub struct GameAdapter {
    ruleset: RuleSet,
    codec: Arc<ActionCodec>,
}

impl GameAdapter {
    pub fn new(ruleset: RuleSet) -> Result<Self, GameError> {
        ruleset.validate()?;
        let codec = Arc::new(ActionCodec::new(&ruleset.rules()));
        Ok(Self { ruleset, codec })
    }

    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }

    pub fn codec(&self) -> &Arc<ActionCodec> {
        &self.codec
    }

    pub fn action_size(&self) -> usize {
        self.codec.action_size()
    }

    /// Randomized starting board
    pub fn initial_state<R: Rng>(&self, rng: &mut R) -> Result<Board, GameError> {
        Board::random(&self.ruleset, rng)
    }

    /// Deterministic starting board
    pub fn initial_fixture(&self) -> Board {
        Board::fixture(&self.ruleset)
    }

    fn to_canonical(&self, turn: &Turn, player: Player) -> Turn {
        match player {
            Player::White => *turn,
            Player::Black => self.codec.mirror(turn),
        }
    }

    /// Decode an action into the turn `player` actually plays on the board
    pub fn turn_for(&self, action: ActionIndex, player: Player) -> Result<Turn, GameError> {
        let turn = self.codec.decode(action)?;
        Ok(self.to_canonical(&turn, player))
    }

    /// Sorted, deduplicated legal action indices
    pub fn legal_actions(&self, state: &Board, player: Player) -> Result<Vec<ActionIndex>, GameError> {
        let mut actions = state
            .legal_turns(player)
            .iter()
            .map(|turn| self.codec.encode(&self.to_canonical(turn, player)))
            .collect::<Result<Vec<_>, _>>()?;
        actions.sort_unstable();
        actions.dedup();
        Ok(actions)
    }

    /// Dense legality bitset over the whole action space
    pub fn valid_action_mask(&self, state: &Board, player: Player) -> Result<ActionMask, GameError> {
        let mut mask = ActionMask::new(self.action_size());
        for action in self.legal_actions(state, player)? {
            mask.set(action);
        }
        Ok(mask)
    }

    /// Play an action and hand the turn to the opponent
    pub fn apply_action(
        &self,
        state: &Board,
        player: Player,
        action: ActionIndex,
    ) -> Result<(Board, Player), GameError> {
        let turn = self.turn_for(action, player)?;
        let mut next = state.clone();
        next.execute_turn(&turn, player)?;
        Ok((next, player.opponent()))
    }

    /// Play a uniformly random legal turn, returning the action chosen
    pub fn apply_random_action<R: Rng>(
        &self,
        state: &Board,
        player: Player,
        rng: &mut R,
    ) -> Result<(Board, Player, ActionIndex), GameError> {
        let actions = self.legal_actions(state, player)?;
        if actions.is_empty() {
            return Err(GameError::NoLegalTurns { player });
        }
        let action = actions[rng.gen_range(0..actions.len())];
        let (next, to_move) = self.apply_action(state, player, action)?;
        Ok((next, to_move, action))
    }

    /// +1 if `player` has won, -1 if the opponent has, 0 otherwise
    pub fn terminal_value(&self, state: &Board, player: Player) -> i8 {
        if state.is_win(player) {
            1
        } else if state.is_win(player.opponent()) {
            -1
        } else {
            0
        }
    }

    /// Board as seen by `player`, who always plays White in this view
    pub fn canonical_form(&self, state: &Board, player: Player) -> Board {
        match player {
            Player::White => state.clone(),
            Player::Black => state.flipped(),
        }
    }

    pub fn state_key(&self, state: &Board) -> StateKey {
        state.state_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, Position};
    use crate::game::{GameResult, Move};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn adapter() -> GameAdapter {
        GameAdapter::new(RuleSet::standard()).unwrap()
    }

    /// Random positions with the side to move
    fn positions(adapter: &GameAdapter, seed: u64, plies: usize) -> Vec<(Board, Player)> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = adapter.initial_state(&mut rng).unwrap();
        let mut player = Player::White;
        let mut out = vec![(state.clone(), player)];
        for _ in 0..plies {
            if state.result() != GameResult::Ongoing {
                break;
            }
            let (next, to_move, _) = adapter.apply_random_action(&state, player, &mut rng).unwrap();
            state = next;
            player = to_move;
            out.push((state.clone(), player));
        }
        out
    }

    #[test]
    fn test_mask_matches_legal_actions() {
        let adapter = adapter();
        let state = adapter.initial_fixture();
        let actions = adapter.legal_actions(&state, Player::White).unwrap();
        let mask = adapter.valid_action_mask(&state, Player::White).unwrap();

        assert!(!actions.is_empty());
        assert_eq!(mask.len(), adapter.action_size());
        assert_eq!(mask.count(), actions.len());
        assert_eq!(mask.iter().collect::<Vec<_>>(), actions);
        assert_eq!(actions.len(), state.legal_turns(Player::White).len());
    }

    #[test]
    fn test_black_actions_match_canonical_white() {
        let adapter = adapter();
        for (state, player) in positions(&adapter, 11, 16) {
            if player != Player::Black {
                continue;
            }
            let canonical = adapter.canonical_form(&state, Player::Black);
            assert_eq!(
                adapter.legal_actions(&state, Player::Black).unwrap(),
                adapter.legal_actions(&canonical, Player::White).unwrap()
            );
        }
    }

    #[test]
    fn test_canonical_form_commutes_with_play() {
        let adapter = adapter();
        for (state, player) in positions(&adapter, 5, 12) {
            if player != Player::Black {
                continue;
            }
            let canonical = adapter.canonical_form(&state, Player::Black);
            for &action in adapter.legal_actions(&state, Player::Black).unwrap().iter().step_by(37) {
                let (next, _) = adapter.apply_action(&state, Player::Black, action).unwrap();
                let (expected, _) = adapter.apply_action(&canonical, Player::White, action).unwrap();
                assert_eq!(adapter.canonical_form(&next, Player::Black), expected);
            }
        }
    }

    #[test]
    fn test_canonical_form_involution() {
        let adapter = adapter();
        for (state, _) in positions(&adapter, 9, 10) {
            let once = adapter.canonical_form(&state, Player::Black);
            assert_eq!(adapter.canonical_form(&once, Player::Black), state);
            assert_eq!(adapter.canonical_form(&state, Player::White), state);
            assert_eq!(once.total_pieces(Player::White), state.total_pieces(Player::Black));
        }
    }

    #[test]
    fn test_apply_action_errors() {
        let adapter = adapter();
        let state = adapter.initial_fixture();
        let size = adapter.action_size() as ActionIndex;
        assert!(matches!(
            adapter.apply_action(&state, Player::White, size),
            Err(GameError::InvalidAction { .. })
        ));

        // Table move that is not legal on the fixture
        let turn = Turn {
            first: Move::new(Position::at(3, 3), Position::at(4, 3)),
            second: None,
            insert: 3,
        };
        let action = adapter.codec().encode(&turn).unwrap();
        assert!(matches!(
            adapter.apply_action(&state, Player::White, action),
            Err(GameError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_black_entry_is_mirrored() {
        let adapter = adapter();
        let state = adapter.initial_fixture();
        let turn = adapter
            .legal_actions(&state, Player::Black)
            .unwrap()
            .into_iter()
            .map(|a| adapter.turn_for(a, Player::Black).unwrap())
            .next()
            .unwrap();
        assert_eq!(turn.first.from, Position::Home);
        assert_eq!(turn.first.to.cell().map(|c| c.y), Some(5));
    }

    #[test]
    fn test_random_action_is_reproducible() {
        let adapter = adapter();
        let state = adapter.initial_fixture();
        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        let (next_a, player_a, action_a) = adapter.apply_random_action(&state, Player::White, &mut a).unwrap();
        let (next_b, _, action_b) = adapter.apply_random_action(&state, Player::White, &mut b).unwrap();
        assert_eq!(action_a, action_b);
        assert_eq!(next_a, next_b);
        assert_eq!(player_a, Player::Black);
        assert!(adapter.legal_actions(&state, Player::White).unwrap().contains(&action_a));
    }

    #[test]
    fn test_terminal_value() {
        let adapter = adapter();
        let mut state = adapter.initial_fixture();
        assert_eq!(adapter.terminal_value(&state, Player::White), 0);

        for x in 0..8 {
            state.set_terrain(Cell::new(x, 5), true).unwrap();
        }
        assert_eq!(adapter.terminal_value(&state, Player::White), 1);
        assert_eq!(adapter.terminal_value(&state, Player::Black), -1);
        assert!(matches!(
            adapter.apply_random_action(&state, Player::Black, &mut ChaCha8Rng::seed_from_u64(0)),
            Err(GameError::NoLegalTurns { player: Player::Black })
        ));
    }
}
