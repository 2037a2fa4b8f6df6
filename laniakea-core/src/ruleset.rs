//! RuleSet - rule variant definition

use crate::board::Geometry;
use crate::error::GameError;
use crate::pieces::TileSupply;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete rule variant: board size, piece counts, win threshold,
/// turn shape and the physical tiles used at setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    pub cols: i8,
    pub rows: i8,
    pub pieces_per_side: u8,
    /// Scored pieces needed to win
    pub score_target: u8,
    /// Whether a turn carries a second move
    pub second_move: bool,
    pub tiles: TileSupply,
}

/// The parts of a rule set the engine consults during play
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rules {
    pub geometry: Geometry,
    pub pieces_per_side: u8,
    pub score_target: u8,
    pub second_move: bool,
}

impl Default for Rules {
    fn default() -> Self {
        RuleSet::standard().rules()
    }
}

impl RuleSet {
    /// Primary 8x6 variant: two moves per turn, five pieces to score
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            cols: 8,
            rows: 6,
            pieces_per_side: 8,
            score_target: 5,
            second_move: true,
            tiles: TileSupply {
                double_turtle: 4,
                single_turtle: 10,
                open: 5,
            },
        }
    }

    /// Reduced 6x5 variant: single move per turn, first score wins
    pub fn small() -> Self {
        Self {
            name: "small".to_string(),
            cols: 6,
            rows: 5,
            pieces_per_side: 8,
            score_target: 1,
            second_move: false,
            tiles: TileSupply {
                double_turtle: 3,
                single_turtle: 6,
                open: 2,
            },
        }
    }

    /// Look up a built-in variant
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "small" => Some(Self::small()),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.cols, self.rows)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            geometry: self.geometry(),
            pieces_per_side: self.pieces_per_side,
            score_target: self.score_target,
            second_move: self.second_move,
        }
    }

    /// Number of tiles drawn during randomized setup
    ///
    /// Each row is built from `cols / 2` two-cell tiles, one of which is a
    /// fixed open tile; one more draw provides the spare.
    pub fn setup_draws(&self) -> u32 {
        self.rows as u32 * (self.cols as u32 / 2 - 1) + 1
    }

    /// Check the variant is playable
    pub fn validate(&self) -> Result<(), GameError> {
        if self.cols < 4 || self.cols > 16 || self.cols % 2 != 0 {
            return Err(GameError::InvalidRuleSet(format!(
                "{}: columns must be an even number in 4..=16, got {}",
                self.name, self.cols
            )));
        }
        if self.rows < 3 || self.rows > 16 {
            return Err(GameError::InvalidRuleSet(format!(
                "{}: rows must be in 3..=16, got {}",
                self.name, self.rows
            )));
        }
        if self.pieces_per_side == 0 {
            return Err(GameError::InvalidRuleSet(format!(
                "{}: each side needs at least one piece",
                self.name
            )));
        }
        if self.score_target == 0 || self.score_target > self.pieces_per_side {
            return Err(GameError::InvalidRuleSet(format!(
                "{}: score target {} must be in 1..={}",
                self.name, self.score_target, self.pieces_per_side
            )));
        }
        if self.tiles.remaining() != self.setup_draws() {
            return Err(GameError::InvalidRuleSet(format!(
                "{}: tile supply holds {} tiles but setup draws {}",
                self.name,
                self.tiles.remaining(),
                self.setup_draws()
            )));
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule set {}", path.display()))?;
        let ruleset: RuleSet = serde_json::from_str(&content)
            .with_context(|| format!("parsing rule set {}", path.display()))?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
