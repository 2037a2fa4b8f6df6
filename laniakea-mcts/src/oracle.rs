//! Oracle trait for position evaluation.
//!
//! An oracle looks at a canonical board (White to move) and returns a prior
//! over actions plus a value estimate for the side to move. In AlphaZero
//! this is a neural network; this crate ships a uniform oracle and a
//! rollout oracle so search runs without one.

use laniakea_core::{ActionCodec, ActionIndex, Board, GameError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{component} policy has length {actual}, expected {expected}")]
    ShapeMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Prior over the action space.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// One weight per action index.
    Flat(Vec<f32>),
    /// Independent weights per action digit, multiplied together.
    /// Lengths are the move count, the second-move radix and the insert radix.
    Factorized {
        first: Vec<f32>,
        second: Vec<f32>,
        insert: Vec<f32>,
    },
}

/// Result of evaluating a board.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub policy: Policy,
    /// Value estimate for the side to move, in [-1, 1].
    pub value: f32,
}

/// Trait for position evaluators.
pub trait Oracle: Send + Sync {
    fn predict(&self, board: &Board) -> Result<Prediction, OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn predict(&self, board: &Board) -> Result<Prediction, OracleError> {
        (**self).predict(board)
    }
}

impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    fn predict(&self, board: &Board) -> Result<Prediction, OracleError> {
        (**self).predict(board)
    }
}

impl<T: Oracle + ?Sized> Oracle for Box<T> {
    fn predict(&self, board: &Board) -> Result<Prediction, OracleError> {
        (**self).predict(board)
    }
}

fn check_len(component: &'static str, weights: &[f32], expected: usize) -> Result<(), OracleError> {
    if weights.len() == expected {
        Ok(())
    } else {
        Err(OracleError::ShapeMismatch {
            component,
            expected,
            actual: weights.len(),
        })
    }
}

/// Negative and non-finite weights carry no mass
fn mass(weight: f32) -> f32 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Restrict a policy to the legal actions and renormalize
///
/// Returns one prior per entry of `legal`, or `None` when the policy puts
/// no mass on any legal action.
pub fn legal_priors(
    policy: &Policy,
    legal: &[ActionIndex],
    codec: &ActionCodec,
) -> Result<Option<Vec<f32>>, OracleError> {
    let weights: Vec<f32> = match policy {
        Policy::Flat(weights) => {
            check_len("flat", weights, codec.action_size())?;
            legal.iter().map(|&a| mass(weights[a as usize])).collect()
        }
        Policy::Factorized { first, second, insert } => {
            check_len("first", first, codec.move_count())?;
            check_len("second", second, codec.second_radix() as usize)?;
            check_len("insert", insert, codec.insert_radix() as usize)?;
            legal
                .iter()
                .map(|&a| {
                    let (f, s, i) = codec.split(a)?;
                    Ok(mass(first[f as usize]) * mass(second[s as usize]) * mass(insert[i as usize]))
                })
                .collect::<Result<_, GameError>>()?
        }
    };

    let total: f32 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Ok(None);
    }
    Ok(Some(weights.into_iter().map(|w| w / total).collect()))
}

/// Uniform oracle: equal weight on every action, neutral value.
#[derive(Debug, Clone)]
pub struct UniformOracle {
    codec: Arc<ActionCodec>,
}

impl UniformOracle {
    pub fn new(codec: Arc<ActionCodec>) -> Self {
        Self { codec }
    }

    /// Factorized policy with every weight set to one
    pub fn uniform_policy(codec: &ActionCodec) -> Policy {
        Policy::Factorized {
            first: vec![1.0; codec.move_count()],
            second: vec![1.0; codec.second_radix() as usize],
            insert: vec![1.0; codec.insert_radix() as usize],
        }
    }
}

impl Oracle for UniformOracle {
    fn predict(&self, _board: &Board) -> Result<Prediction, OracleError> {
        Ok(Prediction {
            policy: Self::uniform_policy(&self.codec),
            value: 0.0,
        })
    }
}
