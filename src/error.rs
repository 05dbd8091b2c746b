//! Engine errors.

use crate::grid::Pos;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid swap between {a:?} and {b:?}: cells must be in bounds and 4-adjacent")]
    InvalidSwap { a: Pos, b: Pos },
    #[error("position ({x}, {y}) is outside the grid")]
    OutOfBounds { x: usize, y: usize },
    #[error("cell at ({x}, {y}) is not a special cell")]
    NotSpecial { x: usize, y: usize },
    #[error("{colors} tracked colours but {objectives} objectives")]
    ObjectiveMismatch { colors: usize, objectives: usize },
    #[error("starting grid did not settle after {passes} passes; use more colours")]
    Unsettled { passes: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
