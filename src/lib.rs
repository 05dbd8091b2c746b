//! Match-3 grid engine: gravity and refill, run detection, special cells,
//! cascades and per-colour objectives.
//!
//! Every step takes a grid and returns a new one; randomness comes from an
//! explicit RNG handle so a seed reproduces a whole session.

pub mod alignment;
pub mod cascade;
pub mod cell;
pub mod error;
pub mod game;
pub mod gravity;
pub mod grid;
pub mod score;
pub mod special;

pub use alignment::{AlignmentResult, SpawnRules, detect, has_alignment};
pub use cascade::{
    Cascade, CascadeOutcome, CascadeState, Phase, PhaseKind, generate_initial_grid, min_colors,
};
pub use cell::{Cell, Color};
pub use error::EngineError;
pub use game::{GameConfig, GameState};
pub use gravity::{Fill, fill};
pub use grid::{Grid, Movement, Pos, apply_movements, is_adjacent, movements_from_grid};
pub use score::{ColorCounts, ScoreManager};
pub use special::{Activation, activate_cross, activate_rainbow};
