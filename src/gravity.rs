//! Gravity and refill: compact each column downward, then top up the holes with random tokens.

use crate::cell::{Cell, Color};
use crate::grid::{Grid, Movement, apply_movements};
use rand::Rng;

/// Output of one [`fill`] pass.
#[derive(Debug, Clone)]
pub struct Fill {
    /// Gravity movements first (bottom-to-top), then refill spawns (bottom-to-top).
    pub movements: Vec<Movement>,
    /// Input grid with every relocated cell blanked at its origin: the cells that stayed at rest.
    pub intermediate: Grid,
    /// Settled grid: `intermediate` with all movements replayed. Has no empty slot.
    pub grid: Grid,
}

impl Fill {
    pub fn gravity_moves(&self) -> impl Iterator<Item = &Movement> {
        self.movements.iter().filter(|m| !m.is_spawn())
    }

    pub fn spawn_moves(&self) -> impl Iterator<Item = &Movement> {
        self.movements.iter().filter(|m| m.is_spawn())
    }

    /// Split the log into (gravity, refill); order inside each half is preserved.
    pub fn split(&self) -> (Vec<Movement>, Vec<Movement>) {
        self.movements.iter().partition(|m| !m.is_spawn())
    }
}

/// Apply gravity to `grid` and refill the remaining holes with cells drawn uniformly from `palette`.
///
/// An empty palette leaves the holes in place (no spawn movements are recorded).
pub fn fill<R: Rng + ?Sized>(grid: &Grid, palette: &[Color], rng: &mut R) -> Fill {
    let (w, h) = (grid.width(), grid.height());
    let mut settled = grid.clone();
    let mut intermediate = grid.clone();
    let mut movements = Vec::new();

    for y in (0..h).rev() {
        for x in 0..w {
            if !settled.at((x, y)).is_empty() {
                continue;
            }
            // Nearest occupied slot above the hole.
            let source = (0..y).rev().find(|&i| !settled.at((x, i)).is_empty());
            if let Some(i) = source {
                let cell = settled.at((x, i));
                movements.push(Movement::fall((x, i), (x, y), cell));
                settled.set(x, y, cell);
                settled.set(x, i, Cell::Empty);
                intermediate.set(x, i, Cell::Empty);
            }
        }
    }

    if !palette.is_empty() {
        for y in (0..h).rev() {
            for x in 0..w {
                if settled.at((x, y)).is_empty() {
                    let cell = Cell::Normal(palette[rng.random_range(0..palette.len())]);
                    settled.set(x, y, cell);
                    movements.push(Movement::spawn((x, y), cell));
                }
            }
        }
    }

    debug_assert_eq!(apply_movements(&intermediate, &movements), settled);
    Fill {
        movements,
        intermediate,
        grid: settled,
    }
}
