//! Special-cell effects: rainbow (clear a colour) and cross (clear a row or column).

use crate::cell::Cell;
use crate::grid::{Grid, Pos};
use crate::score::ColorCounts;

/// Result of activating a special cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Removed cells per colour. Empty and special slots are swept but not credited.
    pub counts: ColorCounts,
    pub grid: Grid,
    /// Cleared coordinates (including the special cell itself), sorted.
    pub removed: Vec<Pos>,
}

impl Activation {
    pub fn removed_count(&self) -> u32 {
        self.counts.values().sum()
    }
}

fn sweep(grid: &Grid, targets: impl IntoIterator<Item = Pos>) -> Activation {
    let mut out = grid.clone();
    let mut counts = ColorCounts::new();
    let mut removed: Vec<Pos> = targets.into_iter().collect();
    removed.sort_unstable();
    removed.dedup();
    for &(x, y) in &removed {
        if let Some(color) = grid.at((x, y)).color() {
            *counts.entry(color).or_insert(0) += 1;
        }
        out.set(x, y, Cell::Empty);
    }
    Activation {
        counts,
        grid: out,
        removed,
    }
}

/// Remove the rainbow at `rainbow_pos` and every cell sharing `other`'s colour.
///
/// If `other` has no colour (special or empty) only the rainbow itself is removed.
pub fn activate_rainbow(grid: &Grid, rainbow_pos: Pos, other: Cell) -> Activation {
    let targets = std::iter::once(rainbow_pos).chain(
        other
            .color()
            .into_iter()
            .flat_map(|color| grid.positions().filter(move |&p| grid.at(p).color() == Some(color))),
    );
    sweep(grid, targets)
}

/// Remove the cross at `cross_pos` and, depending on where `other_pos` lies,
/// its whole column (same column) or whole row (same row).
pub fn activate_cross(grid: &Grid, cross_pos: Pos, other_pos: Pos) -> Activation {
    let (cx, cy) = cross_pos;
    let mut targets = vec![cross_pos];
    if other_pos.0 == cx {
        targets.extend((0..grid.height()).map(|y| (cx, y)));
    } else if other_pos.1 == cy {
        targets.extend((0..grid.width()).map(|x| (x, cy)));
    }
    sweep(grid, targets)
}
