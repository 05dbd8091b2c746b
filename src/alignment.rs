//! Alignment detection: runs of three or more identical colours in four directions.
//!
//! Every run is classified once, from its first member along the direction, so a run of five
//! is one run of five (rainbow spawn) and not also a run of four starting one cell later.

use crate::cell::{Cell, Color};
use crate::grid::{Grid, Pos};
use crate::score::ColorCounts;
use rand::Rng;
use std::collections::BTreeSet;

/// Shortest run that is removed.
pub const MIN_RUN: usize = 3;
/// Run length that spawns a cross cell.
pub const CROSS_RUN: usize = 4;
/// Run length from which a rainbow cell is spawned.
pub const RAINBOW_RUN: usize = 5;

/// Scan directions as (dx, dy): right, down, down-right, down-left.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Which special cells a detection pass may place on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnRules {
    pub rainbow: bool,
    pub cross: bool,
}

impl SpawnRules {
    /// No specials: used while generating the starting grid.
    pub const NONE: Self = Self {
        rainbow: false,
        cross: false,
    };
    pub const ALL: Self = Self {
        rainbow: true,
        cross: true,
    };
}

/// Result of one detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentResult {
    /// Removed cells per colour, one per coordinate.
    pub counts: ColorCounts,
    pub rainbow_spawns: u32,
    pub cross_spawns: u32,
    /// Input grid with removed cells emptied and requested specials placed.
    pub grid: Grid,
    /// Removed coordinates, sorted.
    pub removed: Vec<Pos>,
    /// Coordinates where a rainbow was placed (empty unless requested).
    pub rainbow_sites: Vec<Pos>,
    /// Coordinates where a cross was placed (empty unless requested).
    pub cross_sites: Vec<Pos>,
}

impl AlignmentResult {
    pub fn removed_count(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

fn step(grid: &Grid, (x, y): Pos, (dx, dy): (isize, isize)) -> Option<Pos> {
    let nx = x.checked_add_signed(dx)?;
    let ny = y.checked_add_signed(dy)?;
    grid.in_bounds((nx, ny)).then_some((nx, ny))
}

fn back(grid: &Grid, pos: Pos, (dx, dy): (isize, isize)) -> Option<Pos> {
    step(grid, pos, (-dx, -dy))
}

/// Members of the maximal run of `color` starting at `start` along `dir`.
fn run_from(grid: &Grid, start: Pos, dir: (isize, isize), color: Color) -> Vec<Pos> {
    let mut run = vec![start];
    let mut cur = start;
    while let Some(next) = step(grid, cur, dir) {
        if grid.at(next).color() != Some(color) {
            break;
        }
        run.push(next);
        cur = next;
    }
    run
}

/// Scan `grid` for runs, remove them, and optionally place special cells.
///
/// Only `Normal` cells take part in runs. Spawn sites are drawn from `rng` in scan order
/// (row by row, then right, down, down-right, down-left), so a seeded RNG gives a
/// reproducible result.
pub fn detect<R: Rng + ?Sized>(grid: &Grid, spawn: SpawnRules, rng: &mut R) -> AlignmentResult {
    let mut removed: BTreeSet<Pos> = BTreeSet::new();
    let mut rainbow_sites: BTreeSet<Pos> = BTreeSet::new();
    let mut cross_sites: BTreeSet<Pos> = BTreeSet::new();

    for pos in grid.positions() {
        let Some(color) = grid.at(pos).color() else {
            continue;
        };
        for dir in DIRECTIONS {
            // Not the first member: the run was classified from its start.
            if back(grid, pos, dir).is_some_and(|p| grid.at(p).color() == Some(color)) {
                continue;
            }
            let run = run_from(grid, pos, dir, color);
            if run.len() < MIN_RUN {
                continue;
            }
            removed.extend(run.iter().copied());
            if run.len() >= RAINBOW_RUN {
                rainbow_sites.insert(run[rng.random_range(0..run.len())]);
            } else if run.len() == CROSS_RUN {
                cross_sites.insert(run[rng.random_range(0..run.len())]);
            }
        }
    }

    let mut counts = ColorCounts::new();
    let mut out = grid.clone();
    for &(x, y) in &removed {
        if let Some(color) = grid.at((x, y)).color() {
            *counts.entry(color).or_insert(0) += 1;
        }
        out.set(x, y, Cell::Empty);
    }

    let cross_sites: Vec<Pos> = if spawn.cross {
        cross_sites
            .into_iter()
            .filter(|p| !(spawn.rainbow && rainbow_sites.contains(p)))
            .collect()
    } else {
        Vec::new()
    };
    let rainbow_sites: Vec<Pos> = if spawn.rainbow {
        rainbow_sites.into_iter().collect()
    } else {
        Vec::new()
    };
    for &(x, y) in &cross_sites {
        out.set(x, y, Cell::Cross);
    }
    for &(x, y) in &rainbow_sites {
        out.set(x, y, Cell::Rainbow);
    }

    AlignmentResult {
        counts,
        rainbow_spawns: rainbow_sites.len() as u32,
        cross_spawns: cross_sites.len() as u32,
        grid: out,
        removed: removed.into_iter().collect(),
        rainbow_sites,
        cross_sites,
    }
}

/// True if `grid` holds at least one run of [`MIN_RUN`] or more.
pub fn has_alignment(grid: &Grid) -> bool {
    grid.positions().any(|pos| {
        grid.at(pos).color().is_some_and(|color| {
            DIRECTIONS
                .iter()
                .any(|&dir| run_from(grid, pos, dir, color).len() >= MIN_RUN)
        })
    })
}
