//! Grid: fixed-size matrix of cells, plus the movement log used to replay changes.

use crate::cell::{Cell, Color};
use std::fmt;

/// Grid coordinate as `(x, y)`; origin top-left.
pub type Pos = (usize, usize);

/// True if `a` and `b` differ by exactly one step on exactly one axis.
pub fn is_adjacent(a: Pos, b: Pos) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}

/// One physical change of the grid. `source == None` means a fresh cell entering from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub source: Option<Pos>,
    pub destination: Pos,
    pub cell: Cell,
}

impl Movement {
    pub fn fall(source: Pos, destination: Pos, cell: Cell) -> Self {
        Self {
            source: Some(source),
            destination,
            cell,
        }
    }

    pub fn spawn(destination: Pos, cell: Cell) -> Self {
        Self {
            source: None,
            destination,
            cell,
        }
    }

    #[inline]
    pub fn is_spawn(&self) -> bool {
        self.source.is_none()
    }
}

/// Playfield: rows[y][x]; rows[0] is the top. Dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Every slot `Empty`.
    pub fn new_empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: (0..height).map(|_| vec![Cell::Empty; width]).collect(),
        }
    }

    /// Build from rows (top first). Short rows are padded with `Empty`; the widest row sets the width.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Empty);
                r
            })
            .collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, (x, y): Pos) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Cell at `pos`, `Empty` outside the grid.
    #[inline]
    pub fn at(&self, (x, y): Pos) -> Cell {
        self.get(x, y).unwrap_or(Cell::Empty)
    }

    /// Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Exchange two slots. Both must be in bounds; otherwise nothing happens.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return;
        }
        let (ca, cb) = (self.at(a), self.at(b));
        self.set(a.0, a.1, cb);
        self.set(b.0, b.1, ca);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// All coordinates, row by row from the top.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    pub fn count(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.rows.iter().flatten().filter(|c| pred(**c)).count()
    }

    pub fn count_color(&self, color: Color) -> usize {
        self.count(|c| c == Cell::Normal(color))
    }

    pub fn has_empty(&self) -> bool {
        self.rows.iter().flatten().any(|c| c.is_empty())
    }

    /// Non-empty cells in column `x`.
    pub fn column_occupancy(&self, x: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.get(x).is_some_and(|c| !c.is_empty()))
            .count()
    }
}

impl fmt::Display for Grid {
    /// One character per cell: colour initial, `*` rainbow, `+` cross, `.` empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            for cell in row {
                let ch = match cell {
                    Cell::Empty => '.',
                    Cell::Rainbow => '*',
                    Cell::Cross => '+',
                    Cell::Normal(c) => match c {
                        Color::Red => 'R',
                        Color::Green => 'G',
                        Color::Blue => 'B',
                        Color::Yellow => 'Y',
                        Color::Purple => 'P',
                        Color::Pink => 'K',
                    },
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Replay a movement log onto `grid`: each destination receives its cell, each source becomes empty.
/// Movements are applied in order.
pub fn apply_movements(grid: &Grid, movements: &[Movement]) -> Grid {
    let mut out = grid.clone();
    for m in movements {
        if let Some((sx, sy)) = m.source {
            out.set(sx, sy, Cell::Empty);
        }
        let (dx, dy) = m.destination;
        out.set(dx, dy, m.cell);
    }
    out
}

/// Every slot as a spawn movement, bottom-to-top, left-to-right. Used to drop a whole grid in.
pub fn movements_from_grid(grid: &Grid) -> Vec<Movement> {
    let mut out = Vec::with_capacity(grid.width() * grid.height());
    for y in (0..grid.height()).rev() {
        for x in 0..grid.width() {
            out.push(Movement::spawn((x, y), grid.at((x, y))));
        }
    }
    out
}
