//! Cell contents: the six token colours and the tagged cell variant.

use std::fmt;

/// Token colours. Order is the palette order used by `--colors N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Pink,
}

impl Color {
    pub const ALL: [Self; 6] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Purple,
        Self::Pink,
    ];

    /// First `n` colours of [`Color::ALL`] (clamped to 1..=6).
    pub fn palette(n: usize) -> Vec<Self> {
        Self::ALL[..n.clamp(1, Self::ALL.len())].to_vec()
    }

    /// Index 0..6, used by the theme to pick a display colour.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One grid slot. Cells carry no position and no visual payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Normal(Color),
    /// Clears every cell of the colour it is swapped with.
    Rainbow,
    /// Clears the row or column it is swapped along.
    Cross,
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    #[inline]
    pub fn is_special(self) -> bool {
        matches!(self, Self::Rainbow | Self::Cross)
    }

    /// Colour of a normal cell; `None` for empty and special cells.
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Self::Normal(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Color> for Cell {
    fn from(c: Color) -> Self {
        Self::Normal(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_takes_prefix_and_clamps() {
        assert_eq!(Color::palette(2), vec![Color::Red, Color::Green]);
        assert_eq!(Color::palette(0), vec![Color::Red]);
        assert_eq!(Color::palette(99).len(), 6);
    }

    #[test]
    fn only_normal_cells_have_a_colour() {
        assert_eq!(Cell::Normal(Color::Blue).color(), Some(Color::Blue));
        assert_eq!(Cell::Rainbow.color(), None);
        assert_eq!(Cell::Cross.color(), None);
        assert_eq!(Cell::Empty.color(), None);
        assert!(Cell::Cross.is_special());
        assert!(!Cell::Empty.is_special());
    }
}
