//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Cell colours in engine order: red, green, blue, yellow, purple, pink.
    pub cells: [Color; 6],
    pub rainbow: Color,
    pub cross: Color,
    /// Background behind the cursor cell.
    pub cursor: Color,
    /// Background behind the picked cell.
    pub selection: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, objectives).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (key hints).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const ONEDARK_CELLS: [Color; 6] = [
    rgb(0xE06C75), // red
    rgb(0x98C379), // green
    rgb(0x61AFEF), // blue
    rgb(0xE5C07B), // yellow
    rgb(0xC678DD), // purple
    rgb(0xFF8FC7), // pink
];

const HIGH_CONTRAST_CELLS: [Color; 6] = [
    rgb(0xFF0000),
    rgb(0x00FF00),
    rgb(0x0088FF),
    rgb(0xFFFF00),
    rgb(0xAA00FF),
    rgb(0xFF66CC),
];

// Tol "bright" scheme; red and green never carry meaning on their own.
const COLORBLIND_CELLS: [Color; 6] = [
    rgb(0xCC3311),
    rgb(0x009988),
    rgb(0x0077BB),
    rgb(0xEE7733),
    rgb(0x33BBEE),
    rgb(0xEE3377),
];

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            cells: ONEDARK_CELLS,
            rainbow: rgb(0xFFFFFF),
            cross: rgb(0x56B6C2),
            cursor: rgb(0x5C6370),
            selection: rgb(0xABB2BF),
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` then overrides the cell colours for high-contrast or colorblind play.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.cells = HIGH_CONTRAST_CELLS,
            Palette::Colorblind => self.cells = COLORBLIND_CELLS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        // Keys match onedark.theme.
        Self {
            cells: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.cells[0]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.cells[1]),
                get("cpu_box").unwrap_or(d.cells[2]),
                get("cpu_mid").unwrap_or(d.cells[3]),
                get("net_box").unwrap_or(d.cells[4]),
                get("proc_box").unwrap_or(d.cells[5]),
            ],
            rainbow: get("hi_fg").unwrap_or(d.rainbow),
            cross: get("proc_misc").unwrap_or(d.cross),
            cursor: get("selected_bg").unwrap_or(d.cursor),
            selection: get("selected_fg").unwrap_or(d.selection),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Colour for an engine colour.
    #[inline]
    pub fn cell_color(&self, color: matchtui::Color) -> Color {
        self.cells[color.index() % self.cells.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(bad)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(bad()),
    }
}
