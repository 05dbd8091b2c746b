//! matchtui: match-three tile puzzle in the terminal.

mod app;
mod input;
mod replay;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use matchtui::{Color, GameConfig};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, &args.log_level)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = args.game_config();
    config.validate()?;
    tracing::info!(?config, "starting");
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &std::path::Path, level: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter = EnvFilter::try_new(level).with_context(|| format!("bad log level {level:?}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Match-three tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matchtui",
    version,
    about = "Match-three tile puzzle in the terminal. Line up three or more of a colour to clear them.",
    long_about = "matchtui is a terminal match-three puzzle.\n\n\
        Swap two neighbouring tiles to line up three or more of one colour, in a row, column or \
        diagonal. Cleared tiles fall and new ones drop in, which may chain further matches. A line \
        of four leaves a cross tile (clears a row or column), five or more a rainbow tile (clears \
        every tile of the colour it is swapped with). Clear the objective count of every colour to win.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor    Space/Enter  Pick / swap with picked\n  \
        Mouse click  Pick / swap    x            Drop pick\n  P            Pause          R  Restart    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Grid width in cells.
    #[arg(long, default_value = "8", value_name = "COLS", value_parser = clap::value_parser!(u16).range(3..=20))]
    pub width: u16,

    /// Grid height in cells.
    #[arg(long, default_value = "8", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(3..=20))]
    pub height: u16,

    /// Number of colours in play (red, green, blue, yellow, purple, pink, in that order).
    /// Grids larger than 10x10 need at least 5.
    #[arg(short, long, default_value = "6", value_name = "N", value_parser = clap::value_parser!(u8).range(4..=6))]
    pub colors: u8,

    /// Cells of each colour to clear to win.
    #[arg(short, long, default_value = "10", value_name = "N")]
    pub objective: u32,

    /// Rainbow cells stop appearing while this many are on the grid.
    #[arg(long, default_value = "2", value_name = "N")]
    pub max_rainbows: usize,

    /// RNG seed for a reproducible game.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Delay between cascade steps while a move plays out.
    #[arg(long, default_value = "160", value_name = "MS")]
    pub step_ms: u64,

    /// Disable cascade animation (board updates at once).
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write tracing output to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `matchtui=trace`.
    #[arg(long, default_value = "info", value_name = "FILTER")]
    pub log_level: String,
}

impl Args {
    pub fn game_config(&self) -> GameConfig {
        let palette = Color::palette(self.colors as usize);
        GameConfig {
            width: self.width as usize,
            height: self.height as usize,
            objectives: vec![self.objective; palette.len()],
            palette,
            max_rainbow_cells: self.max_rainbows,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_a_valid_config() {
        let args = Args::parse_from(["matchtui"]);
        let config = args.game_config();
        assert_eq!(config, GameConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::parse_from([
            "matchtui", "--width", "5", "--height", "6", "-c", "4", "-o", "3", "-s", "42",
        ]);
        let config = args.game_config();
        assert_eq!((config.width, config.height), (5, 6));
        assert_eq!(config.palette.len(), 4);
        assert_eq!(config.objectives, vec![3; 4]);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn too_few_colours_are_rejected() {
        assert!(Args::try_parse_from(["matchtui", "--colors", "2"]).is_err());
        assert!(Args::try_parse_from(["matchtui", "--width", "1"]).is_err());
    }

    #[test]
    fn large_grids_need_five_colours() {
        let config = |colors: &str| {
            Args::parse_from(["matchtui", "--width", "20", "--height", "20", "-c", colors])
                .game_config()
        };
        assert!(config("4").validate().is_err());
        assert!(config("5").validate().is_ok());
        let boundary = Args::parse_from(["matchtui", "--width", "10", "--height", "10", "-c", "4"]);
        assert!(boundary.game_config().validate().is_ok());
    }
}
