//! Game session: the cascade controller plus score objectives for one play-through.

use crate::cascade::{Cascade, CascadeOutcome, CascadeState, min_colors};
use crate::cell::Color;
use crate::error::EngineError;
use crate::grid::{Grid, Pos};
use crate::score::ScoreManager;
use tracing::{debug, info};

/// Engine-side settings. The front-end builds this from its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Colours in play; also the tracked score colours, in display order.
    pub palette: Vec<Color>,
    /// One objective per palette colour.
    pub objectives: Vec<u32>,
    /// Rainbows stop spawning while this many are on the grid. The count is
    /// checked once per removal pass, so a pass with several runs of five can
    /// leave more than this on the grid.
    pub max_rainbow_cells: usize,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            palette: Color::ALL.to_vec(),
            objectives: vec![10; Color::ALL.len()],
            max_rainbow_cells: 2,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Checks a config used to generate a fresh grid: the shape checks of
    /// [`GameConfig::validate_shape`] plus enough colours for the grid area.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.validate_shape()?;
        let needed = min_colors(self.width, self.height);
        if self.palette.len() < needed {
            return Err(EngineError::InvalidConfig(format!(
                "a {}x{} grid needs at least {needed} colours, got {}",
                self.width,
                self.height,
                self.palette.len()
            )));
        }
        Ok(())
    }

    /// Dimensions, palette and objectives only. Enough for a caller-supplied grid.
    pub fn validate_shape(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.palette.is_empty() {
            return Err(EngineError::InvalidConfig("palette is empty".into()));
        }
        for (i, c) in self.palette.iter().enumerate() {
            if self.palette[..i].contains(c) {
                return Err(EngineError::InvalidConfig(format!(
                    "colour {c} listed twice"
                )));
            }
        }
        if self.objectives.len() != self.palette.len() {
            return Err(EngineError::ObjectiveMismatch {
                colors: self.palette.len(),
                objectives: self.objectives.len(),
            });
        }
        Ok(())
    }
}

/// One play-through: authoritative grid, RNG and score.
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    cascade: Cascade,
    score: ScoreManager,
    /// Requests that changed the grid.
    pub moves: u32,
    /// Longest chain of removal passes from a single move.
    pub best_chain: usize,
}

impl GameState {
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let score = ScoreManager::new(config.palette.clone(), config.objectives.clone())?;
        let cascade = Cascade::new(
            config.width,
            config.height,
            config.palette.clone(),
            config.max_rainbow_cells,
            config.seed,
        )?;
        debug!(
            width = config.width,
            height = config.height,
            colors = config.palette.len(),
            "new game"
        );
        Ok(Self {
            config,
            cascade,
            score,
            moves: 0,
            best_chain: 0,
        })
    }

    /// Session over a caller-supplied grid (which may still hold runs).
    pub fn with_grid(config: GameConfig, grid: Grid) -> Result<Self, EngineError> {
        config.validate_shape()?;
        if (grid.width(), grid.height()) != (config.width, config.height) {
            return Err(EngineError::InvalidConfig(format!(
                "grid is {}x{} but the config says {}x{}",
                grid.width(),
                grid.height(),
                config.width,
                config.height
            )));
        }
        let score = ScoreManager::new(config.palette.clone(), config.objectives.clone())?;
        let cascade = Cascade::from_grid(
            grid,
            config.palette.clone(),
            config.max_rainbow_cells,
            config.seed,
        );
        Ok(Self {
            config,
            cascade,
            score,
            moves: 0,
            best_chain: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        self.cascade.grid()
    }

    pub fn score(&self) -> &ScoreManager {
        &self.score
    }

    pub fn state(&self) -> CascadeState {
        self.cascade.state()
    }

    pub fn live_rainbows(&self) -> usize {
        self.cascade.live_rainbows()
    }

    pub fn is_complete(&self) -> bool {
        self.score.is_complete()
    }

    /// Swap two adjacent cells (or fire a special) and credit every removal.
    /// Once all objectives are met the grid is frozen and requests are no-ops.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<CascadeOutcome, EngineError> {
        if self.is_complete() {
            return Ok(CascadeOutcome::unchanged(self.grid()));
        }
        let before = self.grid().clone();
        let outcome = self.cascade.request_swap(a, b)?;
        self.credit(&outcome, &before);
        Ok(outcome)
    }

    /// Fire the special cell at `special` against `other` and credit every removal.
    pub fn activate(&mut self, special: Pos, other: Pos) -> Result<CascadeOutcome, EngineError> {
        if self.is_complete() {
            return Ok(CascadeOutcome::unchanged(self.grid()));
        }
        let before = self.grid().clone();
        let outcome = self.cascade.request_special_activation(special, other)?;
        self.credit(&outcome, &before);
        Ok(outcome)
    }

    fn credit(&mut self, outcome: &CascadeOutcome, before: &Grid) {
        if outcome.grid == *before && outcome.is_noop() {
            return;
        }
        self.moves += 1;
        self.best_chain = self.best_chain.max(outcome.chain_length());
        for counts in outcome.phases.iter().filter_map(|p| p.counts()) {
            self.score.update_from_map(counts);
        }
        if self.is_complete() {
            info!(moves = self.moves, "all objectives met");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::grid::tests::grid;

    fn small_config(objective: u32) -> GameConfig {
        GameConfig {
            width: 4,
            height: 4,
            palette: vec![Color::Red, Color::Green, Color::Blue],
            objectives: vec![objective; 3],
            max_rainbow_cells: 2,
            seed: Some(17),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_configs_are_rejected() {
        let mut c = GameConfig::default();
        c.width = 0;
        assert!(matches!(c.validate(), Err(EngineError::InvalidConfig(_))));

        let mut c = GameConfig::default();
        c.palette = vec![Color::Red, Color::Red];
        c.objectives = vec![1, 1];
        assert!(matches!(c.validate(), Err(EngineError::InvalidConfig(_))));

        let mut c = GameConfig::default();
        c.objectives.pop();
        assert_eq!(
            GameState::new(c).unwrap_err(),
            EngineError::ObjectiveMismatch {
                colors: 6,
                objectives: 5
            }
        );
    }

    #[test]
    fn palette_must_cover_the_grid_area() {
        let sized = |width, height, colors| GameConfig {
            width,
            height,
            palette: Color::palette(colors),
            objectives: vec![10; colors],
            ..GameConfig::default()
        };
        assert!(sized(10, 10, 4).validate().is_ok());
        assert!(matches!(
            sized(11, 10, 4).validate(),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            GameState::new(sized(20, 20, 4)).unwrap_err(),
            EngineError::InvalidConfig(_)
        ));
        assert!(sized(20, 20, 5).validate().is_ok());
        assert!(sized(5, 5, 3).validate().is_ok());
        assert!(sized(6, 5, 3).validate().is_err());
    }

    #[test]
    fn largest_allowed_config_starts_a_game() {
        let config = GameConfig {
            width: 20,
            height: 20,
            palette: Color::palette(5),
            objectives: vec![10; 5],
            seed: Some(8),
            ..GameConfig::default()
        };
        let game = GameState::new(config).unwrap();
        assert_eq!(game.grid().count(Cell::is_empty), 0);
    }

    #[test]
    fn supplied_grid_must_match_the_config() {
        let start = grid(
            "RGB
             GBR
             BRG",
        );
        assert!(matches!(
            GameState::with_grid(small_config(5), start),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn swap_credits_the_score() {
        let start = grid(
            "RGBGB
             GBRBR
             RRGRG
             BGBGB",
        );
        let mut config = small_config(100);
        config.width = 5;
        let mut game = GameState::with_grid(config, start).unwrap();
        let out = game.swap((2, 1), (2, 2)).unwrap();
        let total: u32 = game.score().scores().iter().sum();
        assert_eq!(total, out.removed_count());
        assert!(game.score().score_of(Color::Red).unwrap() >= 4);
        assert_eq!(game.moves, 1);
        assert!(game.best_chain >= 1);
    }

    #[test]
    fn completed_game_ignores_moves() {
        let start = grid(
            "RGBGB
             GBRBR
             RRGRG
             BGBGB",
        );
        let mut config = small_config(0);
        config.width = 5;
        let mut game = GameState::with_grid(config, start.clone()).unwrap();
        assert!(game.is_complete());
        let out = game.swap((2, 1), (2, 2)).unwrap();
        assert!(out.is_noop());
        assert_eq!(game.grid(), &start);
        assert_eq!(game.moves, 0);
    }

    #[test]
    fn swap_without_match_still_counts_as_a_move() {
        let start = grid(
            "RBGB
             BGGB
             RRBR
             BGBR",
        );
        let mut game = GameState::with_grid(small_config(5), start.clone()).unwrap();
        let out = game.swap((0, 0), (1, 0)).unwrap();
        assert!(out.is_noop());
        assert_eq!(game.grid().at((0, 0)), start.at((1, 0)));
        assert_eq!(game.moves, 1);
        assert_eq!(game.best_chain, 0);
    }

    #[test]
    fn invalid_swap_leaves_score_untouched() {
        let mut game = GameState::new(small_config(5)).unwrap();
        assert!(game.swap((0, 0), (3, 3)).is_err());
        assert_eq!(game.score().scores(), &[0, 0, 0]);
        assert_eq!(game.grid().count(Cell::is_empty), 0);
    }
}
