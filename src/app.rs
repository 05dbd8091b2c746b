//! App: terminal init, main loop, cascade replay and key/mouse handling.

use crate::Args;
use crate::input::{Action, key_to_action};
use crate::replay::Replay;
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use matchtui::{GameConfig, GameState, Pos, is_adjacent};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Complete,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    cursor: Pos,
    selected: Option<Pos>,
    /// Cascade being shown; input on the board is ignored until it finishes.
    replay: Option<Replay>,
    /// TachyonFX fade for the cells currently flashing.
    removal_effect: Option<Effect>,
    /// Last time we processed the removal effect (for delta).
    removal_effect_process_time: Option<Instant>,
    quit_selected: QuitOption,
    /// Terminal area of the last frame, for mouse hit-testing.
    last_area: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(config.clone())?;
        Ok(Self {
            args,
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            cursor: (0, 0),
            selected: None,
            replay: None,
            removal_effect: None,
            removal_effect_process_time: None,
            quit_selected: QuitOption::Resume,
            last_area: Rect::default(),
        })
    }

    fn reset_game(&mut self) -> Result<()> {
        self.state = GameState::new(self.config.clone())?;
        self.screen = Screen::Playing;
        self.paused = false;
        self.cursor = (0, 0);
        self.selected = None;
        self.replay = None;
        self.clear_effect();
        info!("game restarted");
        Ok(())
    }

    fn clear_effect(&mut self) {
        self.removal_effect = None;
        self.removal_effect_process_time = None;
    }

    fn step_duration(&self) -> Duration {
        Duration::from_millis(self.args.step_ms)
    }

    fn move_cursor(&mut self, action: Action) {
        let (x, y) = self.cursor;
        let (w, h) = (self.state.grid().width(), self.state.grid().height());
        self.cursor = match action {
            Action::Left => (x.saturating_sub(1), y),
            Action::Right => ((x + 1).min(w - 1), y),
            Action::Up => (x, y.saturating_sub(1)),
            Action::Down => (x, (y + 1).min(h - 1)),
            _ => (x, y),
        };
    }

    /// Pick the cursor cell, or swap it with the picked one when they touch.
    fn select(&mut self) {
        let cursor = self.cursor;
        match self.selected {
            None => self.selected = Some(cursor),
            Some(p) if p == cursor => self.selected = None,
            Some(p) if is_adjacent(p, cursor) => {
                self.selected = None;
                self.swap(p, cursor);
            }
            Some(_) => self.selected = Some(cursor),
        }
    }

    fn swap(&mut self, a: Pos, b: Pos) {
        let before = self.state.grid().clone();
        let outcome = match self.state.swap(a, b) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "swap rejected");
                return;
            }
        };
        debug!(
            phases = outcome.phases.len(),
            removed = outcome.removed_count(),
            "swap resolved"
        );
        if self.args.no_animation || outcome.phases.is_empty() {
            self.after_move();
            return;
        }
        // Ordinary swaps are shown swapped before the cascade plays; specials fire in place.
        let mut start = before;
        if !start.at(a).is_special() && !start.at(b).is_special() {
            start.swap(a, b);
        }
        self.replay = Some(Replay::new(start, outcome.phases, Instant::now()));
        self.clear_effect();
    }

    fn after_move(&mut self) {
        if self.state.is_complete() {
            self.screen = Screen::Complete;
            self.selected = None;
        }
    }

    fn tick_replay(&mut self, now: Instant) {
        let step = self.step_duration();
        let Some(replay) = self.replay.as_mut() else {
            return;
        };
        if replay.tick(now, step) {
            self.removal_effect = None;
            self.removal_effect_process_time = None;
        }
        if replay.is_done() && replay.flashing.is_empty() {
            self.replay = None;
            self.after_move();
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.paused || self.replay.is_some() {
            return;
        }
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            let grid = self.state.grid();
            let board = ui::board_rect(self.last_area, grid.width(), grid.height());
            if let Some(pos) = ui::cell_at(board, mouse.column, mouse.row) {
                self.cursor = pos;
                self.select();
            }
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => self.paused = false,
                        Action::Quit => {
                            self.screen = Screen::QuitMenu;
                            self.quit_selected = QuitOption::Resume;
                        }
                        _ => {}
                    }
                    return Ok(true);
                }
                match action {
                    Action::Pause => self.paused = true,
                    Action::Quit => {
                        self.screen = Screen::QuitMenu;
                        self.quit_selected = QuitOption::Resume;
                    }
                    Action::Restart if self.replay.is_none() => self.reset_game()?,
                    Action::Up | Action::Down | Action::Left | Action::Right => {
                        self.move_cursor(action);
                    }
                    Action::Select if self.replay.is_none() => self.select(),
                    Action::Cancel => self.selected = None,
                    _ => {}
                }
            }
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.reset_game()?,
                    QuitOption::Exit => return Ok(false),
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
            Screen::Complete => match action {
                Action::Quit => return Ok(false),
                Action::Restart | Action::Select => self.reset_game()?,
                _ => {}
            },
        }
        Ok(true)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        let fade_ms = self.args.step_ms.min(u64::from(u32::MAX)) as u32;
        loop {
            let now = Instant::now();
            if !self.paused {
                self.tick_replay(now);
            }

            let (grid, flashing) = match &self.replay {
                Some(r) => (&r.shown, r.flashing.as_slice()),
                None => (self.state.grid(), &[][..]),
            };
            let view = View {
                screen: self.screen,
                game: &self.state,
                grid,
                theme: &self.theme,
                cursor: self.cursor,
                selected: self.selected,
                flashing,
                paused: self.paused,
                quit_selected: self.quit_selected,
            };
            let animate = !self.args.no_animation && !flashing.is_empty();
            let effect = &mut self.removal_effect;
            let process_time = &mut self.removal_effect_process_time;
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &view);
                if animate {
                    ui::apply_removal_effect(f, &view, effect, process_time, fade_ms, now);
                }
            })?;
            self.last_area = area;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.handle_action(key_to_action(key))? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => {}
                    }
                }
            }
        }
    }
}
