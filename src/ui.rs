//! Layout and drawing: board, sidebar, pause, quit menu, win screen.

use crate::app::{QuitOption, Screen};
use crate::theme::Theme;
use matchtui::{Cell, GameState, Grid, Pos};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per grid cell, so cells look roughly square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_HEIGHT: u16 = 24;

/// Everything the renderer needs for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub game: &'a GameState,
    /// Grid as currently shown; lags behind the game grid during a replay.
    pub grid: &'a Grid,
    pub theme: &'a Theme,
    pub cursor: Pos,
    pub selected: Option<Pos>,
    pub flashing: &'a [Pos],
    pub paused: bool,
    pub quit_selected: QuitOption,
}

/// Playfield (with border) and sidebar rects for a `width × height` grid, centred in `area`.
fn split_area(area: Rect, width: usize, height: usize) -> (Rect, Rect) {
    let pw = width as u16 * CELL_WIDTH + 2;
    let ph = height as u16 + 2;
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(total_h) / 2;
    let playfield = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    let sidebar = Rect {
        x: x + playfield.width,
        y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(playfield.width)),
        height: total_h.min(area.height),
    };
    (playfield, sidebar)
}

/// Board rect (no border) for the given terminal area; matches `draw` layout.
pub fn board_rect(area: Rect, width: usize, height: usize) -> Rect {
    let (playfield, _) = split_area(area, width, height);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: (width as u16 * CELL_WIDTH).min(playfield.width.saturating_sub(2)),
        height: (height as u16).min(playfield.height.saturating_sub(2)),
    }
}

/// Grid coordinate under terminal position (`column`, `row`), if any.
pub fn cell_at(board: Rect, column: u16, row: u16) -> Option<Pos> {
    if !board.contains(Position::new(column, row)) {
        return None;
    }
    Some((
        ((column - board.x) / CELL_WIDTH) as usize,
        (row - board.y) as usize,
    ))
}

/// Buffer positions covered by the given grid cells.
fn buffer_positions(board: Rect, cells: &[Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = board.x + gx as u16 * CELL_WIDTH;
        let y = board.y + gy as u16;
        for bx in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            set.insert((bx, y));
        }
    }
    set
}

/// Create the fade for the flashing cells if needed and process it.
pub fn apply_removal_effect(
    frame: &mut Frame,
    view: &View,
    effect: &mut Option<Effect>,
    process_time: &mut Option<Instant>,
    fade_ms: u32,
    now: Instant,
) {
    let board = board_rect(frame.area(), view.grid.width(), view.grid.height());
    let delta = process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *process_time = Some(now);

    if effect.is_none() {
        let positions = buffer_positions(board, view.flashing);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        *effect = Some(
            fx::fade_to(bg, bg, (fade_ms, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board),
        );
    }
    if let Some(effect) = effect {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw the current screen.
pub fn draw(frame: &mut Frame, view: &View) {
    let area = frame.area();
    draw_game(frame, view, area);
    match view.screen {
        Screen::Playing if view.paused => draw_pause_overlay(frame, view.theme, area),
        Screen::Playing => {}
        Screen::QuitMenu => draw_quit_menu(frame, view.theme, view.quit_selected),
        Screen::Complete => draw_complete(frame, view, area),
    }
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let (playfield, sidebar) = split_area(area, view.grid.width(), view.grid.height());
    draw_board(frame, view, playfield);
    draw_sidebar(frame, view, sidebar);
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" matchtui ", theme.title));
    block.render(area, frame.buffer_mut());

    let board = board_rect(frame.area(), view.grid.width(), view.grid.height());
    let flashing: HashSet<Pos> = view.flashing.iter().copied().collect();
    let buf = frame.buffer_mut();

    for y in 0..view.grid.height() {
        for x in 0..view.grid.width() {
            let rx = board.x + x as u16 * CELL_WIDTH;
            let ry = board.y + y as u16;
            if rx + CELL_WIDTH > board.x + board.width || ry >= board.y + board.height {
                continue;
            }
            let pos = (x, y);
            let bg = if view.selected == Some(pos) {
                theme.selection
            } else if view.cursor == pos && view.screen == Screen::Playing {
                theme.cursor
            } else {
                theme.bg
            };
            let framed = bg != theme.bg;
            let (symbol, fg) = if flashing.contains(&pos) {
                ("██", Color::White)
            } else {
                match view.grid.at(pos) {
                    Cell::Empty => ("  ", theme.bg),
                    Cell::Normal(c) if framed => ("▐▌", theme.cell_color(c)),
                    Cell::Normal(c) => ("██", theme.cell_color(c)),
                    Cell::Rainbow => ("◆◆", theme.rainbow),
                    Cell::Cross => ("╋╋", theme.cross),
                }
            };
            buf.set_string(rx, ry, symbol, Style::default().fg(fg).bg(bg));
        }
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let score = view.game.score();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(score.colors().len() as u16 + 3), // Objectives
            Constraint::Length(1),
            Constraint::Length(5), // Stats
            Constraint::Length(1),
            Constraint::Length(7), // Keys
        ])
        .split(area);

    // --- Objectives ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[0]);
    block.render(chunks[0], frame.buffer_mut());
    let mut lines = vec![Line::from(Span::styled("Objectives", title_style))];
    for (color, got, goal) in score.progress() {
        let mut spans = vec![
            Span::styled("██ ", Style::default().fg(theme.cell_color(color))),
            Span::styled(format!("{:<7}", color.name()), fg_style),
            Span::styled(format!("{:>3}/{goal}", got.min(999)), fg_style),
        ];
        if got >= goal {
            spans.push(Span::styled(" ✓", Style::default().fg(Color::Green).bold()));
        }
        lines.push(Line::from(spans));
    }
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());

    // --- Stats ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[2]);
    block.render(chunks[2], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats = vec![
        stat("Moves: ", view.game.moves.to_string()),
        stat("Best chain: ", view.game.best_chain.to_string()),
        stat(
            "Rainbows: ",
            format!(
                "{}/{}",
                view.game.live_rainbows(),
                view.game.config().max_rainbow_cells
            ),
        ),
    ];
    Paragraph::new(Text::from(stats)).render(inner, frame.buffer_mut());

    // --- Keys ---
    let block = sidebar_block(theme);
    let inner = block.inner(chunks[4]);
    block.render(chunks[4], frame.buffer_mut());
    let keys = vec![
        Line::from(Span::styled("arrows/hjkl  move", hint_style)),
        Line::from(Span::styled("space/click  pick, swap", hint_style)),
        Line::from(Span::styled("x            drop pick", hint_style)),
        Line::from(Span::styled("p pause   r restart", hint_style)),
        Line::from(Span::styled("q quit", hint_style)),
    ];
    Paragraph::new(Text::from(keys)).render(inner, frame.buffer_mut());
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: resume    Q: quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_complete(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 32, 9);
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " All objectives met! ",
            Style::default().fg(Color::Black).bg(Color::Green).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Moves: {} ", view.game.moves), fg)),
        Line::from(Span::styled(
            format!(" Best chain: {} ", view.game.best_chain),
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled(" R: play again    Q: quit ", fg)),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" matchtui ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title).bg(theme.bg))
        .title(" Quit? ");
    Clear.render(quit_rect, frame.buffer_mut());
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
