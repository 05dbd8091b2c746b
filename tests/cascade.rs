//! End-to-end: a forced swap on a small two-colour grid, through the public API.

use matchtui::{
    Cascade, Cell, Color, GameConfig, GameState, Grid, PhaseKind, apply_movements, has_alignment,
};

const R: Cell = Cell::Normal(Color::Red);
const G: Cell = Cell::Normal(Color::Green);

/// Stable 4×4 grid; swapping (0,3) and (1,3) lines up red along an anti-diagonal.
fn start() -> Grid {
    Grid::from_rows(vec![
        vec![R, R, G, G],
        vec![G, G, R, R],
        vec![R, R, G, G],
        vec![G, R, G, R],
    ])
}

fn palette() -> Vec<Color> {
    vec![Color::Red, Color::Green]
}

#[test]
fn start_grid_is_stable() {
    assert!(!has_alignment(&start()));
}

#[test]
fn forced_swap_removes_then_refills_until_stable() {
    let mut cascade = Cascade::from_grid(start(), palette(), 2, Some(2024));
    let outcome = cascade.request_swap((0, 3), (1, 3)).unwrap();

    let first = &outcome.phases[0];
    assert_eq!(first.kind(), PhaseKind::Removal);
    assert_eq!(first.removed(), &[(0, 3), (1, 2), (2, 1)]);
    assert!(outcome.removed_count() >= 3);
    assert!(matches!(
        outcome.phases[1].kind(),
        PhaseKind::Gravity | PhaseKind::Refill
    ));

    assert_eq!(&outcome.grid, cascade.grid());
    assert!(!outcome.grid.has_empty());
    assert!(!has_alignment(&outcome.grid));
}

#[test]
fn phase_log_replays_to_the_final_grid() {
    let mut swapped = start();
    swapped.swap((0, 3), (1, 3));
    let mut cascade = Cascade::from_grid(start(), palette(), 2, Some(7));
    let outcome = cascade.request_swap((0, 3), (1, 3)).unwrap();

    let mut shown = swapped;
    for phase in &outcome.phases {
        shown = match phase.movements() {
            Some(moves) => apply_movements(&shown, moves),
            None => match phase {
                matchtui::Phase::Removal(r) => r.grid.clone(),
                matchtui::Phase::SpecialActivation(a) => a.grid.clone(),
                _ => unreachable!(),
            },
        };
    }
    assert_eq!(shown, outcome.grid);
}

#[test]
fn session_scores_every_removed_cell() {
    let config = GameConfig {
        width: 4,
        height: 4,
        palette: palette(),
        objectives: vec![3, 1000],
        max_rainbow_cells: 2,
        seed: Some(11),
    };
    let mut game = GameState::with_grid(config, start()).unwrap();
    let outcome = game.swap((0, 3), (1, 3)).unwrap();

    let red = game.score().score_of(Color::Red).unwrap();
    let green = game.score().score_of(Color::Green).unwrap();
    assert!(red >= 3);
    assert_eq!(red + green, outcome.removed_count());
    assert!(!game.is_complete());
    assert_eq!(game.moves, 1);
}
