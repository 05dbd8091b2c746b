//! Cascade controller: drives fill → detect until the grid is stable.
//!
//! The controller owns the authoritative grid and the RNG. Every request runs to a stable
//! grid before returning and records each pass as an ordered list of phases, which the
//! caller may replay at its own pace.

use crate::alignment::{AlignmentResult, SpawnRules, detect};
use crate::cell::{Cell, Color};
use crate::error::EngineError;
use crate::gravity::fill;
use crate::grid::{Grid, Movement, Pos, is_adjacent};
use crate::score::{ColorCounts, merge_counts};
use crate::special::{Activation, activate_cross, activate_rainbow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

/// Upper bound on fill → detect passes per request. Small grids with few colours
/// can need thousands of passes before a refill leaves no run behind.
pub const MAX_CASCADE_PASSES: usize = 100_000;

/// Controller phase. Requests resolve to completion inside one call, so
/// callers only ever observe `Idle`; `Resolving` is what the cascade passes
/// see (and log) while they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    /// Grid stable, awaiting input.
    Idle,
    /// Fill → detect passes outstanding.
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Gravity,
    Refill,
    Removal,
    SpecialActivation,
}

/// One step of a cascade, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Existing cells falling into holes.
    Gravity(Vec<Movement>),
    /// Fresh cells entering from the top.
    Refill(Vec<Movement>),
    Removal(AlignmentResult),
    SpecialActivation(Activation),
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Gravity(_) => PhaseKind::Gravity,
            Self::Refill(_) => PhaseKind::Refill,
            Self::Removal(_) => PhaseKind::Removal,
            Self::SpecialActivation(_) => PhaseKind::SpecialActivation,
        }
    }

    pub fn movements(&self) -> Option<&[Movement]> {
        match self {
            Self::Gravity(m) | Self::Refill(m) => Some(m),
            _ => None,
        }
    }

    /// Per-colour tally for removal phases.
    pub fn counts(&self) -> Option<&ColorCounts> {
        match self {
            Self::Removal(r) => Some(&r.counts),
            Self::SpecialActivation(a) => Some(&a.counts),
            _ => None,
        }
    }

    /// Cleared coordinates for removal phases.
    pub fn removed(&self) -> &[Pos] {
        match self {
            Self::Removal(r) => &r.removed,
            Self::SpecialActivation(a) => &a.removed,
            _ => &[],
        }
    }
}

/// Everything one request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub phases: Vec<Phase>,
    /// Final stable grid.
    pub grid: Grid,
    /// Removed cells per colour over the whole cascade.
    pub counts: ColorCounts,
}

impl CascadeOutcome {
    /// A request that changed nothing.
    pub fn unchanged(grid: &Grid) -> Self {
        Self {
            phases: Vec::new(),
            grid: grid.clone(),
            counts: ColorCounts::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn removed_count(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Number of detection passes that removed something.
    pub fn chain_length(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| p.kind() == PhaseKind::Removal)
            .count()
    }
}

/// Fewest colours for which a `width × height` start grid reliably settles.
///
/// Refilling only the matched cells converges fast with plenty of colours and
/// slows down exponentially with area when colours are scarce: with four
/// colours a 10×10 grid needs at most ~1 500 passes, a 13×13 one regularly
/// exceeds 20 000.
pub fn min_colors(width: usize, height: usize) -> usize {
    match width * height {
        0..=25 => 3,
        26..=100 => 4,
        _ => 5,
    }
}

/// Fill an empty `width × height` grid and keep refilling until no run is left.
/// Specials are never spawned here.
pub fn stabilize<R: Rng + ?Sized>(
    grid: Grid,
    palette: &[Color],
    rng: &mut R,
) -> Result<Grid, EngineError> {
    stabilize_within(grid, palette, rng, MAX_CASCADE_PASSES)
}

pub(crate) fn stabilize_within<R: Rng + ?Sized>(
    mut grid: Grid,
    palette: &[Color],
    rng: &mut R,
    max_passes: usize,
) -> Result<Grid, EngineError> {
    for pass in 0..max_passes {
        grid = fill(&grid, palette, rng).grid;
        let found = detect(&grid, SpawnRules::NONE, rng);
        if found.is_empty() {
            trace!(pass, "starting grid stable");
            return Ok(grid);
        }
        trace!(pass, removed = found.removed.len(), "regenerating matched cells");
        grid = found.grid;
    }
    warn!(passes = max_passes, "starting grid did not settle");
    Err(EngineError::Unsettled { passes: max_passes })
}

/// Match-free starting grid. `seed` makes the result reproducible.
///
/// Fails with [`EngineError::Unsettled`] when the palette is too small for the
/// grid (see [`min_colors`]).
pub fn generate_initial_grid(
    width: usize,
    height: usize,
    palette: &[Color],
    seed: Option<u64>,
) -> Result<Grid, EngineError> {
    let mut rng = seed_rng(seed);
    stabilize(Grid::new_empty(width, height), palette, &mut rng)
}

pub(crate) fn seed_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random::<u64>))
}

/// Owner of the authoritative grid.
#[derive(Debug, Clone)]
pub struct Cascade {
    grid: Grid,
    palette: Vec<Color>,
    rng: StdRng,
    max_rainbows: usize,
    state: CascadeState,
}

impl Cascade {
    /// Start from a freshly generated, match-free grid.
    pub fn new(
        width: usize,
        height: usize,
        palette: Vec<Color>,
        max_rainbows: usize,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        let mut rng = seed_rng(seed);
        let grid = stabilize(Grid::new_empty(width, height), &palette, &mut rng)?;
        Ok(Self {
            grid,
            palette,
            rng,
            max_rainbows,
            state: CascadeState::Idle,
        })
    }

    /// Adopt an existing grid as-is (it may hold runs or holes; the next request resolves them).
    pub fn from_grid(grid: Grid, palette: Vec<Color>, max_rainbows: usize, seed: Option<u64>) -> Self {
        Self {
            grid,
            palette,
            rng: seed_rng(seed),
            max_rainbows,
            state: CascadeState::Idle,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Always `Idle` between requests.
    pub fn state(&self) -> CascadeState {
        self.state
    }

    pub fn live_rainbows(&self) -> usize {
        self.grid.count(|c| c == Cell::Rainbow)
    }

    /// Swap two 4-adjacent cells and resolve.
    ///
    /// A special cell swapped with a normal cell is activated instead of moved.
    /// Two specials, or a special and an empty slot, leave the grid unchanged.
    pub fn request_swap(&mut self, a: Pos, b: Pos) -> Result<CascadeOutcome, EngineError> {
        if !self.grid.in_bounds(a) || !self.grid.in_bounds(b) || !is_adjacent(a, b) {
            return Err(EngineError::InvalidSwap { a, b });
        }
        let (ca, cb) = (self.grid.at(a), self.grid.at(b));
        match (ca.is_special(), cb.is_special()) {
            (true, false) if cb.color().is_some() => self.request_special_activation(a, b),
            (false, true) if ca.color().is_some() => self.request_special_activation(b, a),
            (false, false) => {
                debug!(?a, ?b, "swap");
                self.grid.swap(a, b);
                Ok(self.resolve(Vec::new(), ColorCounts::new()))
            }
            _ => {
                debug!(?a, ?b, "swap ignored");
                Ok(CascadeOutcome::unchanged(&self.grid))
            }
        }
    }

    /// Fire the special cell at `special` against the cell at `other`, then resolve.
    pub fn request_special_activation(
        &mut self,
        special: Pos,
        other: Pos,
    ) -> Result<CascadeOutcome, EngineError> {
        for (x, y) in [special, other] {
            if !self.grid.in_bounds((x, y)) {
                return Err(EngineError::OutOfBounds { x, y });
            }
        }
        let partner = self.grid.at(other);
        let activation = match self.grid.at(special) {
            Cell::Rainbow if partner.color().is_some() => {
                activate_rainbow(&self.grid, special, partner)
            }
            Cell::Cross if partner.color().is_some() => activate_cross(&self.grid, special, other),
            Cell::Rainbow | Cell::Cross => return Ok(CascadeOutcome::unchanged(&self.grid)),
            _ => {
                return Err(EngineError::NotSpecial {
                    x: special.0,
                    y: special.1,
                });
            }
        };
        debug!(
            ?special,
            ?other,
            removed = activation.removed.len(),
            "special activation"
        );
        let counts = activation.counts.clone();
        self.grid = activation.grid.clone();
        Ok(self.resolve(vec![Phase::SpecialActivation(activation)], counts))
    }

    /// Resolve outstanding holes and runs on the current grid.
    pub fn settle(&mut self) -> CascadeOutcome {
        self.resolve(Vec::new(), ColorCounts::new())
    }

    fn resolve(&mut self, mut phases: Vec<Phase>, mut counts: ColorCounts) -> CascadeOutcome {
        self.state = CascadeState::Resolving;
        for pass in 0..MAX_CASCADE_PASSES {
            let filled = fill(&self.grid, &self.palette, &mut self.rng);
            let (gravity, refill) = filled.split();
            if !gravity.is_empty() {
                phases.push(Phase::Gravity(gravity));
            }
            if !refill.is_empty() {
                phases.push(Phase::Refill(refill));
            }
            self.grid = filled.grid;

            // Checked once per pass; a pass with several long runs can overshoot the cap.
            let spawn = SpawnRules {
                rainbow: self.live_rainbows() < self.max_rainbows,
                cross: true,
            };
            let found = detect(&self.grid, spawn, &mut self.rng);
            if found.is_empty() {
                self.state = CascadeState::Idle;
                return CascadeOutcome {
                    phases,
                    grid: self.grid.clone(),
                    counts,
                };
            }
            debug!(
                pass,
                state = ?self.state,
                removed = found.removed.len(),
                rainbows = found.rainbow_spawns,
                crosses = found.cross_spawns,
                "cascade pass"
            );
            merge_counts(&mut counts, &found.counts);
            self.grid = found.grid.clone();
            phases.push(Phase::Removal(found));
        }
        warn!(passes = MAX_CASCADE_PASSES, "cascade did not settle");
        self.state = CascadeState::Idle;
        CascadeOutcome {
            phases,
            grid: self.grid.clone(),
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::has_alignment;
    use crate::grid::apply_movements;
    use crate::grid::tests::grid;
    use proptest::prelude::*;

    const THREE: [Color; 3] = [Color::Red, Color::Green, Color::Blue];

    /// Replay every phase onto `start` the way a presentation layer would.
    fn replay(start: &Grid, outcome: &CascadeOutcome) -> Grid {
        let mut g = start.clone();
        for phase in &outcome.phases {
            g = match phase {
                Phase::Gravity(m) | Phase::Refill(m) => apply_movements(&g, m),
                Phase::Removal(r) => r.grid.clone(),
                Phase::SpecialActivation(a) => a.grid.clone(),
            };
        }
        g
    }

    #[test]
    fn initial_grid_is_full_and_stable() {
        let g = generate_initial_grid(8, 8, &Color::ALL, Some(3)).unwrap();
        assert!(!g.has_empty());
        assert!(!has_alignment(&g));
        assert_eq!(g.count(Cell::is_special), 0);
        assert_eq!(g, generate_initial_grid(8, 8, &Color::ALL, Some(3)).unwrap());
    }

    #[test]
    fn largest_grids_settle_at_the_minimum_palette() {
        for (w, h) in [(10, 10), (20, 5), (11, 10), (20, 20)] {
            let palette = Color::palette(min_colors(w, h));
            let g = generate_initial_grid(w, h, &palette, Some(9)).unwrap();
            assert!(!has_alignment(&g), "{w}x{h} with {} colours", palette.len());
            assert!(!g.has_empty());
        }
    }

    #[test]
    fn minimum_palette_grows_with_area() {
        assert_eq!(min_colors(5, 5), 3);
        assert_eq!(min_colors(10, 10), 4);
        assert_eq!(min_colors(20, 5), 4);
        assert_eq!(min_colors(11, 10), 5);
        assert_eq!(min_colors(20, 20), 5);
    }

    #[test]
    fn unsettled_start_grid_is_an_error() {
        // Two colours on 8×8 essentially never come out match-free.
        let mut rng = seed_rng(Some(1));
        let palette = [Color::Red, Color::Green];
        assert_eq!(
            stabilize_within(Grid::new_empty(8, 8), &palette, &mut rng, 10),
            Err(EngineError::Unsettled { passes: 10 })
        );
    }

    #[test]
    fn illegal_swaps_are_rejected_without_side_effects() {
        let mut c = Cascade::new(5, 5, Color::ALL.to_vec(), 2, Some(1)).unwrap();
        let before = c.grid().clone();
        for (a, b) in [((0, 0), (2, 0)), ((0, 0), (1, 1)), ((4, 4), (5, 4)), ((2, 2), (2, 2))] {
            assert_eq!(
                c.request_swap(a, b),
                Err(EngineError::InvalidSwap { a, b })
            );
        }
        assert_eq!(c.grid(), &before);
        assert_eq!(c.state(), CascadeState::Idle);
    }

    #[test]
    fn swap_into_a_run_removes_and_refills() {
        let start = grid(
            "RGBGB
             GBRBR
             RRGRG
             BGBGB",
        );
        assert!(!has_alignment(&start));
        let mut c = Cascade::from_grid(start.clone(), THREE.to_vec(), 2, Some(11));
        // Drops the R at (2,1) into row 2: R R R R G.
        let out = c.request_swap((2, 1), (2, 2)).unwrap();
        assert!(out.removed_count() >= 4);
        assert_eq!(out.phases[0].kind(), PhaseKind::Removal);
        assert_eq!(out.phases[0].removed(), &[(0, 2), (1, 2), (2, 2), (3, 2)]);
        assert!(out.phases.iter().any(|p| p.kind() == PhaseKind::Refill));
        assert!(!has_alignment(&out.grid));
        assert!(!out.grid.has_empty());
        assert_eq!(c.grid(), &out.grid);
        assert_eq!(c.state(), CascadeState::Idle);

        let mut swapped = start;
        swapped.swap((2, 1), (2, 2));
        assert_eq!(replay(&swapped, &out), out.grid);
    }

    #[test]
    fn swap_without_match_is_kept() {
        let start = grid(
            "RGB
             GBR
             RGB",
        );
        let mut c = Cascade::from_grid(start, THREE.to_vec(), 2, Some(2));
        let out = c.request_swap((0, 0), (1, 0)).unwrap();
        assert!(out.phases.is_empty());
        assert_eq!(out.grid.to_string(), "GRB\nGBR\nRGB\n");
    }

    #[test]
    fn special_pairs_are_a_noop() {
        let start = grid(
            "*+R
             GBG",
        );
        let mut c = Cascade::from_grid(start.clone(), THREE.to_vec(), 2, Some(2));
        let out = c.request_swap((0, 0), (1, 0)).unwrap();
        assert!(out.is_noop());
        assert_eq!(c.grid(), &start);
    }

    #[test]
    fn rainbow_swap_activates_instead_of_moving() {
        let start = grid(
            "RGBR
             G*BG
             BRGB
             RBRG",
        );
        let reds = start.count_color(Color::Red) as u32;
        let mut c = Cascade::from_grid(start, THREE.to_vec(), 2, Some(5));
        let out = c.request_swap((1, 1), (1, 2)).unwrap();
        match &out.phases[0] {
            Phase::SpecialActivation(a) => {
                assert_eq!(a.counts.get(&Color::Red), Some(&reds));
                assert_eq!(a.grid.count_color(Color::Red), 0);
            }
            other => panic!("expected activation, got {other:?}"),
        }
        assert!(out.counts.get(&Color::Red).copied().unwrap_or(0) >= reds);
        assert!(!has_alignment(&out.grid));
        assert!(!out.grid.has_empty());
    }

    #[test]
    fn cross_swap_clears_its_row() {
        let start = grid(
            "RGBR
             GR+G
             BGBR
             RBRG",
        );
        let mut c = Cascade::from_grid(start, THREE.to_vec(), 2, Some(8));
        let out = c.request_swap((2, 1), (3, 1)).unwrap();
        assert_eq!(out.phases[0].kind(), PhaseKind::SpecialActivation);
        assert_eq!(out.phases[0].removed(), &[(0, 1), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(out.phases[1].kind(), PhaseKind::Gravity);
    }

    #[test]
    fn activation_requires_a_special_cell() {
        let mut c = Cascade::from_grid(grid("RG\nBR"), THREE.to_vec(), 2, Some(1));
        assert_eq!(
            c.request_special_activation((0, 0), (1, 0)),
            Err(EngineError::NotSpecial { x: 0, y: 0 })
        );
        assert_eq!(
            c.request_special_activation((0, 0), (9, 0)),
            Err(EngineError::OutOfBounds { x: 9, y: 0 })
        );
    }

    #[test]
    fn rainbow_cap_blocks_rainbow_spawns() {
        let start = grid(
            "BBBBB
             **GRG
             GRGRG",
        );
        let mut c = Cascade::from_grid(start, THREE.to_vec(), 2, Some(4));
        let out = c.settle();
        match &out.phases[0] {
            Phase::Removal(r) => assert_eq!(r.rainbow_spawns, 0),
            other => panic!("expected removal, got {other:?}"),
        }
    }

    #[test]
    fn rainbow_cap_can_overshoot_within_one_pass() {
        let start = grid(
            "*GBGB
             RRRRR
             GGGGG
             BRBRB",
        );
        // One live rainbow, cap two: the pass may spawn, and both runs of five do.
        let mut c = Cascade::from_grid(start, THREE.to_vec(), 2, Some(4));
        let out = c.settle();
        match &out.phases[0] {
            Phase::Removal(r) => assert_eq!(r.rainbow_spawns, 2),
            other => panic!("expected removal, got {other:?}"),
        }
        assert_eq!(c.live_rainbows(), 3);
    }

    #[test]
    fn settle_fills_holes() {
        let mut c = Cascade::from_grid(Grid::new_empty(4, 4), Color::ALL.to_vec(), 2, Some(6));
        let out = c.settle();
        assert_eq!(out.phases[0].kind(), PhaseKind::Refill);
        assert!(!out.grid.has_empty());
        assert!(!has_alignment(&out.grid));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn generated_grids_have_no_latent_matches(
            seed in any::<u64>(),
            w in 3usize..=20,
            h in 3usize..=20,
            extra in 0usize..=2,
        ) {
            let colors = (min_colors(w, h) + extra).clamp(4, Color::ALL.len());
            let g = generate_initial_grid(w, h, &Color::palette(colors), Some(seed)).unwrap();
            let found = detect(&g, SpawnRules::NONE, &mut seed_rng(Some(seed)));
            prop_assert!(found.counts.is_empty());
            prop_assert!(!g.has_empty());
        }

        #[test]
        fn swaps_always_end_stable(seed in any::<u64>(), x in 0usize..5, y in 0usize..5, horizontal in any::<bool>()) {
            let mut c = Cascade::new(6, 6, Color::ALL.to_vec(), 2, Some(seed)).unwrap();
            let b = if horizontal { (x + 1, y) } else { (x, y + 1) };
            let out = c.request_swap((x, y), b).unwrap();
            prop_assert!(!has_alignment(&out.grid));
            prop_assert!(!out.grid.has_empty());
            prop_assert_eq!(c.state(), CascadeState::Idle);
        }
    }
}
