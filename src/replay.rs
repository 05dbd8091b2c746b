//! Step-by-step playback of a cascade so the player can follow it.

use matchtui::{Grid, Phase, Pos, apply_movements};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Cascade phases still to be shown, applied one per step onto `shown`.
///
/// A removal takes two steps: first the removed cells flash, then the grid
/// without them appears.
#[derive(Debug)]
pub struct Replay {
    pub shown: Grid,
    /// Cells currently flashing before removal.
    pub flashing: Vec<Pos>,
    phases: VecDeque<Phase>,
    pending: Option<Grid>,
    last_step: Instant,
}

impl Replay {
    pub fn new(start: Grid, phases: Vec<Phase>, now: Instant) -> Self {
        let mut replay = Self {
            shown: start,
            flashing: Vec::new(),
            phases: phases.into(),
            pending: None,
            last_step: now,
        };
        replay.step();
        replay
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_none() && self.phases.is_empty()
    }

    /// Advance if `step` has elapsed since the previous step. Returns true when something changed.
    pub fn tick(&mut self, now: Instant, step: Duration) -> bool {
        if now.saturating_duration_since(self.last_step) < step {
            return false;
        }
        self.last_step = now;
        self.step()
    }

    fn step(&mut self) -> bool {
        if let Some(grid) = self.pending.take() {
            self.shown = grid;
            self.flashing.clear();
            return true;
        }
        match self.phases.pop_front() {
            None => false,
            Some(Phase::Gravity(moves) | Phase::Refill(moves)) => {
                self.shown = apply_movements(&self.shown, &moves);
                true
            }
            Some(Phase::Removal(found)) => {
                self.flashing = found.removed;
                self.pending = Some(found.grid);
                true
            }
            Some(Phase::SpecialActivation(activation)) => {
                self.flashing = activation.removed;
                self.pending = Some(activation.grid);
                true
            }
        }
    }
}
