//! Score bookkeeping against per-colour objectives.

use crate::cell::Color;
use crate::error::EngineError;
use std::collections::BTreeMap;

/// Removed-cell tally per colour.
pub type ColorCounts = BTreeMap<Color, u32>;

/// Add every entry of `from` into `into`.
pub fn merge_counts(into: &mut ColorCounts, from: &ColorCounts) {
    for (&color, &n) in from {
        *into.entry(color).or_insert(0) += n;
    }
}

/// Running per-colour scores. `colors`, `objectives` and `scores` are parallel lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreManager {
    colors: Vec<Color>,
    objectives: Vec<u32>,
    scores: Vec<u32>,
}

impl ScoreManager {
    /// Refuses to build when the lists differ in length.
    pub fn new(colors: Vec<Color>, objectives: Vec<u32>) -> Result<Self, EngineError> {
        if colors.len() != objectives.len() {
            return Err(EngineError::ObjectiveMismatch {
                colors: colors.len(),
                objectives: objectives.len(),
            });
        }
        let scores = vec![0; colors.len()];
        Ok(Self {
            colors,
            objectives,
            scores,
        })
    }

    /// Same objective for every colour.
    pub fn uniform(colors: Vec<Color>, objective: u32) -> Self {
        let objectives = vec![objective; colors.len()];
        let scores = vec![0; colors.len()];
        Self {
            colors,
            objectives,
            scores,
        }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn objectives(&self) -> &[u32] {
        &self.objectives
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// Score for `color`, `None` if untracked.
    pub fn score_of(&self, color: Color) -> Option<u32> {
        self.colors
            .iter()
            .position(|&c| c == color)
            .map(|i| self.scores[i])
    }

    /// Credit `amount` to `color`. Untracked colours are ignored.
    pub fn update(&mut self, color: Color, amount: u32) {
        if let Some(i) = self.colors.iter().position(|&c| c == color) {
            self.scores[i] = self.scores[i].saturating_add(amount);
        }
    }

    pub fn update_from_map(&mut self, counts: &ColorCounts) {
        for (&color, &amount) in counts {
            self.update(color, amount);
        }
    }

    /// True once every tracked colour has reached its objective.
    pub fn is_complete(&self) -> bool {
        self.scores
            .iter()
            .zip(&self.objectives)
            .all(|(score, objective)| score >= objective)
    }

    /// (colour, score, objective) rows for display.
    pub fn progress(&self) -> impl Iterator<Item = (Color, u32, u32)> + '_ {
        self.colors
            .iter()
            .zip(&self.scores)
            .zip(&self.objectives)
            .map(|((&c, &s), &o)| (c, s, o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lists_are_rejected() {
        let err = ScoreManager::new(vec![Color::Red, Color::Blue], vec![10]).unwrap_err();
        assert_eq!(
            err,
            EngineError::ObjectiveMismatch {
                colors: 2,
                objectives: 1
            }
        );
    }

    #[test]
    fn completes_when_every_objective_is_met() {
        let mut sm = ScoreManager::new(vec![Color::Red, Color::Blue], vec![5, 3]).unwrap();
        assert!(!sm.is_complete());
        let counts: ColorCounts = [(Color::Red, 3), (Color::Blue, 3)].into_iter().collect();
        sm.update_from_map(&counts);
        assert!(!sm.is_complete());
        sm.update_from_map(&counts);
        assert!(sm.is_complete());
        assert_eq!(sm.scores(), &[6, 6]);
    }

    #[test]
    fn untracked_colour_is_ignored() {
        let mut sm = ScoreManager::uniform(vec![Color::Red], 1);
        let counts: ColorCounts = [(Color::Pink, 40)].into_iter().collect();
        sm.update_from_map(&counts);
        sm.update(Color::Green, 2);
        assert_eq!(sm.scores(), &[0]);
        assert_eq!(sm.score_of(Color::Pink), None);
    }

    #[test]
    fn empty_objectives_are_trivially_complete() {
        let sm = ScoreManager::new(Vec::new(), Vec::new()).unwrap();
        assert!(sm.is_complete());
    }

    #[test]
    fn merge_adds_per_colour() {
        let mut total = ColorCounts::new();
        merge_counts(&mut total, &[(Color::Red, 2)].into_iter().collect());
        merge_counts(&mut total, &[(Color::Red, 1), (Color::Blue, 4)].into_iter().collect());
        assert_eq!(total.get(&Color::Red), Some(&3));
        assert_eq!(total.get(&Color::Blue), Some(&4));
        let sm = ScoreManager::uniform(vec![Color::Red, Color::Blue], 3);
        assert_eq!(sm.progress().count(), 2);
    }
}
