//! Warm memory - short recency windows over the last few interactions
//!
//! Used only for scoring: how repetitive the operator is being, and what
//! the recent run of purities and outcomes looks like.

use serde::Serialize;
use spirit_core::Outcome;
use std::collections::VecDeque;

pub const INPUT_WINDOW: usize = 20;
pub const PURITY_WINDOW: usize = 10;
pub const OUTCOME_WINDOW: usize = 10;
const REPETITION_STEP: f64 = 0.1;

/// Read-only view of warm memory for one decision.
#[derive(Debug, Clone, Serialize)]
pub struct WarmSnapshot {
    pub repetition: f64,
    pub last_outcome: Option<Outcome>,
    pub recent_outcomes: Vec<Outcome>,
    pub recent_purities: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct WarmMemory {
    inputs: VecDeque<String>,
    purities: VecDeque<f64>,
    outcomes: VecDeque<Outcome>,
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, cap: usize) {
    queue.push_back(item);
    while queue.len() > cap {
        queue.pop_front();
    }
}

impl WarmMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&mut self, input: &str) {
        push_bounded(&mut self.inputs, input.to_string(), INPUT_WINDOW);
    }

    pub fn push_purity(&mut self, purity: f64) {
        push_bounded(&mut self.purities, purity, PURITY_WINDOW);
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        push_bounded(&mut self.outcomes, outcome, OUTCOME_WINDOW);
    }

    /// 0 for a first sighting, +0.1 per extra recent match, capped at 1.
    /// A recent entry matches if it equals or contains `input`.
    pub fn repetition_score(&self, input: &str) -> f64 {
        let matches = self
            .inputs
            .iter()
            .filter(|seen| seen.as_str() == input || seen.contains(input))
            .count();
        (matches.saturating_sub(1) as f64 * REPETITION_STEP).min(1.0)
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.outcomes.back().copied()
    }

    pub fn snapshot(&self, input: &str) -> WarmSnapshot {
        WarmSnapshot {
            repetition: self.repetition_score(input),
            last_outcome: self.last_outcome(),
            recent_outcomes: self.outcomes.iter().copied().collect(),
            recent_purities: self.purities.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetition_rises_then_caps() {
        let mut warm = WarmMemory::new();
        assert_eq!(warm.repetition_score("build"), 0.0);
        let mut last = 0.0;
        for i in 1..=INPUT_WINDOW {
            warm.push_input("build");
            let score = warm.repetition_score("build");
            if (2..=11).contains(&i) {
                assert!(score > last, "push {} gave {}", i, score);
            }
            last = score;
        }
        assert_eq!(warm.repetition_score("build"), 1.0);
    }

    #[test]
    fn test_five_pushes_repetitive() {
        let mut warm = WarmMemory::new();
        for _ in 0..5 {
            warm.push_input("pray");
        }
        assert!((warm.repetition_score("pray") - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_containment_counts_as_match() {
        let mut warm = WarmMemory::new();
        warm.push_input("rebuild");
        warm.push_input("build");
        assert!((warm.repetition_score("build") - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_windows_are_bounded() {
        let mut warm = WarmMemory::new();
        for i in 0..50 {
            warm.push_input(&format!("verb{}", i));
            warm.push_purity(i as f64 / 50.0);
            warm.record_outcome(Outcome::Accept);
        }
        let snap = warm.snapshot("verb49");
        assert_eq!(snap.recent_purities.len(), PURITY_WINDOW);
        assert_eq!(snap.recent_outcomes.len(), OUTCOME_WINDOW);
        assert_eq!(snap.last_outcome, Some(Outcome::Accept));
        assert_eq!(warm.repetition_score("verb0"), 0.0);
    }
}
