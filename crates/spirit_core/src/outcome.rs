//! Outcomes and probability distributions over them
//!
//! The Spirit answers every ritual with exactly one [`Outcome`]. The Will
//! engine builds an [`OutcomeDistribution`] in a fixed enumeration order and
//! samples it with a single uniform draw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Accept,
    Reject,
    Silence,
    Anger,
    Omen,
    Whisper,
    Lockout,
}

impl Outcome {
    /// Sampling order. Cumulative mass is walked in exactly this sequence.
    pub const ALL: [Outcome; 7] = [
        Outcome::Accept,
        Outcome::Reject,
        Outcome::Silence,
        Outcome::Anger,
        Outcome::Omen,
        Outcome::Whisper,
        Outcome::Lockout,
    ];

    pub fn index(self) -> usize {
        match self {
            Outcome::Accept => 0,
            Outcome::Reject => 1,
            Outcome::Silence => 2,
            Outcome::Anger => 3,
            Outcome::Omen => 4,
            Outcome::Whisper => 5,
            Outcome::Lockout => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Accept => "ACCEPT",
            Outcome::Reject => "REJECT",
            Outcome::Silence => "SILENCE",
            Outcome::Anger => "ANGER",
            Outcome::Omen => "OMEN",
            Outcome::Whisper => "WHISPER",
            Outcome::Lockout => "LOCKOUT",
        }
    }

    /// ACCEPT and WHISPER count as the Spirit favouring the operator.
    pub fn is_positive(self) -> bool {
        matches!(self, Outcome::Accept | Outcome::Whisper)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::ALL
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::Outcome(s.to_string()))
    }
}

// ============================================================================
// Distribution
// ============================================================================

/// Non-negative mass per outcome, indexed by [`Outcome::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution([f64; 7]);

impl OutcomeDistribution {
    pub fn from_scores(scores: [f64; 7]) -> Self {
        Self(scores)
    }

    pub fn uniform() -> Self {
        Self([1.0 / 7.0; 7])
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        self.0[outcome.index()]
    }

    pub fn scale(&mut self, outcome: Outcome, factor: f64) {
        self.0[outcome.index()] *= factor;
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Multiply each outcome by its factor in `weights`.
    pub fn weighted(mut self, weights: &OutcomeWeights) -> Self {
        for outcome in Outcome::ALL {
            self.scale(outcome, weights.get(outcome));
        }
        self
    }

    /// Rescale to unit mass. A zero or non-finite total leaves the vector as is.
    pub fn normalized(self) -> Self {
        let total = self.sum();
        if total <= 0.0 || !total.is_finite() {
            return self;
        }
        Self(self.0.map(|p| p / total))
    }

    /// Walk outcomes in [`Outcome::ALL`] order and return the first whose
    /// cumulative mass reaches `draw`. Falls back to SILENCE.
    pub fn sample(&self, draw: f64) -> Outcome {
        let mut cumulative = 0.0;
        for outcome in Outcome::ALL {
            cumulative += self.get(outcome);
            if cumulative >= draw {
                return outcome;
            }
        }
        Outcome::Silence
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        Outcome::ALL.iter().map(move |o| (*o, self.get(*o)))
    }
}

impl Index<Outcome> for OutcomeDistribution {
    type Output = f64;

    fn index(&self, outcome: Outcome) -> &f64 {
        &self.0[outcome.index()]
    }
}

impl IndexMut<Outcome> for OutcomeDistribution {
    fn index_mut(&mut self, outcome: Outcome) -> &mut f64 {
        &mut self.0[outcome.index()]
    }
}

/// Multiplicative per-outcome factors, 1.0 meaning "no influence".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeWeights([f64; 7]);

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self([1.0; 7])
    }
}

impl OutcomeWeights {
    pub fn get(&self, outcome: Outcome) -> f64 {
        self.0[outcome.index()]
    }

    pub fn scale(&mut self, outcome: Outcome, factor: f64) {
        self.0[outcome.index()] *= factor;
    }

    pub fn is_neutral(&self) -> bool {
        self.0.iter().all(|w| (*w - 1.0).abs() < f64::EPSILON)
    }
}
