//! Immutable personality baseline fixed at a Spirit's first birth.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ParseError;

pub const BASE_TRUST_RANGE: RangeInclusive<f64> = 0.2..=0.8;
pub const BASE_ANGER_RANGE: RangeInclusive<f64> = 0.0..=0.5;
pub const STUBBORNNESS_RANGE: RangeInclusive<f64> = 0.1..=1.0;
pub const RITUAL_AFFINITY_RANGE: RangeInclusive<f64> = 0.3..=1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Temperament {
    /// Quick to anger, quick to act
    Choleric,
    /// Distrustful, holds grudges, deeply devoted to rites
    Melancholic,
    /// Calm and trusting
    Phlegmatic,
    /// Warm but fickle
    Sanguine,
}

/// Trait baselines a temperament contributes before noise is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperamentTraits {
    pub base_trust: f64,
    pub base_anger: f64,
    pub stubbornness: f64,
    pub ritual_affinity: f64,
}

impl Temperament {
    pub const ALL: [Temperament; 4] = [
        Temperament::Choleric,
        Temperament::Melancholic,
        Temperament::Phlegmatic,
        Temperament::Sanguine,
    ];

    /// Probability of this temperament at genesis.
    pub fn birth_weight(self) -> f64 {
        match self {
            Temperament::Choleric => 0.25,
            Temperament::Melancholic => 0.25,
            Temperament::Phlegmatic => 0.30,
            Temperament::Sanguine => 0.20,
        }
    }

    pub fn traits(self) -> TemperamentTraits {
        match self {
            Temperament::Choleric => TemperamentTraits {
                base_trust: 0.4,
                base_anger: 0.35,
                stubbornness: 0.7,
                ritual_affinity: 0.6,
            },
            Temperament::Melancholic => TemperamentTraits {
                base_trust: 0.3,
                base_anger: 0.15,
                stubbornness: 0.85,
                ritual_affinity: 1.0,
            },
            Temperament::Phlegmatic => TemperamentTraits {
                base_trust: 0.65,
                base_anger: 0.1,
                stubbornness: 0.5,
                ritual_affinity: 0.8,
            },
            Temperament::Sanguine => TemperamentTraits {
                base_trust: 0.7,
                base_anger: 0.25,
                stubbornness: 0.3,
                ritual_affinity: 0.5,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Temperament::Choleric => "CHOLERIC",
            Temperament::Melancholic => "MELANCHOLIC",
            Temperament::Phlegmatic => "PHLEGMATIC",
            Temperament::Sanguine => "SANGUINE",
        }
    }
}

impl fmt::Display for Temperament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Temperament {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Temperament::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::Temperament(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpiritGenotype {
    pub temperament: Temperament,
    pub base_trust: f64,
    pub base_anger: f64,
    pub stubbornness: f64,
    pub ritual_affinity: f64,
}

impl SpiritGenotype {
    /// A genotype carrying exactly its temperament's baselines, no noise.
    pub fn from_temperament(temperament: Temperament) -> Self {
        let t = temperament.traits();
        Self {
            temperament,
            base_trust: t.base_trust,
            base_anger: t.base_anger,
            stubbornness: t.stubbornness,
            ritual_affinity: t.ritual_affinity,
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        BASE_TRUST_RANGE.contains(&self.base_trust)
            && BASE_ANGER_RANGE.contains(&self.base_anger)
            && STUBBORNNESS_RANGE.contains(&self.stubbornness)
            && RITUAL_AFFINITY_RANGE.contains(&self.ritual_affinity)
    }
}

impl Default for SpiritGenotype {
    fn default() -> Self {
        Self::from_temperament(Temperament::Phlegmatic)
    }
}
