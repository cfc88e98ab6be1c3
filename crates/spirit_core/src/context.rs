//! Decision context - everything the Will engine is allowed to see
//!
//! Built fresh for every interaction by the orchestrator and never persisted.
//! Subsystems contribute to it only through the plain values below, never by
//! handing out references to their internal state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::emotion::EmotionVector;
use crate::error::ParseError;
use crate::outcome::OutcomeWeights;

/// Category of a remembered episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Battle,
    Betrayal,
    Triumph,
    Communion,
    Trauma,
    Ritual,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Battle,
        EventCategory::Betrayal,
        EventCategory::Triumph,
        EventCategory::Communion,
        EventCategory::Trauma,
        EventCategory::Ritual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Battle => "BATTLE",
            EventCategory::Betrayal => "BETRAYAL",
            EventCategory::Triumph => "TRIUMPH",
            EventCategory::Communion => "COMMUNION",
            EventCategory::Trauma => "TRAUMA",
            EventCategory::Ritual => "RITUAL",
        }
    }

    /// Recalling one of these pushes the Spirit toward hostility.
    pub fn is_hostile(self) -> bool {
        matches!(self, EventCategory::Betrayal | EventCategory::Trauma)
    }

    /// Recalling one of these pushes the Spirit toward cooperation.
    pub fn is_benevolent(self) -> bool {
        matches!(self, EventCategory::Triumph | EventCategory::Communion)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::EventCategory(s.to_string()))
    }
}

/// A scar matched the current verb and hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScarTrigger {
    pub severity: f64,
}

/// Per-operator adjustments derived from the bond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BondModifiers {
    /// Signed; positive favours ACCEPT/WHISPER, negative REJECT/ANGER.
    pub trust: f64,
    /// Non-negative; dampens ANGER and LOCKOUT.
    pub patience: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Effective emotions (base state plus maintenance modifiers).
    pub emotions: EmotionVector,
    pub purity: f64,
    /// Per-decision noise in [0, 1), scales how much anger turns into ANGER.
    pub entropy: f64,
    /// How often the verb was seen recently, in [0, 1].
    pub repetition: f64,
    /// Mean successive change of recent purity scores.
    pub purity_trend: f64,
    pub semantic_novelty: f64,
    pub semantic_alignment: f64,
    pub recalled: Option<EventCategory>,
    pub scar: Option<ScarTrigger>,
    pub association_weights: OutcomeWeights,
    pub chaos: bool,
    pub cluster_bias: Option<f64>,
    pub bond: Option<BondModifiers>,
}

impl DecisionContext {
    /// A neutral context around `emotions` and `purity`; everything else inert.
    pub fn new(emotions: EmotionVector, purity: f64) -> Self {
        Self {
            emotions,
            purity: purity.clamp(0.0, 1.0),
            entropy: 0.5,
            repetition: 0.0,
            purity_trend: 0.0,
            semantic_novelty: 0.5,
            semantic_alignment: 0.5,
            recalled: None,
            scar: None,
            association_weights: OutcomeWeights::default(),
            chaos: false,
            cluster_bias: None,
            bond: None,
        }
    }
}
