//! Emotion vector - the Spirit's instantaneous mood
//!
//! Five bounded dimensions, each in [0.0, 1.0]:
//! - `anger`: hostility toward the operator
//! - `trust`: willingness to cooperate
//! - `ennui`: boredom, grows with idleness and repetition
//! - `curiosity`: appetite for novel input
//! - `fear`: residue of hostile episodes
//!
//! Every mutation goes through [`EmotionVector::clamp`], which snaps values
//! within [`SNAP_EPSILON`] of a bound exactly onto it so thousands of small
//! updates never drift outside the unit interval.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Distance from 0.0 or 1.0 at which a value is snapped onto the bound.
pub const SNAP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionVector {
    pub anger: f64,
    pub trust: f64,
    pub ennui: f64,
    pub curiosity: f64,
    pub fear: f64,
}

impl Default for EmotionVector {
    fn default() -> Self {
        Self {
            anger: 0.1,
            trust: 0.5,
            ennui: 0.1,
            curiosity: 0.5,
            fear: 0.0,
        }
    }
}

/// Clamp a single channel into [0, 1], replacing non-finite values with `fallback`.
fn clamp_unit(value: f64, fallback: f64, name: &str) -> f64 {
    if !value.is_finite() {
        tracing::warn!("Non-finite {} ({}), resetting to {}", name, value, fallback);
        return fallback;
    }
    if value <= SNAP_EPSILON {
        0.0
    } else if value >= 1.0 - SNAP_EPSILON {
        1.0
    } else {
        value
    }
}

impl EmotionVector {
    /// Enforce bounds on every channel in place.
    pub fn clamp(&mut self) {
        let defaults = Self::default();
        self.anger = clamp_unit(self.anger, defaults.anger, "anger");
        self.trust = clamp_unit(self.trust, defaults.trust, "trust");
        self.ennui = clamp_unit(self.ennui, defaults.ennui, "ennui");
        self.curiosity = clamp_unit(self.curiosity, defaults.curiosity, "curiosity");
        self.fear = clamp_unit(self.fear, defaults.fear, "fear");
    }

    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    /// Overlay transient modifiers without touching `self`.
    pub fn with_modifiers(&self, modifiers: &EmotionModifiers) -> Self {
        Self {
            anger: self.anger + modifiers.anger,
            trust: self.trust + modifiers.trust,
            ennui: self.ennui + modifiers.ennui,
            ..*self
        }
        .clamped()
    }

    /// Add a raw impulse, then clamp.
    pub fn apply(&mut self, delta: &EmotionDelta) {
        self.anger += delta.anger;
        self.trust += delta.trust;
        self.ennui += delta.ennui;
        self.curiosity += delta.curiosity;
        self.fear += delta.fear;
        self.clamp();
    }

    /// Signed change from `before` to `self`.
    pub fn delta_from(&self, before: &EmotionVector) -> EmotionDelta {
        EmotionDelta {
            anger: self.anger - before.anger,
            trust: self.trust - before.trust,
            ennui: self.ennui - before.ennui,
            curiosity: self.curiosity - before.curiosity,
            fear: self.fear - before.fear,
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        [self.anger, self.trust, self.ennui, self.curiosity, self.fear]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// Signed per-channel change across an interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionDelta {
    pub anger: f64,
    pub trust: f64,
    pub ennui: f64,
    pub curiosity: f64,
    pub fear: f64,
}

impl AddAssign for EmotionDelta {
    fn add_assign(&mut self, rhs: Self) {
        self.anger += rhs.anger;
        self.trust += rhs.trust;
        self.ennui += rhs.ennui;
        self.curiosity += rhs.curiosity;
        self.fear += rhs.fear;
    }
}

/// Transient, never-persisted offsets derived from maintenance neglect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionModifiers {
    pub anger: f64,
    pub trust: f64,
    pub ennui: f64,
}
