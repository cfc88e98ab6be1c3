//! Emotion engine - owns the live emotion vector
//!
//! - `stimulate`: purity and outcome driven updates, scaled by ritual affinity
//! - `decay`: passive drift per elapsed hour
//! - `effective_state`: maintenance overlay used for decisions only

use spirit_core::{EmotionDelta, EmotionModifiers, EmotionVector, Outcome, SpiritGenotype};

/// Per-hour decay factors.
const ANGER_DECAY: f64 = 0.95;
const FEAR_DECAY: f64 = 0.90;
const ENNUI_GROWTH: f64 = 0.01;

/// Purity scaling. Desecration provokes more than reverence soothes.
const PURITY_ANGER_GAIN: f64 = 0.4;
const PURITY_TRUST_GAIN: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct EmotionEngine {
    state: EmotionVector,
    ritual_affinity: f64,
}

impl EmotionEngine {
    /// Baseline emotions for a freshly born Spirit.
    pub fn new(genotype: &SpiritGenotype) -> Self {
        let state = EmotionVector {
            anger: genotype.base_anger,
            trust: genotype.base_trust,
            ..EmotionVector::default()
        }
        .clamped();
        Self {
            state,
            ritual_affinity: genotype.ritual_affinity,
        }
    }

    /// Replace the live vector with a persisted one.
    pub fn restore(&mut self, state: EmotionVector) {
        self.state = state.clamped();
    }

    pub fn state(&self) -> EmotionVector {
        self.state
    }

    /// React to a ritual's purity and, once decided, its outcome.
    ///
    /// Returns the raw impulse before clamping. A Spirit already at full
    /// anger still reports the provocation it received.
    pub fn stimulate(&mut self, purity: f64, outcome: Option<Outcome>) -> EmotionDelta {
        let purity = purity.clamp(0.0, 1.0);
        let deviation = 0.5 - purity;
        let affinity = self.ritual_affinity;

        let mut impulse = if deviation > 0.0 {
            EmotionDelta {
                anger: deviation * PURITY_ANGER_GAIN * affinity,
                trust: -deviation * PURITY_TRUST_GAIN * affinity,
                ..EmotionDelta::default()
            }
        } else {
            let reverence = -deviation;
            EmotionDelta {
                anger: -reverence * PURITY_TRUST_GAIN * affinity,
                trust: reverence * PURITY_TRUST_GAIN * affinity,
                ..EmotionDelta::default()
            }
        };

        if let Some(outcome) = outcome {
            impulse += outcome_impulse(outcome);
        }
        self.state.apply(&impulse);
        impulse
    }

    /// Passive drift over `hours`. Non-positive spans are ignored.
    pub fn decay(&mut self, hours: f64) {
        if hours <= 0.0 || !hours.is_finite() {
            return;
        }
        self.state.anger *= ANGER_DECAY.powf(hours);
        self.state.fear *= FEAR_DECAY.powf(hours);
        self.state.ennui += ENNUI_GROWTH * hours;
        self.state.clamp();
    }

    /// Extra boredom from being left alone.
    pub fn drift_ennui(&mut self, amount: f64) {
        self.state.ennui += amount;
        self.state.clamp();
    }

    pub fn effective_state(&self, modifiers: &EmotionModifiers) -> EmotionVector {
        self.state.with_modifiers(modifiers)
    }
}

fn outcome_impulse(outcome: Outcome) -> EmotionDelta {
    let zero = EmotionDelta::default();
    match outcome {
        Outcome::Anger => EmotionDelta {
            anger: 0.2,
            fear: 0.1,
            ..zero
        },
        Outcome::Reject => EmotionDelta { ennui: 0.05, ..zero },
        Outcome::Accept => EmotionDelta {
            trust: 0.05,
            ennui: -0.05,
            ..zero
        },
        Outcome::Silence => EmotionDelta {
            ennui: 0.1,
            curiosity: -0.05,
            ..zero
        },
        Outcome::Omen => EmotionDelta {
            curiosity: 0.05,
            fear: 0.02,
            ..zero
        },
        Outcome::Whisper => EmotionDelta {
            trust: 0.02,
            curiosity: 0.03,
            ..zero
        },
        Outcome::Lockout => EmotionDelta {
            anger: 0.3,
            ennui: 0.2,
            ..zero
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> EmotionEngine {
        EmotionEngine::new(&SpiritGenotype {
            ritual_affinity: 1.0,
            base_anger: 0.1,
            base_trust: 0.5,
            ..Default::default()
        })
    }

    #[test]
    fn test_baseline_from_genotype() {
        let e = EmotionEngine::new(&SpiritGenotype::default());
        assert_eq!(e.state().trust, 0.65);
        assert_eq!(e.state().anger, 0.1);
        assert_eq!(e.state().fear, 0.0);
    }

    #[test]
    fn test_impure_ritual_angers() {
        let mut e = engine();
        e.stimulate(0.0, None);
        assert!((e.state().anger - 0.3).abs() < 1e-12);
        assert!((e.state().trust - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_pure_ritual_soothes() {
        let mut e = engine();
        e.stimulate(1.0, Some(Outcome::Accept));
        assert!((e.state().trust - 0.65).abs() < 1e-12);
        assert_eq!(e.state().anger, 0.0);
        assert!((e.state().ennui - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_anger_outcome_table() {
        let mut e = engine();
        e.stimulate(0.5, Some(Outcome::Anger));
        assert!((e.state().anger - 0.3).abs() < 1e-12);
        assert!((e.state().fear - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_impulse_survives_saturation() {
        let mut e = engine();
        e.restore(EmotionVector {
            anger: 1.0,
            ..Default::default()
        });
        let impulse = e.stimulate(0.0, Some(Outcome::Reject));
        assert_eq!(e.state().anger, 1.0);
        assert!((impulse.anger - 0.2).abs() < 1e-12);
        assert!((impulse.ennui - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_decay_per_hour() {
        let mut e = engine();
        e.restore(EmotionVector {
            anger: 0.8,
            fear: 0.5,
            ennui: 0.2,
            ..Default::default()
        });
        e.decay(1.0);
        assert!((e.state().anger - 0.76).abs() < 1e-12);
        assert!((e.state().fear - 0.45).abs() < 1e-12);
        assert!((e.state().ennui - 0.21).abs() < 1e-12);

        let before = e.state();
        e.decay(0.0);
        e.decay(-3.0);
        assert_eq!(e.state(), before);
    }

    #[test]
    fn test_effective_state_leaves_base_untouched() {
        let e = engine();
        let base = e.state();
        let eff = e.effective_state(&EmotionModifiers {
            anger: 0.2,
            trust: -0.1,
            ennui: 0.0,
        });
        assert_eq!(e.state(), base);
        assert!(eff.anger > base.anger);
        assert!(eff.trust < base.trust);
    }
}
