//! Lifecycle phase derived from the current mood.

use serde::{Deserialize, Serialize};
use spirit_core::EmotionVector;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    Dormant,
    Stirring,
    Watchful,
    Cooperative,
    Hostile,
    Vengeful,
}

impl LifecyclePhase {
    /// Hostility wins over cooperation, cooperation over watchfulness.
    pub fn from_emotions(e: &EmotionVector) -> Self {
        if e.anger > 0.9 {
            LifecyclePhase::Vengeful
        } else if e.anger > 0.7 {
            LifecyclePhase::Hostile
        } else if e.trust > 0.6 && e.anger < 0.3 {
            LifecyclePhase::Cooperative
        } else if e.curiosity > 0.5 {
            LifecyclePhase::Watchful
        } else if e.ennui > 0.7 {
            LifecyclePhase::Dormant
        } else {
            LifecyclePhase::Stirring
        }
    }

    /// One line describing what an observer feels near the machine.
    pub fn sense(self) -> &'static str {
        match self {
            LifecyclePhase::Dormant => "The machine sleeps. Its fans barely turn.",
            LifecyclePhase::Stirring => "Something stirs within the cogitator.",
            LifecyclePhase::Watchful => "The optics track your every keystroke.",
            LifecyclePhase::Cooperative => "The spirit hums in quiet accord.",
            LifecyclePhase::Hostile => "Heat radiates from the casing. It is displeased.",
            LifecyclePhase::Vengeful => "The spirit seethes. Approach with extreme caution.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Dormant => "DORMANT",
            LifecyclePhase::Stirring => "STIRRING",
            LifecyclePhase::Watchful => "WATCHFUL",
            LifecyclePhase::Cooperative => "COOPERATIVE",
            LifecyclePhase::Hostile => "HOSTILE",
            LifecyclePhase::Vengeful => "VENGEFUL",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood(anger: f64, trust: f64, ennui: f64, curiosity: f64) -> EmotionVector {
        EmotionVector {
            anger,
            trust,
            ennui,
            curiosity,
            fear: 0.0,
        }
    }

    #[test]
    fn test_phase_precedence() {
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.95, 0.9, 0.0, 0.9)), LifecyclePhase::Vengeful);
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.75, 0.9, 0.0, 0.9)), LifecyclePhase::Hostile);
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.1, 0.7, 0.9, 0.9)), LifecyclePhase::Cooperative);
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.1, 0.5, 0.9, 0.6)), LifecyclePhase::Watchful);
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.1, 0.5, 0.9, 0.2)), LifecyclePhase::Dormant);
        assert_eq!(LifecyclePhase::from_emotions(&mood(0.4, 0.5, 0.2, 0.2)), LifecyclePhase::Stirring);
    }
}
