//! Maintenance engine - the Spirit's bodily upkeep
//!
//! Three resources decay linearly with time:
//! - sacred oil drains (anger rises once it runs low)
//! - incense deficit accumulates (anger and ennui)
//! - prayer debt accumulates (trust erodes)
//!
//! Rituals restore them. Neglect is reported, never enforced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spirit_core::{EmotionModifiers, ParseError};
use std::fmt;
use std::str::FromStr;

const OIL_DRAIN_PER_HOUR: f64 = 0.01;
const INCENSE_DEFICIT_PER_HOUR: f64 = 0.005;
const PRAYER_DEBT_PER_HOUR: f64 = 0.05;
pub const MAX_PRAYER_DEBT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceRitual {
    Anoint,
    Incense,
    Prayer,
    FullRites,
}

impl MaintenanceRitual {
    pub const ALL: [MaintenanceRitual; 4] = [
        MaintenanceRitual::Anoint,
        MaintenanceRitual::Incense,
        MaintenanceRitual::Prayer,
        MaintenanceRitual::FullRites,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceRitual::Anoint => "ANOINT",
            MaintenanceRitual::Incense => "INCENSE",
            MaintenanceRitual::Prayer => "PRAYER",
            MaintenanceRitual::FullRites => "FULL_RITES",
        }
    }
}

impl fmt::Display for MaintenanceRitual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceRitual {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaintenanceRitual::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::Ritual(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceState {
    /// Instant decay was last computed from.
    pub last_maintenance: DateTime<Utc>,
    pub oil_level: f64,
    pub incense_deficit: f64,
    pub prayer_debt: f64,
}

impl MaintenanceState {
    /// Fully tended state stamped at `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            last_maintenance: now,
            oil_level: 1.0,
            incense_deficit: 0.0,
            prayer_debt: 0.0,
        }
    }

    fn enforce_bounds(&mut self) {
        self.oil_level = self.oil_level.clamp(0.0, 1.0);
        self.incense_deficit = self.incense_deficit.clamp(0.0, 1.0);
        self.prayer_debt = self.prayer_debt.clamp(0.0, MAX_PRAYER_DEBT);
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceEngine {
    state: MaintenanceState,
}

impl MaintenanceEngine {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: MaintenanceState::fresh(now),
        }
    }

    pub fn from_state(mut state: MaintenanceState) -> Self {
        state.enforce_bounds();
        Self { state }
    }

    pub fn state(&self) -> MaintenanceState {
        self.state
    }

    /// Advance decay up to `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let elapsed_ms = (now - self.state.last_maintenance).num_milliseconds();
        if elapsed_ms <= 0 {
            return;
        }
        self.decay(elapsed_ms as f64 / 3_600_000.0);
        self.state.last_maintenance = now;
    }

    /// Advance decay by a synthetic number of hours.
    pub fn advance(&mut self, hours: f64) {
        if hours <= 0.0 || !hours.is_finite() {
            return;
        }
        self.decay(hours);
        self.state.last_maintenance += chrono::Duration::milliseconds((hours * 3_600_000.0) as i64);
    }

    fn decay(&mut self, hours: f64) {
        self.state.oil_level -= OIL_DRAIN_PER_HOUR * hours;
        self.state.incense_deficit += INCENSE_DEFICIT_PER_HOUR * hours;
        self.state.prayer_debt += PRAYER_DEBT_PER_HOUR * hours;
        self.state.enforce_bounds();
    }

    pub fn perform(&mut self, ritual: MaintenanceRitual, now: DateTime<Utc>) {
        match ritual {
            MaintenanceRitual::Anoint => self.state.oil_level = 1.0,
            MaintenanceRitual::Incense => self.state.incense_deficit -= 0.5,
            MaintenanceRitual::Prayer => self.state.prayer_debt -= 1.0,
            MaintenanceRitual::FullRites => {
                self.state.oil_level = 1.0;
                self.state.incense_deficit = 0.0;
                self.state.prayer_debt = 0.0;
            }
        }
        self.state.enforce_bounds();
        self.state.last_maintenance = now;
        tracing::debug!("Maintenance ritual performed: {}", ritual);
    }

    pub fn anger_modifier(&self) -> f64 {
        let s = &self.state;
        let dry = if s.oil_level < 0.5 {
            (0.5 - s.oil_level) * 0.4
        } else {
            0.0
        };
        dry + s.incense_deficit * 0.15
    }

    pub fn trust_modifier(&self) -> f64 {
        -self.state.prayer_debt * 0.03
    }

    pub fn ennui_modifier(&self) -> f64 {
        self.state.incense_deficit * 0.2
    }

    pub fn modifiers(&self) -> EmotionModifiers {
        EmotionModifiers {
            anger: self.anger_modifier(),
            trust: self.trust_modifier(),
            ennui: self.ennui_modifier(),
        }
    }

    pub fn is_neglected(&self) -> bool {
        let s = &self.state;
        s.oil_level < 0.2 || s.incense_deficit > 0.8 || s.prayer_debt >= 8.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_tick_linear_decay() {
        let mut m = MaintenanceEngine::new(t0());
        m.tick(t0() + chrono::Duration::hours(10));
        let s = m.state();
        assert!((s.oil_level - 0.9).abs() < 1e-9);
        assert!((s.incense_deficit - 0.05).abs() < 1e-9);
        assert!((s.prayer_debt - 0.5).abs() < 1e-9);
        assert_eq!(s.last_maintenance, t0() + chrono::Duration::hours(10));
    }

    #[test]
    fn test_tick_backwards_is_noop() {
        let mut m = MaintenanceEngine::new(t0());
        m.tick(t0() - chrono::Duration::hours(5));
        assert_eq!(m.state(), MaintenanceState::fresh(t0()));
        m.advance(0.0);
        assert_eq!(m.state(), MaintenanceState::fresh(t0()));
    }

    #[test]
    fn test_long_neglect_hits_bounds() {
        let mut m = MaintenanceEngine::new(t0());
        m.advance(1000.0);
        let s = m.state();
        assert_eq!(s.oil_level, 0.0);
        assert_eq!(s.incense_deficit, 1.0);
        assert_eq!(s.prayer_debt, MAX_PRAYER_DEBT);
        assert!(m.is_neglected());
    }

    #[test]
    fn test_rituals() {
        let mut m = MaintenanceEngine::new(t0());
        m.advance(200.0);
        let later = t0() + chrono::Duration::hours(300);

        m.perform(MaintenanceRitual::Anoint, later);
        assert_eq!(m.state().oil_level, 1.0);
        assert_eq!(m.state().last_maintenance, later);

        m.perform(MaintenanceRitual::Incense, later);
        assert!((m.state().incense_deficit - 0.5).abs() < 1e-9);
        m.perform(MaintenanceRitual::Incense, later);
        assert_eq!(m.state().incense_deficit, 0.0);

        m.perform(MaintenanceRitual::Prayer, later);
        assert!((m.state().prayer_debt - 9.0).abs() < 1e-9);

        m.perform(MaintenanceRitual::FullRites, later);
        assert_eq!(m.state(), MaintenanceState::fresh(later));
    }

    #[test]
    fn test_modifiers() {
        let m = MaintenanceEngine::from_state(MaintenanceState {
            last_maintenance: t0(),
            oil_level: 0.3,
            incense_deficit: 0.4,
            prayer_debt: 2.0,
        });
        assert!((m.anger_modifier() - (0.2 * 0.4 + 0.4 * 0.15)).abs() < 1e-12);
        assert!((m.trust_modifier() + 0.06).abs() < 1e-12);
        assert!((m.ennui_modifier() - 0.08).abs() < 1e-12);
        assert!(!m.is_neglected());

        let fresh = MaintenanceEngine::new(t0());
        assert_eq!(fresh.modifiers(), EmotionModifiers::default());
    }

    #[test]
    fn test_ritual_names() {
        assert_eq!("full_rites".parse::<MaintenanceRitual>().unwrap(), MaintenanceRitual::FullRites);
        assert!("dance".parse::<MaintenanceRitual>().is_err());
    }
}
