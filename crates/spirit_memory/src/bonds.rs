//! Bond engine - per-operator relationships
//!
//! Bonds are separate from the Spirit's global mood. Familiarity grows with
//! every visit and fades with absence; trust moves with outcomes and erodes
//! after a week away. The top rank resists that erosion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spirit_core::{BondModifiers, Outcome, ParseError};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const FAMILIARITY_GAIN: f64 = 0.01;
const FAMILIARITY_DECAY_PER_DAY: f64 = 0.005;
const TRUST_DECAY_PER_DAY: f64 = 0.02;
const TRUST_GRACE_DAYS: f64 = 7.0;
const SHARED_SCAR_TRUST: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorTitle {
    Stranger,
    Adept,
    Enginseer,
    Magos,
}

impl OperatorTitle {
    pub const ALL: [OperatorTitle; 4] = [
        OperatorTitle::Stranger,
        OperatorTitle::Adept,
        OperatorTitle::Enginseer,
        OperatorTitle::Magos,
    ];

    /// Highest rank whose thresholds are both met.
    pub fn from_standing(familiarity: f64, trust: f64) -> Self {
        if familiarity >= 0.8 && trust >= 0.6 {
            OperatorTitle::Magos
        } else if familiarity >= 0.5 && trust >= 0.3 {
            OperatorTitle::Enginseer
        } else if familiarity >= 0.2 && trust >= 0.1 {
            OperatorTitle::Adept
        } else {
            OperatorTitle::Stranger
        }
    }

    fn trust_bonus(self) -> f64 {
        match self {
            OperatorTitle::Stranger => 0.0,
            OperatorTitle::Adept => 0.05,
            OperatorTitle::Enginseer => 0.1,
            OperatorTitle::Magos => 0.2,
        }
    }

    /// Fraction of the normal trust erosion rate applied during absence.
    fn erosion_rate(self) -> f64 {
        match self {
            OperatorTitle::Magos => 0.1,
            _ => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperatorTitle::Stranger => "STRANGER",
            OperatorTitle::Adept => "ADEPT",
            OperatorTitle::Enginseer => "ENGINSEER",
            OperatorTitle::Magos => "MAGOS",
        }
    }
}

impl fmt::Display for OperatorTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorTitle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorTitle::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::OperatorTitle(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub user_id: String,
    pub familiarity: f64,
    pub bond_trust: f64,
    pub last_seen: DateTime<Utc>,
    pub positive_count: u32,
    pub negative_count: u32,
    pub shared_scars: Vec<String>,
    pub title: OperatorTitle,
}

impl Bond {
    fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            familiarity: 0.0,
            bond_trust: 0.0,
            last_seen: now,
            positive_count: 0,
            negative_count: 0,
            shared_scars: Vec::new(),
            title: OperatorTitle::Stranger,
        }
    }

    fn refresh_title(&mut self) {
        self.title = OperatorTitle::from_standing(self.familiarity, self.bond_trust);
    }

    /// Erode familiarity and trust for the time since `last_seen`.
    fn erode(&mut self, now: DateTime<Utc>) {
        let days = (now - self.last_seen).num_milliseconds() as f64 / 86_400_000.0;
        if days > 1.0 {
            self.familiarity = (self.familiarity - days * FAMILIARITY_DECAY_PER_DAY).max(0.0);
        }
        if days > TRUST_GRACE_DAYS {
            let erosion = (days - TRUST_GRACE_DAYS) * TRUST_DECAY_PER_DAY * self.title.erosion_rate();
            self.bond_trust = if self.bond_trust > 0.0 {
                (self.bond_trust - erosion).max(0.0)
            } else {
                (self.bond_trust + erosion).min(0.0)
            };
        }
    }
}

fn trust_delta(outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Accept => 0.02,
        Outcome::Whisper => 0.03,
        Outcome::Reject => -0.01,
        Outcome::Anger => -0.05,
        Outcome::Lockout => -0.3,
        Outcome::Silence | Outcome::Omen => 0.0,
    }
}

#[derive(Debug, Clone, Default)]
pub struct BondEngine {
    bonds: HashMap<String, Bond>,
}

impl BondEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bonds(bonds: Vec<Bond>) -> Self {
        Self {
            bonds: bonds
                .into_iter()
                .map(|mut b| {
                    b.familiarity = b.familiarity.clamp(0.0, 1.0);
                    b.bond_trust = b.bond_trust.clamp(-1.0, 1.0);
                    b.refresh_title();
                    (b.user_id.clone(), b)
                })
                .collect(),
        }
    }

    pub fn record_interaction(
        &mut self,
        user_id: &str,
        outcome: Outcome,
        scar_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> &Bond {
        let bond = self
            .bonds
            .entry(user_id.to_string())
            .or_insert_with(|| Bond::new(user_id, now));

        bond.erode(now);

        bond.familiarity = (bond.familiarity + FAMILIARITY_GAIN).min(1.0);
        let delta = trust_delta(outcome);
        bond.bond_trust = (bond.bond_trust + delta).clamp(-1.0, 1.0);
        if delta > 0.0 {
            bond.positive_count += 1;
        } else if delta < 0.0 {
            bond.negative_count += 1;
        }

        if let Some(id) = scar_id {
            if !bond.shared_scars.iter().any(|s| s == id) {
                bond.shared_scars.push(id.to_string());
                bond.bond_trust = (bond.bond_trust + SHARED_SCAR_TRUST).min(1.0);
            }
        }

        bond.last_seen = now;
        let previous = bond.title;
        bond.refresh_title();
        if bond.title != previous {
            tracing::info!("Operator {} is now {}", bond.user_id, bond.title);
        }
        bond
    }

    pub fn bond(&self, user_id: &str) -> Option<&Bond> {
        self.bonds.get(user_id)
    }

    pub fn has_bond(&self, user_id: &str) -> bool {
        self.bonds.contains_key(user_id)
    }

    pub fn trust_modifier(&self, user_id: &str) -> f64 {
        self.bonds
            .get(user_id)
            .map(|b| b.bond_trust * 0.3 + b.title.trust_bonus())
            .unwrap_or(0.0)
    }

    pub fn patience_modifier(&self, user_id: &str) -> f64 {
        self.bonds
            .get(user_id)
            .map(|b| b.familiarity * 0.15)
            .unwrap_or(0.0)
    }

    /// Modifiers for the Will engine; `None` for operators never met.
    pub fn modifiers(&self, user_id: &str) -> Option<BondModifiers> {
        self.has_bond(user_id).then(|| BondModifiers {
            trust: self.trust_modifier(user_id),
            patience: self.patience_modifier(user_id),
        })
    }

    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.values()
    }
}
