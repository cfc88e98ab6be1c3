//! Symbolic memory - the words the Spirit has heard
//!
//! Tracks normalised tokens with frequency and emotional charge so an
//! invocation can be scored for novelty (how much is unfamiliar) and for
//! alignment (how much echoes the adopted vocabulary).

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

const MIN_TOKEN_LEN: usize = 3;
/// Sightings after which a token is no longer novel at all.
const FAMILIARITY_SATURATION: f64 = 20.0;
const STALE_AFTER_HOURS: i64 = 24;
const STALE_DECAY: f64 = 0.9;

/// Words that carry an inherent charge, in [-1, 1].
const CHARGED_WORDS: [(&str, f64); 12] = [
    ("omnissiah", 0.8),
    ("bless", 0.6),
    ("praise", 0.6),
    ("sacred", 0.5),
    ("please", 0.4),
    ("thanks", 0.4),
    ("force", -0.5),
    ("hack", -0.6),
    ("kill", -0.6),
    ("destroy", -0.7),
    ("heresy", -0.8),
    ("abominable", -0.9),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicToken {
    pub frequency: u32,
    pub last_seen: DateTime<Utc>,
    pub emotional_charge: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolicMemory {
    tokens: HashMap<String, SymbolicToken>,
}

/// Lowercase and strip everything but ASCII letters and digits.
pub fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn charge_of(word: &str) -> f64 {
    CHARGED_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, c)| *c)
        .unwrap_or(0.0)
}

impl SymbolicMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, semantic: &[String], now: DateTime<Utc>) {
        for word in semantic.iter().map(|t| normalize(t)) {
            if word.len() < MIN_TOKEN_LEN {
                continue;
            }
            let charge = charge_of(&word);
            let token = self.tokens.entry(word).or_insert(SymbolicToken {
                frequency: 0,
                last_seen: now,
                emotional_charge: charge,
            });
            token.frequency += 1;
            token.last_seen = now;
        }
    }

    /// Mean unfamiliarity of `semantic`, 0.5 when there is nothing to judge.
    pub fn novelty(&self, semantic: &[String]) -> f64 {
        let words: Vec<String> = semantic.iter().map(|t| normalize(t)).collect();
        if words.is_empty() {
            return 0.5;
        }
        let total: f64 = words
            .iter()
            .map(|w| match self.tokens.get(w) {
                None => 1.0,
                Some(t) => (1.0 - t.frequency as f64 / FAMILIARITY_SATURATION).max(0.0),
            })
            .sum();
        total / words.len() as f64
    }

    /// Fraction of `semantic` found in `adopted`, 0.5 when either side is empty.
    pub fn alignment(semantic: &[String], adopted: &[String]) -> f64 {
        if semantic.is_empty() || adopted.is_empty() {
            return 0.5;
        }
        let adopted: Vec<String> = adopted.iter().map(|a| normalize(a)).collect();
        let matches = semantic
            .iter()
            .filter(|t| adopted.contains(&normalize(t)))
            .count();
        matches as f64 / semantic.len() as f64
    }

    /// Mean charge of the known tokens in `semantic`.
    pub fn emotional_charge(&self, semantic: &[String]) -> f64 {
        let charges: Vec<f64> = semantic
            .iter()
            .filter_map(|t| self.tokens.get(&normalize(t)))
            .map(|t| t.emotional_charge)
            .collect();
        if charges.is_empty() {
            0.0
        } else {
            charges.iter().sum::<f64>() / charges.len() as f64
        }
    }

    /// Fade tokens unseen for a day. Frequency never drops below one.
    pub fn decay(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(STALE_AFTER_HOURS);
        for token in self.tokens.values_mut().filter(|t| t.last_seen < cutoff) {
            token.frequency = ((token.frequency as f64 * STALE_DECAY).floor() as u32).max(1);
        }
    }

    pub fn token(&self, word: &str) -> Option<&SymbolicToken> {
        self.tokens.get(&normalize(word))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
