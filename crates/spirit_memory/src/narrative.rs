//! Narrative memory - the Spirit's legends
//!
//! Only interactions that clear a significance threshold become events.
//! The store is bounded: a full store admits a newcomer only by evicting
//! the least significant event, and only if the newcomer outranks it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use spirit_core::{EmotionVector, EventCategory, Outcome};
use uuid::Uuid;

pub const SIGNIFICANCE_THRESHOLD: f64 = 0.4;
pub const DEFAULT_CAPACITY: usize = 100;

const BATTLE_VERBS: [&str; 6] = ["delete", "kill", "purge", "terminate", "destroy", "attack"];
const RITUAL_VERBS: [&str; 6] = ["pray", "bless", "anoint", "ritual", "incense", "offer"];

fn category_weight(category: EventCategory) -> f64 {
    match category {
        EventCategory::Battle => 0.3,
        EventCategory::Betrayal => 0.4,
        EventCategory::Triumph => 0.25,
        EventCategory::Communion => 0.2,
        EventCategory::Trauma => 0.5,
        EventCategory::Ritual => 0.15,
    }
}

fn base_significance(category: EventCategory) -> f64 {
    match category {
        EventCategory::Trauma => 0.6,
        EventCategory::Betrayal => 0.5,
        EventCategory::Battle => 0.4,
        EventCategory::Triumph => 0.35,
        EventCategory::Ritual => 0.25,
        EventCategory::Communion => 0.2,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalImpact {
    pub anger: f64,
    pub trust: f64,
    pub fear: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub category: EventCategory,
    pub summary: String,
    pub operator_id: Option<String>,
    pub emotional_impact: EmotionalImpact,
    pub significance: f64,
    pub verb: String,
    pub recall_count: u32,
}

/// One finished interaction, as seen by narrative memory.
#[derive(Debug, Clone)]
pub struct Episode<'a> {
    pub verb: &'a str,
    pub outcome: Outcome,
    pub before: EmotionVector,
    pub after: EmotionVector,
    pub operator: Option<&'a str>,
    pub scarred: bool,
    pub at: DateTime<Utc>,
}

impl Episode<'_> {
    fn classify(&self, impact: &EmotionalImpact) -> EventCategory {
        let verb = self.verb.to_lowercase();
        if self.scarred {
            EventCategory::Trauma
        } else if impact.trust.abs() > 0.2
            && matches!(self.outcome, Outcome::Anger | Outcome::Reject)
        {
            EventCategory::Betrayal
        } else if BATTLE_VERBS.iter().any(|v| verb.contains(v)) || impact.anger.abs() > 0.3 {
            EventCategory::Battle
        } else if self.outcome.is_positive() && impact.trust.abs() > 0.1 {
            EventCategory::Triumph
        } else if RITUAL_VERBS.iter().any(|v| verb.contains(v)) {
            EventCategory::Ritual
        } else {
            EventCategory::Communion
        }
    }

    fn summarize(&self, category: EventCategory) -> String {
        let who = self.operator.unwrap_or("an unknown operator");
        let verb = self.verb;
        let outcome = self.outcome.as_str().to_lowercase();
        match category {
            EventCategory::Trauma => format!(
                "The wound of '{}' was carved by {}. The spirit answered with {} and will not forget.",
                verb, who, outcome
            ),
            EventCategory::Betrayal => format!(
                "{} invoked '{}' and broke faith. The spirit responded with {}.",
                who, verb, outcome
            ),
            EventCategory::Battle => format!(
                "A battle over '{}' was waged with {}. It ended in {}.",
                verb, who, outcome
            ),
            EventCategory::Triumph => format!(
                "{} performed '{}' and was rewarded with {}. A bond was forged.",
                who, verb, outcome
            ),
            EventCategory::Ritual => format!(
                "The rite of '{}' was observed by {}. The spirit was {}.",
                verb, who, outcome
            ),
            EventCategory::Communion => format!(
                "A quiet communion of '{}' with {} ended in {}.",
                verb, who, outcome
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NarrativeMemory {
    events: Vec<NarrativeEvent>,
    capacity: usize,
}

impl Default for NarrativeMemory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NarrativeMemory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Restore persisted events, keeping the most significant when over capacity.
    pub fn restore(&mut self, mut events: Vec<NarrativeEvent>) {
        events.sort_by(|a, b| b.significance.total_cmp(&a.significance));
        events.truncate(self.capacity);
        self.events = events;
    }

    /// Score an interaction and store it if it is memorable. Returns the stored event.
    pub fn evaluate_interaction(&mut self, episode: &Episode<'_>) -> Option<NarrativeEvent> {
        let delta = episode.after.delta_from(&episode.before);
        let impact = EmotionalImpact {
            anger: delta.anger,
            trust: delta.trust,
            fear: delta.fear,
        };
        let category = episode.classify(&impact);

        let mut significance = base_significance(category)
            + (impact.anger.abs() + impact.trust.abs() + impact.fear.abs()) * 0.3;
        if episode.operator.is_some() {
            significance += 0.1;
        }
        if episode.scarred {
            significance += 0.2;
        }
        significance = (significance * (1.0 + category_weight(category))).clamp(0.0, 1.0);

        if significance < SIGNIFICANCE_THRESHOLD {
            return None;
        }

        let event = NarrativeEvent {
            id: format!("{}-{}", category.as_str().to_lowercase(), Uuid::new_v4()),
            timestamp: episode.at,
            category,
            summary: episode.summarize(category),
            operator_id: episode.operator.map(str::to_string),
            emotional_impact: impact,
            significance,
            verb: episode.verb.to_string(),
            recall_count: 0,
        };
        if self.insert(event.clone()) {
            tracing::info!("New legend ({}): {}", category, event.summary);
            Some(event)
        } else {
            None
        }
    }

    /// Bounded insertion. Returns whether the event was kept.
    pub fn insert(&mut self, event: NarrativeEvent) -> bool {
        if self.events.len() >= self.capacity {
            let weakest = self
                .events
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.significance.total_cmp(&b.1.significance))
                .map(|(i, e)| (i, e.significance));
            match weakest {
                Some((index, significance)) if significance < event.significance => {
                    self.events.swap_remove(index);
                }
                _ => return false,
            }
        }
        self.events.push(event);
        true
    }

    pub fn recall(&mut self, id: &str) -> Option<&NarrativeEvent> {
        let event = self.events.iter_mut().find(|e| e.id == id)?;
        event.recall_count += 1;
        Some(event)
    }

    /// Recall the most significant legend involving `verb`.
    pub fn recall_for_verb(&mut self, verb: &str) -> Option<&NarrativeEvent> {
        let event = self
            .events
            .iter_mut()
            .filter(|e| e.verb == verb)
            .max_by(|a, b| a.significance.total_cmp(&b.significance))?;
        event.recall_count += 1;
        Some(event)
    }

    pub fn most_significant(&self, limit: usize) -> Vec<&NarrativeEvent> {
        let mut sorted: Vec<&NarrativeEvent> = self.events.iter().collect();
        sorted.sort_by(|a, b| b.significance.total_cmp(&a.significance));
        sorted.truncate(limit);
        sorted
    }

    pub fn for_operator(&self, operator: &str) -> Vec<&NarrativeEvent> {
        self.events
            .iter()
            .filter(|e| e.operator_id.as_deref() == Some(operator))
            .collect()
    }

    pub fn by_category(&self, category: EventCategory) -> Vec<&NarrativeEvent> {
        self.events.iter().filter(|e| e.category == category).collect()
    }

    /// Whether an event for `verb` was recorded within `window` before `now`.
    pub fn has_similar_recent(&self, verb: &str, window: Duration, now: DateTime<Utc>) -> bool {
        self.events
            .iter()
            .any(|e| e.verb == verb && now - e.timestamp < window)
    }

    pub fn events(&self) -> &[NarrativeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
