//! Cognitive engine - experience, plasticity and verb clusters
//!
//! Verbs are grouped into clusters that share a drifting bias. Rewarding one
//! verb moves the whole cluster, so siblings the operator never invoked
//! inherit the sentiment. Plasticity shrinks as experience accumulates,
//! making an old Spirit harder to sway.

use serde::{Deserialize, Serialize};
use spirit_core::Outcome;

const TRAUMA_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCluster {
    pub id: String,
    pub verbs: Vec<String>,
    /// Shared sentiment, [-1, 1].
    pub bias: f64,
    /// How strongly rewards move the bias.
    pub volatility: f64,
}

impl ConceptCluster {
    pub fn new(id: &str, verbs: &[&str], volatility: f64) -> Self {
        Self {
            id: id.to_string(),
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
            bias: 0.0,
            volatility,
        }
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.verbs.iter().any(|v| v == verb)
    }
}

pub fn default_clusters() -> Vec<ConceptCluster> {
    vec![
        ConceptCluster::new("TECHNICAL_OPS", &["deploy", "run", "execute", "build"], 0.1),
        ConceptCluster::new(
            "DESTRUCTIVE_OPS",
            &["delete", "kill", "purge", "format", "terminate"],
            0.2,
        ),
        ConceptCluster::new("RITUAL_OPS", &["pray", "offer", "ritual", "bless"], 0.05),
        ConceptCluster::new("INQUIRY_OPS", &["analyze", "check", "view", "read"], 0.08),
    ]
}

/// Shape of the recent interaction history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionTrajectory {
    /// Mean change between successive purity scores.
    pub purity_trend: f64,
    /// Fraction of favourable outcomes.
    pub loyalty: f64,
}

#[derive(Debug, Clone)]
pub struct CognitiveEngine {
    xp: u64,
    stubbornness: f64,
    clusters: Vec<ConceptCluster>,
}

impl CognitiveEngine {
    pub fn new(stubbornness: f64) -> Self {
        Self {
            xp: 0,
            stubbornness,
            clusters: default_clusters(),
        }
    }

    /// Restore persisted progress. Empty cluster lists fall back to defaults.
    pub fn restore(&mut self, xp: u64, clusters: Vec<ConceptCluster>) {
        self.xp = xp;
        if clusters.is_empty() {
            tracing::warn!("No persisted clusters, using defaults");
            self.clusters = default_clusters();
        } else {
            self.clusters = clusters
                .into_iter()
                .map(|mut c| {
                    c.bias = c.bias.clamp(-1.0, 1.0);
                    c
                })
                .collect();
        }
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn gain_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_add(amount);
    }

    /// Experience points earned for an interaction with this reward.
    pub fn xp_for_reward(reward: f64) -> u64 {
        (reward.abs() * 10.0).ceil() as u64 + 1
    }

    pub fn plasticity(&self) -> f64 {
        let effective = self.xp as f64 * (1.0 + self.stubbornness);
        1.0 / (effective + 1.0).sqrt()
    }

    pub fn update_clusters(&mut self, verb: &str, reward: f64, trauma: f64) {
        let plasticity = self.plasticity();
        for cluster in self.clusters.iter_mut().filter(|c| c.contains(verb)) {
            cluster.bias += reward * cluster.volatility * plasticity;
            cluster.bias -= trauma * TRAUMA_WEIGHT * plasticity;
            cluster.bias = cluster.bias.clamp(-1.0, 1.0);
        }
    }

    pub fn verb_bias(&self, verb: &str) -> Option<f64> {
        self.clusters.iter().find(|c| c.contains(verb)).map(|c| c.bias)
    }

    pub fn clusters(&self) -> &[ConceptCluster] {
        &self.clusters
    }

    pub fn analyze_trajectory(outcomes: &[Outcome], purities: &[f64]) -> InteractionTrajectory {
        let purity_trend = if purities.len() < 2 {
            0.0
        } else {
            let total: f64 = purities.windows(2).map(|w| w[1] - w[0]).sum();
            total / (purities.len() - 1) as f64
        };
        let loyalty = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().filter(|o| o.is_positive()).count() as f64 / outcomes.len() as f64
        };
        InteractionTrajectory {
            purity_trend,
            loyalty,
        }
    }
}
