//! Will engine - from context to a sampled outcome
//!
//! The decision runs in fixed stages:
//!
//! 1. **Trauma**: a matching scar bypasses deliberation entirely
//! 2. **Base scoring**: exponential scores over effective emotions and purity
//! 3. **Modulation**: narrative echo, learned associations, chaos, cluster
//!    bias and the operator bond, each renormalised
//! 4. **Sampling**: one uniform draw against the cumulative mass
//!
//! The engine is pure. It reads the context, consumes random draws and
//! returns an outcome; persistence and logging belong to the caller.

use serde::Serialize;
use spirit_core::{DecisionContext, Outcome, OutcomeDistribution, RandomSource};

/// Sharpness of the base distribution.
const INTENSITY: f64 = 5.0;
/// LOCKOUT is unreachable below this effective anger.
const LOCKOUT_GATE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Base,
    NarrativeEcho,
    Associations,
    Chaos,
    ClusterBias,
    Bond,
}

/// Every intermediate distribution of one deliberation, in stage order.
#[derive(Debug, Clone, Serialize)]
pub struct Deliberation {
    pub stages: Vec<(Stage, OutcomeDistribution)>,
}

impl Deliberation {
    pub fn final_distribution(&self) -> OutcomeDistribution {
        self.stages
            .last()
            .map(|(_, d)| *d)
            .unwrap_or_else(OutcomeDistribution::uniform)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WillEngine;

impl WillEngine {
    pub fn new() -> Self {
        Self
    }

    /// Choose an outcome for `ctx`.
    pub fn decide(&self, ctx: &DecisionContext, rng: &mut dyn RandomSource) -> Outcome {
        if let Some(scar) = ctx.scar {
            let roll = rng.uniform();
            return if roll < 0.1 {
                Outcome::Silence
            } else if roll < 0.2 {
                Outcome::Whisper
            } else if scar.severity > 0.7 {
                Outcome::Anger
            } else {
                Outcome::Reject
            };
        }

        self.deliberate(ctx).final_distribution().sample(rng.uniform())
    }

    /// Run scoring and every modulation stage without sampling.
    pub fn deliberate(&self, ctx: &DecisionContext) -> Deliberation {
        let mut stages = Vec::with_capacity(6);
        let mut dist = base_distribution(ctx).normalized();
        stages.push((Stage::Base, dist));

        if let Some(category) = ctx.recalled {
            if category.is_hostile() {
                dist.scale(Outcome::Anger, 1.4);
                dist.scale(Outcome::Reject, 1.2);
                dist.scale(Outcome::Silence, 1.1);
            } else if category.is_benevolent() {
                dist.scale(Outcome::Accept, 1.3);
                dist.scale(Outcome::Whisper, 1.2);
            }
        }
        dist = dist.normalized();
        stages.push((Stage::NarrativeEcho, dist));

        dist = dist.weighted(&ctx.association_weights).normalized();
        stages.push((Stage::Associations, dist));

        if ctx.chaos {
            dist.scale(Outcome::Omen, 2.0);
            dist.scale(Outcome::Anger, 1.5);
            dist.scale(Outcome::Silence, 0.5);
        }
        dist = dist.normalized();
        stages.push((Stage::Chaos, dist));

        if let Some(bias) = ctx.cluster_bias {
            if bias > 0.0 {
                dist.scale(Outcome::Accept, 1.0 + bias * 0.3);
            } else if bias < 0.0 {
                dist.scale(Outcome::Reject, 1.0 - bias * 0.3);
                dist.scale(Outcome::Anger, 1.0 - bias * 0.2);
            }
        }
        dist = dist.normalized();
        stages.push((Stage::ClusterBias, dist));

        if let Some(bond) = ctx.bond {
            let trust = bond.trust;
            if trust > 0.0 {
                dist.scale(Outcome::Accept, 1.0 + trust);
                dist.scale(Outcome::Whisper, 1.0 + trust * 0.5);
            } else if trust < 0.0 {
                dist.scale(Outcome::Reject, 1.0 - trust);
                dist.scale(Outcome::Anger, 1.0 - trust * 0.5);
            }
            let patience = bond.patience.clamp(0.0, 1.0);
            dist.scale(Outcome::Anger, 1.0 - patience);
            dist.scale(Outcome::Lockout, 1.0 - patience * 0.5);
        }
        dist = dist.normalized();
        stages.push((Stage::Bond, dist));

        Deliberation { stages }
    }
}

fn base_distribution(ctx: &DecisionContext) -> OutcomeDistribution {
    let e = &ctx.emotions;
    let repetition = ctx.repetition.clamp(0.0, 1.0);

    let ennui = (e.ennui + repetition * 0.8).min(1.0);
    let anger = (e.anger + repetition * 0.4).min(1.0);
    let fear = if ctx.purity_trend < -0.2 {
        (e.fear + 0.2).min(1.0)
    } else {
        e.fear
    };
    let purity = (ctx.purity - 0.5 - repetition * 1.5) * 2.0;
    let cluster = ctx.cluster_bias.unwrap_or(0.0);
    let hostile_echo = if ctx.recalled.is_some_and(|c| c.is_hostile()) { 1.0 } else { 0.0 };
    let kind_echo = if ctx.recalled.is_some_and(|c| c.is_benevolent()) { 1.0 } else { 0.0 };

    let score = |x: f64| (INTENSITY * x).exp();

    let mut d = OutcomeDistribution::from_scores([0.0; 7]);
    d[Outcome::Accept] = score(e.trust - anger - ennui + e.curiosity + purity + 0.1 * cluster);
    d[Outcome::Reject] = score(anger + ennui - purity - 0.1 * cluster);
    d[Outcome::Silence] = score(ennui * ennui - 0.5);
    d[Outcome::Anger] = score(anger * anger * ctx.entropy + fear - purity + 0.1 * hostile_echo);
    d[Outcome::Omen] = score(e.curiosity * ctx.semantic_novelty - 0.2);
    d[Outcome::Whisper] = score(e.trust * ctx.semantic_alignment - 0.2 + 0.1 * kind_echo);
    d[Outcome::Lockout] = if e.anger < LOCKOUT_GATE {
        0.0
    } else {
        score(e.anger * 12.0 - 9.0 + (-purity).max(0.0))
    };
    d
}
