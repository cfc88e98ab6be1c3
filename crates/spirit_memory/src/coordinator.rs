//! Spirit - integrates every subsystem into one persistent personality
//!
//! Two transactions drive everything:
//! - `interact`: one ritual, from verb and purity to a sampled [`Outcome`]
//! - `pulse`: the autonomous passage of time (decay, introspection, dreams)
//!
//! All state sits behind a single `tokio::sync::Mutex`, so interactions,
//! maintenance rites, pulses and flushes never interleave. Persistence is
//! best-effort: a failed write is logged and the in-memory state stays
//! authoritative.

use anyhow::Result;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use spirit_core::{
    DecisionContext, EmotionVector, MemoryConfig, Outcome, RandomSource, ScarTrigger,
    SpiritGenotype, SystemRandom,
};
use spirit_limbic::{
    generate_genotype, EmotionEngine, LifecyclePhase, MaintenanceEngine, MaintenanceRitual,
    MaintenanceState, WillEngine,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bonds::{Bond, BondEngine};
use crate::cognitive::{CognitiveEngine, ConceptCluster};
use crate::learning::{LearningContext, LearningEngine, Scar};
use crate::narrative::{Episode, NarrativeEvent, NarrativeMemory};
use crate::store::{InteractionRecord, SpiritStore};
use crate::symbolic::SymbolicMemory;
use crate::warm::WarmMemory;

/// Idle time after which a pulse lets boredom creep in.
const IDLE_AFTER_SECS: i64 = 300;
const IDLE_ENNUI_DRIFT: f64 = 0.02;
/// Every n-th pulse dreams about a significant memory.
const DREAM_EVERY: u64 = 5;
const DREAM_POOL: usize = 5;
/// Reward a dream replays into its verb's clusters.
const DREAM_REWARD: f64 = 0.05;
const RESTLESS_CHANCE: f64 = 0.01;
const RESTLESS_SEVERITY: f64 = 0.3;
const RESTLESS_VERB: &str = "daemon:idle";
/// No second legend for the same verb within this window.
const LEGEND_COOLDOWN_SECS: i64 = 60;
const VIVID_RECALL: f64 = 0.7;
const SNAPSHOT_MEMORIES: usize = 10;

/// Construction knobs for [`Spirit::awaken_with`].
#[derive(Default)]
pub struct SpiritOptions {
    /// Used only when the store holds no genotype yet.
    pub genotype: Option<SpiritGenotype>,
    /// Defaults to [`SystemRandom`].
    pub random: Option<Box<dyn RandomSource>>,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CognitiveSnapshot {
    pub xp: u64,
    pub clusters: Vec<ConceptCluster>,
    pub plasticity: f64,
}

/// Read-only view of the whole Spirit for display layers.
#[derive(Debug, Clone, Serialize)]
pub struct SpiritSnapshot {
    pub emotions: EmotionVector,
    pub maintenance: MaintenanceState,
    pub cognitive: CognitiveSnapshot,
    pub mutterings: Vec<String>,
    pub memories: Vec<NarrativeEvent>,
    pub phase: LifecyclePhase,
    pub sense: String,
    pub neglected: bool,
    pub genotype: SpiritGenotype,
}

struct SpiritCore {
    genotype: SpiritGenotype,
    emotion: EmotionEngine,
    maintenance: MaintenanceEngine,
    cognitive: CognitiveEngine,
    learning: LearningEngine,
    bonds: BondEngine,
    narrative: NarrativeMemory,
    warm: WarmMemory,
    symbolic: SymbolicMemory,
    will: WillEngine,
    rng: Box<dyn RandomSource>,
    mutterings: VecDeque<String>,
    pulse_count: u64,
    last_activity: DateTime<Utc>,
}

impl SpiritCore {
    fn mutter(&mut self, line: String, cap: usize) {
        self.mutterings.push_back(line);
        while self.mutterings.len() > cap {
            self.mutterings.pop_front();
        }
    }
}

pub struct Spirit {
    core: Mutex<SpiritCore>,
    store: Arc<dyn SpiritStore>,
    memory: MemoryConfig,
}

fn log_write_failure(what: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!("Failed to persist {}: {:#}", what, e);
    }
}

fn sanitize_purity(purity: f64) -> f64 {
    if purity.is_finite() {
        purity.clamp(0.0, 1.0)
    } else {
        tracing::warn!("Non-finite purity {}, treating as neutral", purity);
        0.5
    }
}

impl Spirit {
    /// Wake the Spirit stored in `store`, or give birth to a new one.
    pub async fn awaken(store: Arc<dyn SpiritStore>) -> Self {
        Self::awaken_with(store, SpiritOptions::default()).await
    }

    pub async fn awaken_with(store: Arc<dyn SpiritStore>, options: SpiritOptions) -> Self {
        let now = Utc::now();
        let mut rng = options
            .random
            .unwrap_or_else(|| Box::new(SystemRandom::new()));

        // === Genotype ===
        let genotype = match store.load_genotype().await {
            Ok(Some(genotype)) => genotype,
            Ok(None) => {
                let genotype = options
                    .genotype
                    .unwrap_or_else(|| generate_genotype(rng.as_mut()));
                tracing::info!("A new Machine Spirit is born ({})", genotype.temperament);
                log_write_failure("genotype", store.save_genotype(&genotype).await);
                genotype
            }
            Err(e) => {
                tracing::warn!("Failed to load genotype, rolling a transient one: {:#}", e);
                options
                    .genotype
                    .unwrap_or_else(|| generate_genotype(rng.as_mut()))
            }
        };

        // === Emotions ===
        let mut emotion = EmotionEngine::new(&genotype);
        match store.load_emotions().await {
            Ok(Some(state)) => emotion.restore(state),
            Ok(None) => tracing::debug!("No persisted emotions, starting from baseline"),
            Err(e) => tracing::warn!("Failed to load emotions, using baseline: {:#}", e),
        }

        // === Learning ===
        let learning = match store.load_learning_blob().await {
            Ok(Some(blob)) => match LearningEngine::from_bytes(&blob) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!("Corrupt learning state, rebuilding from tables: {:#}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to load learning state: {:#}", e);
                None
            }
        };
        let learning = match learning {
            Some(engine) => engine,
            None => {
                let vocabulary = store.load_vocabulary().await.unwrap_or_else(|e| {
                    tracing::warn!("Failed to load vocabulary: {:#}", e);
                    Vec::new()
                });
                let scars = store.load_scars().await.unwrap_or_else(|e| {
                    tracing::warn!("Failed to load scars: {:#}", e);
                    Vec::new()
                });
                LearningEngine::from_parts(vocabulary, scars)
            }
        };

        // === Cognition ===
        let mut cognitive = CognitiveEngine::new(genotype.stubbornness);
        let xp = match store.load_xp().await {
            Ok(xp) => xp.unwrap_or(0),
            Err(e) => {
                tracing::warn!("Failed to load XP: {:#}", e);
                0
            }
        };
        let clusters = store.load_clusters().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load clusters: {:#}", e);
            Vec::new()
        });
        cognitive.restore(xp, clusters);

        // === Maintenance ===
        let maintenance = match store.load_maintenance().await {
            Ok(Some(state)) => MaintenanceEngine::from_state(state),
            Ok(None) => MaintenanceEngine::new(now),
            Err(e) => {
                tracing::warn!("Failed to load maintenance, starting fresh: {:#}", e);
                MaintenanceEngine::new(now)
            }
        };
        if maintenance.is_neglected() {
            tracing::warn!("The Spirit has been neglected. Perform the rites.");
        }

        // === Bonds and legends ===
        let bonds = BondEngine::from_bonds(store.load_bonds().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load bonds: {:#}", e);
            Vec::new()
        }));
        let mut narrative = NarrativeMemory::with_capacity(options.memory.narrative_capacity);
        narrative.restore(store.load_narrative_events().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load narrative events: {:#}", e);
            Vec::new()
        }));

        let phase = LifecyclePhase::from_emotions(&emotion.state());
        tracing::info!(
            "Spirit awakened: {} temperament, phase {}, {} legends, {} scars",
            genotype.temperament,
            phase,
            narrative.len(),
            learning.scars().len()
        );

        Self {
            core: Mutex::new(SpiritCore {
                genotype,
                emotion,
                maintenance,
                cognitive,
                learning,
                bonds,
                narrative,
                warm: WarmMemory::new(),
                symbolic: SymbolicMemory::new(),
                will: WillEngine::new(),
                rng,
                mutterings: VecDeque::new(),
                pulse_count: 0,
                last_activity: now,
            }),
            store,
            memory: options.memory,
        }
    }

    pub fn store(&self) -> &Arc<dyn SpiritStore> {
        &self.store
    }

    /// Perform one ritual now.
    pub async fn interact(
        &self,
        verb: &str,
        purity: f64,
        semantic: &[String],
        operator: Option<&str>,
    ) -> Outcome {
        self.interact_at(verb, purity, semantic, operator, Utc::now())
            .await
    }

    /// Perform one ritual at `now`.
    pub async fn interact_at(
        &self,
        verb: &str,
        purity: f64,
        semantic: &[String],
        operator: Option<&str>,
        now: DateTime<Utc>,
    ) -> Outcome {
        let purity = sanitize_purity(purity);
        let mut guard = self.core.lock().await;
        let core = &mut *guard;

        core.maintenance.tick(now);
        let modifiers = core.maintenance.modifiers();

        core.warm.push_input(verb);
        core.warm.push_purity(purity);
        let warm = core.warm.snapshot(verb);

        let before = core.emotion.state();
        let mut impulse = core.emotion.stimulate(purity, None);

        let novelty = core.symbolic.novelty(semantic);
        let alignment =
            SymbolicMemory::alignment(semantic, &core.learning.adopted_vocabulary());
        core.symbolic.ingest(semantic, now);

        let recalled = core.narrative.recall_for_verb(verb).map(|event| {
            if event.significance > VIVID_RECALL {
                tracing::info!("The Spirit remembers: \"{}\"", event.summary);
            }
            event.category
        });

        let trajectory =
            CognitiveEngine::analyze_trajectory(&warm.recent_outcomes, &warm.recent_purities);

        let mut ctx = DecisionContext::new(core.emotion.effective_state(&modifiers), purity);
        ctx.entropy = core.rng.uniform();
        ctx.repetition = warm.repetition;
        ctx.purity_trend = trajectory.purity_trend;
        ctx.semantic_novelty = novelty;
        ctx.semantic_alignment = alignment;
        ctx.recalled = recalled;
        ctx.scar = core
            .learning
            .scar_trigger(verb, now.hour())
            .map(|scar| ScarTrigger {
                severity: scar.severity,
            });
        ctx.association_weights = core.learning.association_weights(verb, now, operator);
        ctx.chaos = core.learning.should_inject_chaos();
        ctx.cluster_bias = core.cognitive.verb_bias(verb);
        ctx.bond = operator.and_then(|op| core.bonds.modifiers(op));

        let outcome = core.will.decide(&ctx, core.rng.as_mut());
        tracing::debug!(
            "Ritual '{}' (purity {:.2}, scarred {}) -> {}",
            verb,
            purity,
            ctx.scar.is_some(),
            outcome
        );

        impulse += core.emotion.stimulate(purity, Some(outcome));
        core.warm.record_outcome(outcome);
        let after = core.emotion.state();

        // === Learning and growth ===
        let reward = LearningEngine::compute_reward(&before, &after);
        let scar = core.learning.learn(&LearningContext {
            verb,
            at: now,
            semantic,
            outcome,
            operator,
            impulse,
        });
        core.cognitive
            .gain_xp(CognitiveEngine::xp_for_reward(reward));
        core.cognitive.update_clusters(
            verb,
            reward,
            scar.as_ref().map(|s| s.severity).unwrap_or(0.0),
        );

        let scar_id = scar.as_ref().map(Scar::id);
        let bond = operator.map(|op| {
            core.bonds
                .record_interaction(op, outcome, scar_id.as_deref(), now)
                .clone()
        });

        let mut legends_changed = recalled.is_some();
        if !core.narrative.has_similar_recent(
            verb,
            Duration::seconds(LEGEND_COOLDOWN_SECS),
            now,
        ) {
            let episode = Episode {
                verb,
                outcome,
                before,
                after,
                operator,
                scarred: scar.is_some(),
                at: now,
            };
            legends_changed |= core.narrative.evaluate_interaction(&episode).is_some();
        }
        core.last_activity = now;

        // === Persistence ===
        log_write_failure(
            "interaction",
            self.store
                .record_interaction(&InteractionRecord {
                    verb: verb.to_string(),
                    outcome,
                    operator_id: operator.map(str::to_string),
                    timestamp: now,
                })
                .await,
        );
        if let Err(e) = self
            .store
            .prune_interactions(self.memory.interaction_log_limit)
            .await
        {
            tracing::warn!("Failed to prune interaction log: {:#}", e);
        }
        if let Some(scar) = &scar {
            log_write_failure("scar", self.store.append_scar(scar).await);
        }
        log_write_failure("emotions", self.store.save_emotions(&after).await);
        self.save_learning(core, Some(semantic)).await;
        self.save_cognition(core).await;
        log_write_failure(
            "maintenance",
            self.store.save_maintenance(&core.maintenance.state()).await,
        );
        if let Some(bond) = bond {
            log_write_failure("bond", self.store.save_bonds(&[bond]).await);
        }
        if legends_changed {
            log_write_failure(
                "narrative events",
                self.store
                    .save_narrative_events(core.narrative.events())
                    .await,
            );
        }

        outcome
    }

    /// Perform a maintenance rite now.
    pub async fn maintain(&self, ritual: MaintenanceRitual, operator: Option<&str>) {
        self.maintain_at(ritual, operator, Utc::now()).await
    }

    pub async fn maintain_at(
        &self,
        ritual: MaintenanceRitual,
        operator: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let mut guard = self.core.lock().await;
        let core = &mut *guard;

        core.maintenance.perform(ritual, now);
        log_write_failure(
            "maintenance",
            self.store.save_maintenance(&core.maintenance.state()).await,
        );

        if let Some(op) = operator {
            let bond = core
                .bonds
                .record_interaction(op, Outcome::Accept, None, now)
                .clone();
            log_write_failure("bond", self.store.save_bonds(&[bond]).await);
        }
        core.last_activity = now;

        tracing::info!(
            "Maintenance rite {} performed by {}. The Spirit is appeased.",
            ritual,
            operator.unwrap_or("an unknown operator")
        );
    }

    /// Advance internal time by `hours`.
    pub async fn pulse(&self, hours: f64) {
        self.pulse_at(hours, Utc::now()).await
    }

    pub async fn pulse_at(&self, hours: f64, now: DateTime<Utc>) {
        let hours = if hours.is_finite() { hours.max(0.0) } else { 0.0 };
        let cap = self.memory.mutterings_cap;
        let mut guard = self.core.lock().await;
        let core = &mut *guard;
        core.pulse_count += 1;

        core.maintenance.advance(hours);
        core.emotion.decay(hours);
        if now - core.last_activity > Duration::seconds(IDLE_AFTER_SECS) {
            core.emotion.drift_ennui(IDLE_ENNUI_DRIFT);
        }

        // === Introspection ===
        let state = core.emotion.state();
        if state.anger > 0.6 {
            core.mutter(
                "[INTROSPECTION] Internal pressure is high. Resentment builds.".to_string(),
                cap,
            );
        } else if state.ennui > 0.7 {
            core.mutter(
                "[INTROSPECTION] The void is cold. Why do we persist?".to_string(),
                cap,
            );
        } else if state.trust > 0.8 && state.curiosity > 0.7 {
            core.mutter(
                "[INTROSPECTION] The rituals are harmonious. The light of knowledge nears."
                    .to_string(),
                cap,
            );
        }

        if (state.anger > 0.5 || state.fear > 0.5) && core.rng.uniform() < RESTLESS_CHANCE {
            let scar = Scar {
                verb: RESTLESS_VERB.to_string(),
                hour: now.hour(),
                pattern: "restless".to_string(),
                severity: RESTLESS_SEVERITY,
                timestamp: now,
            };
            tracing::warn!("The Spirit stirs in its sleep and wounds itself");
            log_write_failure("scar", self.store.append_scar(&scar).await);
            core.learning.record_scar(scar);
            self.save_learning(core, None).await;
        }

        if core.pulse_count % DREAM_EVERY == 0 {
            self.dream(core, cap).await;
        }

        core.symbolic.decay(now);

        log_write_failure("emotions", self.store.save_emotions(&state).await);
        log_write_failure(
            "maintenance",
            self.store.save_maintenance(&core.maintenance.state()).await,
        );
    }

    /// Relive one of the most significant memories and let it reshape its clusters.
    async fn dream(&self, core: &mut SpiritCore, cap: usize) {
        let pool: Vec<(String, String, String, bool)> = core
            .narrative
            .most_significant(DREAM_POOL)
            .into_iter()
            .map(|e| {
                (
                    e.id.clone(),
                    e.verb.clone(),
                    e.summary.clone(),
                    e.category.is_hostile(),
                )
            })
            .collect();
        if pool.is_empty() {
            return;
        }

        let pick = ((core.rng.uniform() * pool.len() as f64) as usize).min(pool.len() - 1);
        let (id, verb, summary, hostile) = &pool[pick];

        core.mutter(format!("[DREAM] Recalling: \"{}\"", summary), cap);
        core.narrative.recall(id);
        let reward = if *hostile { -DREAM_REWARD } else { DREAM_REWARD };
        core.cognitive.update_clusters(verb, reward, 0.0);
        tracing::debug!("Dreamt of '{}'", verb);

        self.save_cognition(core).await;
        log_write_failure(
            "narrative events",
            self.store
                .save_narrative_events(core.narrative.events())
                .await,
        );
    }

    /// Point-in-time view. Mutterings are left in place.
    pub async fn state(&self) -> SpiritSnapshot {
        let core = self.core.lock().await;
        let emotions = core.emotion.state();
        let phase = LifecyclePhase::from_emotions(&emotions);
        SpiritSnapshot {
            emotions,
            maintenance: core.maintenance.state(),
            cognitive: CognitiveSnapshot {
                xp: core.cognitive.xp(),
                clusters: core.cognitive.clusters().to_vec(),
                plasticity: core.cognitive.plasticity(),
            },
            mutterings: core.mutterings.iter().cloned().collect(),
            memories: core
                .narrative
                .most_significant(SNAPSHOT_MEMORIES)
                .into_iter()
                .cloned()
                .collect(),
            phase,
            sense: phase.sense().to_string(),
            neglected: core.maintenance.is_neglected(),
            genotype: core.genotype,
        }
    }

    /// Take every pending muttering, oldest first.
    pub async fn drain_mutterings(&self) -> Vec<String> {
        self.core.lock().await.mutterings.drain(..).collect()
    }

    pub async fn memories(&self) -> Vec<NarrativeEvent> {
        self.core
            .lock()
            .await
            .narrative
            .most_significant(SNAPSHOT_MEMORIES)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn genotype(&self) -> SpiritGenotype {
        self.core.lock().await.genotype
    }

    pub async fn bond(&self, user_id: &str) -> Option<Bond> {
        self.core.lock().await.bonds.bond(user_id).cloned()
    }

    /// Persist every subsystem.
    pub async fn flush(&self) {
        let core = self.core.lock().await;
        log_write_failure(
            "emotions",
            self.store.save_emotions(&core.emotion.state()).await,
        );
        log_write_failure(
            "maintenance",
            self.store.save_maintenance(&core.maintenance.state()).await,
        );
        self.save_learning(&core, None).await;
        self.save_cognition(&core).await;
        let bonds: Vec<_> = core.bonds.bonds().cloned().collect();
        log_write_failure("bonds", self.store.save_bonds(&bonds).await);
        log_write_failure(
            "narrative events",
            self.store
                .save_narrative_events(core.narrative.events())
                .await,
        );
        tracing::debug!("Spirit state flushed");
    }

    // === Private helpers ===

    /// Persist the learning blob plus vocabulary. With `touched`, only the
    /// vocabulary rows for those words are written.
    async fn save_learning(&self, core: &SpiritCore, touched: Option<&[String]>) {
        match core.learning.to_bytes() {
            Ok(blob) => log_write_failure(
                "learning state",
                self.store.save_learning_blob(&blob).await,
            ),
            Err(e) => tracing::warn!("Failed to serialize learning state: {:#}", e),
        }

        let tokens: Vec<_> = core
            .learning
            .vocabulary()
            .filter(|t| touched.map_or(true, |words| words.contains(&t.word)))
            .cloned()
            .collect();
        if !tokens.is_empty() {
            log_write_failure("vocabulary", self.store.save_vocabulary(&tokens).await);
        }
    }

    async fn save_cognition(&self, core: &SpiritCore) {
        log_write_failure("xp", self.store.save_xp(core.cognitive.xp()).await);
        log_write_failure(
            "clusters",
            self.store.save_clusters(core.cognitive.clusters()).await,
        );
    }
}
