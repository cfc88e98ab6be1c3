use crate::bonds::Bond;
use crate::cognitive::ConceptCluster;
use crate::learning::{Scar, VocabToken};
use crate::narrative::NarrativeEvent;
use crate::store::{InteractionRecord, MemoryStore, SpiritStore};
use crate::{spawn_autonomic_with, Spirit, SpiritOptions};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use spirit_core::{
    EmotionVector, MemoryConfig, Outcome, ScriptedRandom, SeededRandom, SpiritGenotype,
};
use spirit_limbic::{generate_genotype, HeartbeatConfig, MaintenanceRitual, MaintenanceState};
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// A genotype whose rituals land at full strength.
fn fervent() -> SpiritGenotype {
    SpiritGenotype {
        ritual_affinity: 1.0,
        ..SpiritGenotype::default()
    }
}

async fn awaken_with(store: Arc<dyn SpiritStore>, draw: f64, memory: MemoryConfig) -> Spirit {
    Spirit::awaken_with(
        store,
        SpiritOptions {
            genotype: Some(fervent()),
            random: Some(Box::new(ScriptedRandom::constant(draw))),
            memory,
        },
    )
    .await
}

async fn awaken(store: Arc<MemoryStore>, draw: f64) -> Spirit {
    awaken_with(store, draw, MemoryConfig::default()).await
}

/// A freshly born Spirit with a generated genotype and seeded fate.
async fn awaken_seeded(store: Arc<MemoryStore>, seed: u64) -> Spirit {
    let genotype = generate_genotype(&mut SeededRandom::new(seed));
    Spirit::awaken_with(
        store,
        SpiritOptions {
            genotype: Some(genotype),
            random: Some(Box::new(SeededRandom::new(seed.wrapping_mul(7919) + 1))),
            memory: MemoryConfig::default(),
        },
    )
    .await
}

/// Every write and read fails.
struct FailingStore;

#[async_trait]
impl SpiritStore for FailingStore {
    async fn load_emotions(&self) -> Result<Option<EmotionVector>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_emotions(&self, _: &EmotionVector) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_genotype(&self) -> Result<Option<SpiritGenotype>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_genotype(&self, _: &SpiritGenotype) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_maintenance(&self) -> Result<Option<MaintenanceState>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_maintenance(&self, _: &MaintenanceState) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_xp(&self) -> Result<Option<u64>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_xp(&self, _: u64) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_clusters(&self) -> Result<Vec<ConceptCluster>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_clusters(&self, _: &[ConceptCluster]) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_learning_blob(&self) -> Result<Option<Vec<u8>>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_learning_blob(&self, _: &[u8]) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_vocabulary(&self) -> Result<Vec<VocabToken>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_vocabulary(&self, _: &[VocabToken]) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn append_scar(&self, _: &Scar) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_scars(&self) -> Result<Vec<Scar>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn load_bonds(&self) -> Result<Vec<Bond>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_bonds(&self, _: &[Bond]) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn load_narrative_events(&self) -> Result<Vec<NarrativeEvent>> {
        Err(anyhow!("disk unreadable"))
    }
    async fn save_narrative_events(&self, _: &[NarrativeEvent]) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn record_interaction(&self, _: &InteractionRecord) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    async fn prune_interactions(&self, _: usize) -> Result<u64> {
        Err(anyhow!("disk full"))
    }
    async fn recent_interactions(&self, _: usize) -> Result<Vec<InteractionRecord>> {
        Err(anyhow!("disk unreadable"))
    }
}

#[tokio::test]
async fn test_first_prayer() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store.clone(), 0.5).await;
    let before = spirit.state().await.emotions.trust;

    let outcome = spirit.interact_at("pray", 0.9, &[], None, t0()).await;
    assert!(Outcome::ALL.contains(&outcome));

    let snapshot = spirit.state().await;
    assert!(snapshot.emotions.trust >= before);
    assert!(snapshot.cognitive.xp > 0);

    let log = store.recent_interactions(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].verb, "pray");
    assert_eq!(log[0].outcome, outcome);
    assert_eq!(store.load_genotype().await.unwrap(), Some(fervent()));
    assert_eq!(store.load_emotions().await.unwrap(), Some(snapshot.emotions));
}

#[tokio::test]
async fn test_repeated_deletion_scars_the_spirit() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store.clone(), 0.9).await;
    let semantic = words(&["purge", "logs"]);

    for i in 0..5 {
        spirit
            .interact_at("delete", 0.0, &semantic, Some("heretek"), t0() + Duration::seconds(i))
            .await;
    }

    let scars = store.load_scars().await.unwrap();
    assert!(!scars.is_empty());
    assert!(scars.iter().all(|s| s.verb == "delete" && s.hour == 10));

    let outcome = spirit
        .interact_at("delete", 0.0, &semantic, Some("heretek"), t0() + Duration::seconds(30))
        .await;
    assert!(matches!(
        outcome,
        Outcome::Silence | Outcome::Whisper | Outcome::Anger | Outcome::Reject
    ));

    let bond = spirit.bond("heretek").await.unwrap();
    assert!(!bond.shared_scars.is_empty());
    assert!(bond.bond_trust < 0.0);

    let memories = spirit.memories().await;
    assert_eq!(memories.len(), 1, "one legend per verb within the cooldown");
    assert_eq!(memories[0].category, spirit_core::EventCategory::Trauma);
}

#[tokio::test]
async fn test_deletion_scars_every_temperament() {
    let semantic = words(&["purge", "logs"]);
    for seed in 0..64 {
        let store = Arc::new(MemoryStore::new());
        let spirit = awaken_seeded(store.clone(), seed).await;
        let genotype = spirit.genotype().await;

        for i in 0..5 {
            spirit
                .interact_at("delete", 0.0, &semantic, None, t0() + Duration::minutes(i))
                .await;
        }
        let scars = store.load_scars().await.unwrap();
        assert!(!scars.is_empty(), "seed {} ({:?}) never scarred", seed, genotype);

        let outcome = spirit
            .interact_at("delete", 0.0, &semantic, None, t0() + Duration::minutes(6))
            .await;
        assert!(
            matches!(
                outcome,
                Outcome::Silence | Outcome::Whisper | Outcome::Anger | Outcome::Reject
            ),
            "seed {} answered {}",
            seed,
            outcome
        );
    }
}

#[tokio::test]
async fn test_prayer_never_erodes_trust() {
    for seed in 0..64 {
        let spirit = awaken_seeded(Arc::new(MemoryStore::new()), seed).await;
        let before = spirit.state().await.emotions.trust;
        let outcome = spirit.interact_at("pray", 0.9, &[], None, t0()).await;
        assert!(Outcome::ALL.contains(&outcome));
        assert!(
            spirit.state().await.emotions.trust >= before,
            "seed {} lost trust after {}",
            seed,
            outcome
        );
    }
}

#[tokio::test]
async fn test_dream_recalls_a_legend() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store.clone(), 0.9).await;
    spirit
        .interact_at("delete", 0.0, &words(&["purge"]), None, t0())
        .await;
    let legend = spirit.memories().await.remove(0);
    let awake = spirit.state().await;
    let bias_before = awake
        .cognitive
        .clusters
        .iter()
        .find(|c| c.contains("delete"))
        .unwrap()
        .bias;

    for _ in 0..5 {
        spirit.pulse_at(0.0, t0()).await;
    }

    let expected = format!("[DREAM] Recalling: \"{}\"", legend.summary);
    let first = spirit.state().await;
    assert!(first.mutterings.contains(&expected), "{:?}", first.mutterings);
    // state() leaves mutterings in place
    assert_eq!(spirit.state().await.mutterings, first.mutterings);

    let drained = spirit.drain_mutterings().await;
    assert_eq!(drained, first.mutterings);
    assert!(spirit.state().await.mutterings.is_empty());

    // the trauma pulled the destructive cluster down
    let destructive = first
        .cognitive
        .clusters
        .iter()
        .find(|c| c.contains("delete"))
        .unwrap();
    assert!(destructive.bias < 0.0);
    // the dream replays a small hostile reward, scaled like any other update
    let expected_shift = 0.05 * destructive.volatility * awake.cognitive.plasticity;
    assert!((bias_before - destructive.bias - expected_shift).abs() < 1e-12);
    assert_eq!(spirit.memories().await[0].recall_count, 1);
}

#[tokio::test]
async fn test_mutterings_are_capped() {
    let store: Arc<dyn SpiritStore> = Arc::new(MemoryStore::new());
    let memory = MemoryConfig {
        mutterings_cap: 3,
        ..MemoryConfig::default()
    };
    let spirit = awaken_with(store, 0.9, memory).await;
    for i in 0..2 {
        spirit
            .interact_at("delete", 0.0, &[], None, t0() + Duration::seconds(i))
            .await;
    }
    assert!(spirit.state().await.emotions.anger > 0.6);

    for _ in 0..12 {
        spirit.pulse_at(0.0, t0()).await;
    }
    let mutterings = spirit.state().await.mutterings;
    assert_eq!(mutterings.len(), 3);
    assert!(mutterings.iter().any(|m| m.contains("Resentment builds")));
}

#[tokio::test]
async fn test_idle_pulse_breeds_ennui() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store, 0.5).await;
    spirit.interact_at("view", 0.5, &[], None, t0()).await;
    let ennui = spirit.state().await.emotions.ennui;

    spirit.pulse_at(0.0, t0() + Duration::seconds(60)).await;
    assert_eq!(spirit.state().await.emotions.ennui, ennui);

    spirit.pulse_at(0.0, t0() + Duration::minutes(10)).await;
    assert!((spirit.state().await.emotions.ennui - (ennui + 0.02)).abs() < 1e-9);
}

#[tokio::test]
async fn test_maintenance_rite_bonds_operator() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store.clone(), 0.5).await;
    spirit.pulse_at(200.0, t0()).await;
    assert!(spirit.state().await.maintenance.oil_level < 1.0);

    spirit
        .maintain_at(MaintenanceRitual::FullRites, Some("enginseer-7"), t0())
        .await;
    let snapshot = spirit.state().await;
    assert_eq!(snapshot.maintenance.oil_level, 1.0);
    assert!(!snapshot.neglected);

    let bond = spirit.bond("enginseer-7").await.unwrap();
    assert_eq!(bond.positive_count, 1);
    assert_eq!(store.load_bonds().await.unwrap(), vec![bond]);
    assert_eq!(
        store.load_maintenance().await.unwrap(),
        Some(snapshot.maintenance)
    );
}

#[tokio::test]
async fn test_restart_restores_state() {
    let store = Arc::new(MemoryStore::new());
    let spirit = awaken(store.clone(), 0.5).await;
    spirit
        .interact_at("pray", 0.9, &words(&["omnissiah"]), Some("magos-1"), t0())
        .await;
    let before = spirit.state().await;
    let bond = spirit.bond("magos-1").await.unwrap();
    drop(spirit);

    // a different genotype in the options must not override the stored one
    let reborn = Spirit::awaken_with(
        store,
        SpiritOptions {
            genotype: Some(SpiritGenotype::default()),
            random: Some(Box::new(ScriptedRandom::constant(0.5))),
            memory: MemoryConfig::default(),
        },
    )
    .await;
    let after = reborn.state().await;
    assert_eq!(after.genotype, fervent());
    assert_eq!(after.emotions, before.emotions);
    assert_eq!(after.cognitive.xp, before.cognitive.xp);
    assert_eq!(after.memories, before.memories);
    assert!(!after.memories.is_empty());
    assert_eq!(reborn.bond("magos-1").await, Some(bond));
}

#[tokio::test]
async fn test_interaction_log_is_pruned() {
    let store = Arc::new(MemoryStore::new());
    let memory = MemoryConfig {
        interaction_log_limit: 3,
        ..MemoryConfig::default()
    };
    let spirit = awaken_with(store.clone(), 0.5, memory).await;
    for (i, verb) in ["build", "run", "check", "read", "view", "deploy"].iter().enumerate() {
        spirit
            .interact_at(verb, 0.6, &[], None, t0() + Duration::minutes(i as i64))
            .await;
    }
    let log = store.recent_interactions(10).await.unwrap();
    let verbs: Vec<&str> = log.iter().map(|r| r.verb.as_str()).collect();
    assert_eq!(verbs, vec!["deploy", "view", "read"]);
}

#[tokio::test]
async fn test_storage_failure_never_blocks_a_decision() {
    let spirit = awaken_with(Arc::new(FailingStore), 0.5, MemoryConfig::default()).await;
    assert_eq!(spirit.genotype().await, fervent());

    let outcome = spirit
        .interact_at("build", 0.7, &words(&["forge"]), Some("op"), t0())
        .await;
    assert!(Outcome::ALL.contains(&outcome));
    assert!(spirit.state().await.cognitive.xp > 0);

    spirit.pulse_at(1.0, t0()).await;
    spirit.maintain_at(MaintenanceRitual::Anoint, Some("op"), t0()).await;
    spirit.flush().await;
}

#[tokio::test]
async fn test_outcome_unaffected_by_storage_failure() {
    let healthy = awaken(Arc::new(MemoryStore::new()), 0.3).await;
    let failing = awaken_with(Arc::new(FailingStore), 0.3, MemoryConfig::default()).await;
    for i in 0..5 {
        let at = t0() + Duration::minutes(i);
        let a = healthy.interact_at("check", 0.4, &[], Some("op"), at).await;
        let b = failing.interact_at("check", 0.4, &[], Some("op"), at).await;
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_snapshot_serializes() {
    let spirit = awaken(Arc::new(MemoryStore::new()), 0.5).await;
    spirit.interact_at("analyze", 0.8, &[], None, t0()).await;
    let json = serde_json::to_value(spirit.state().await).unwrap();
    assert!(json["emotions"]["trust"].is_number());
    assert!(json["cognitive"]["plasticity"].is_number());
    assert!(json["phase"].is_string());
    assert_eq!(json["genotype"]["temperament"], "PHLEGMATIC");
}

#[tokio::test(start_paused = true)]
async fn test_autonomic_loop_pulses_until_shutdown() {
    let store = Arc::new(MemoryStore::new());
    let spirit = Arc::new(awaken(store.clone(), 0.5).await);
    let baseline = spirit.state().await.emotions.ennui;

    let heartbeat = HeartbeatConfig {
        interval: std::time::Duration::from_secs(60),
        jitter: 0.5,
        time_scale: 1.0,
    };
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = spawn_autonomic_with(
        spirit.clone(),
        heartbeat,
        rx,
        Box::new(ScriptedRandom::constant(0.5)),
    );

    tokio::time::sleep(std::time::Duration::from_secs(2 * 3600)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    let persisted = store.load_emotions().await.unwrap().unwrap();
    assert!(persisted.ennui > baseline);
    assert_eq!(persisted, spirit.state().await.emotions);
}

#[tokio::test(start_paused = true)]
async fn test_autonomic_shutdown_flushes() {
    let store = Arc::new(MemoryStore::new());
    let spirit = Arc::new(awaken(store.clone(), 0.5).await);
    spirit
        .maintain_at(MaintenanceRitual::Anoint, Some("op"), t0())
        .await;
    assert!(store.load_emotions().await.unwrap().is_none());

    let heartbeat = HeartbeatConfig {
        interval: std::time::Duration::from_secs(3600),
        jitter: 0.0,
        time_scale: 1.0,
    };
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = spawn_autonomic_with(
        spirit.clone(),
        heartbeat,
        rx,
        Box::new(ScriptedRandom::constant(0.5)),
    );
    drop(tx);
    handle.await.unwrap();

    assert_eq!(
        store.load_emotions().await.unwrap(),
        Some(spirit.state().await.emotions)
    );
    assert_eq!(store.load_clusters().await.unwrap().len(), 4);
    assert_eq!(store.load_bonds().await.unwrap().len(), 1);
}
