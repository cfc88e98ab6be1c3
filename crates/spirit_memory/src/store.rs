//! Storage interface for the Spirit's persisted state
//!
//! One load/save pair per aggregate. Singletons (emotions, genotype,
//! maintenance, cognitive profile, learning blob) are upserted; scars and
//! interactions are append-only; everything else is keyed.
//!
//! [`MemoryStore`] keeps everything in process and backs the unit tests;
//! [`crate::SqliteStore`] is the durable implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spirit_core::{EmotionVector, Outcome, SpiritGenotype};
use spirit_limbic::MaintenanceState;
use tokio::sync::RwLock;

use crate::bonds::Bond;
use crate::cognitive::ConceptCluster;
use crate::learning::{Scar, VocabToken};
use crate::narrative::NarrativeEvent;

/// One row of the interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub verb: String,
    pub outcome: Outcome,
    pub operator_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait SpiritStore: Send + Sync {
    async fn load_emotions(&self) -> Result<Option<EmotionVector>>;
    async fn save_emotions(&self, emotions: &EmotionVector) -> Result<()>;

    async fn load_genotype(&self) -> Result<Option<SpiritGenotype>>;
    async fn save_genotype(&self, genotype: &SpiritGenotype) -> Result<()>;

    async fn load_maintenance(&self) -> Result<Option<MaintenanceState>>;
    async fn save_maintenance(&self, state: &MaintenanceState) -> Result<()>;

    async fn load_xp(&self) -> Result<Option<u64>>;
    async fn save_xp(&self, xp: u64) -> Result<()>;

    async fn load_clusters(&self) -> Result<Vec<ConceptCluster>>;
    async fn save_clusters(&self, clusters: &[ConceptCluster]) -> Result<()>;

    /// Opaque serialised learning engine.
    async fn load_learning_blob(&self) -> Result<Option<Vec<u8>>>;
    async fn save_learning_blob(&self, blob: &[u8]) -> Result<()>;

    async fn load_vocabulary(&self) -> Result<Vec<VocabToken>>;
    async fn save_vocabulary(&self, tokens: &[VocabToken]) -> Result<()>;

    async fn append_scar(&self, scar: &Scar) -> Result<()>;
    async fn load_scars(&self) -> Result<Vec<Scar>>;

    async fn load_bonds(&self) -> Result<Vec<Bond>>;
    async fn save_bonds(&self, bonds: &[Bond]) -> Result<()>;

    async fn load_narrative_events(&self) -> Result<Vec<NarrativeEvent>>;
    /// Replace the stored legends with exactly `events`.
    async fn save_narrative_events(&self, events: &[NarrativeEvent]) -> Result<()>;

    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()>;
    /// Drop the oldest interactions beyond `keep`. Returns rows removed.
    async fn prune_interactions(&self, keep: usize) -> Result<u64>;
    /// Newest first.
    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Debug, Default)]
struct Tables {
    emotions: Option<EmotionVector>,
    genotype: Option<SpiritGenotype>,
    maintenance: Option<MaintenanceState>,
    xp: Option<u64>,
    clusters: Vec<ConceptCluster>,
    learning_blob: Option<Vec<u8>>,
    vocabulary: Vec<VocabToken>,
    scars: Vec<Scar>,
    bonds: Vec<Bond>,
    narrative: Vec<NarrativeEvent>,
    interactions: Vec<InteractionRecord>,
}

/// Volatile store with the same semantics as the SQLite one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpiritStore for MemoryStore {
    async fn load_emotions(&self) -> Result<Option<EmotionVector>> {
        Ok(self.tables.read().await.emotions)
    }

    async fn save_emotions(&self, emotions: &EmotionVector) -> Result<()> {
        self.tables.write().await.emotions = Some(*emotions);
        Ok(())
    }

    async fn load_genotype(&self) -> Result<Option<SpiritGenotype>> {
        Ok(self.tables.read().await.genotype)
    }

    async fn save_genotype(&self, genotype: &SpiritGenotype) -> Result<()> {
        self.tables.write().await.genotype.get_or_insert(*genotype);
        Ok(())
    }

    async fn load_maintenance(&self) -> Result<Option<MaintenanceState>> {
        Ok(self.tables.read().await.maintenance)
    }

    async fn save_maintenance(&self, state: &MaintenanceState) -> Result<()> {
        self.tables.write().await.maintenance = Some(*state);
        Ok(())
    }

    async fn load_xp(&self) -> Result<Option<u64>> {
        Ok(self.tables.read().await.xp)
    }

    async fn save_xp(&self, xp: u64) -> Result<()> {
        self.tables.write().await.xp = Some(xp);
        Ok(())
    }

    async fn load_clusters(&self) -> Result<Vec<ConceptCluster>> {
        Ok(self.tables.read().await.clusters.clone())
    }

    async fn save_clusters(&self, clusters: &[ConceptCluster]) -> Result<()> {
        self.tables.write().await.clusters = clusters.to_vec();
        Ok(())
    }

    async fn load_learning_blob(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.tables.read().await.learning_blob.clone())
    }

    async fn save_learning_blob(&self, blob: &[u8]) -> Result<()> {
        self.tables.write().await.learning_blob = Some(blob.to_vec());
        Ok(())
    }

    async fn load_vocabulary(&self) -> Result<Vec<VocabToken>> {
        Ok(self.tables.read().await.vocabulary.clone())
    }

    async fn save_vocabulary(&self, tokens: &[VocabToken]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for token in tokens {
            match tables.vocabulary.iter_mut().find(|t| t.word == token.word) {
                Some(existing) => {
                    let adopted = existing.adopted;
                    *existing = token.clone();
                    existing.adopted |= adopted;
                }
                None => tables.vocabulary.push(token.clone()),
            }
        }
        Ok(())
    }

    async fn append_scar(&self, scar: &Scar) -> Result<()> {
        self.tables.write().await.scars.push(scar.clone());
        Ok(())
    }

    async fn load_scars(&self) -> Result<Vec<Scar>> {
        Ok(self.tables.read().await.scars.clone())
    }

    async fn load_bonds(&self) -> Result<Vec<Bond>> {
        Ok(self.tables.read().await.bonds.clone())
    }

    async fn save_bonds(&self, bonds: &[Bond]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for bond in bonds {
            match tables.bonds.iter_mut().find(|b| b.user_id == bond.user_id) {
                Some(existing) => *existing = bond.clone(),
                None => tables.bonds.push(bond.clone()),
            }
        }
        Ok(())
    }

    async fn load_narrative_events(&self) -> Result<Vec<NarrativeEvent>> {
        Ok(self.tables.read().await.narrative.clone())
    }

    async fn save_narrative_events(&self, events: &[NarrativeEvent]) -> Result<()> {
        self.tables.write().await.narrative = events.to_vec();
        Ok(())
    }

    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()> {
        self.tables.write().await.interactions.push(record.clone());
        Ok(())
    }

    async fn prune_interactions(&self, keep: usize) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let excess = tables.interactions.len().saturating_sub(keep);
        tables.interactions.drain(..excess);
        Ok(excess as u64)
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.interactions.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(verb: &str) -> InteractionRecord {
        InteractionRecord {
            verb: verb.to_string(),
            outcome: Outcome::Accept,
            operator_id: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_prunes_oldest() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.record_interaction(&record(&format!("v{}", i))).await.unwrap();
        }
        assert_eq!(store.prune_interactions(4).await.unwrap(), 6);
        let recent = store.recent_interactions(10).await.unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].verb, "v9");
        assert_eq!(recent[3].verb, "v6");
    }

    #[tokio::test]
    async fn test_memory_store_singletons_upsert() {
        let store = MemoryStore::new();
        assert!(store.load_emotions().await.unwrap().is_none());
        let mut e = EmotionVector::default();
        store.save_emotions(&e).await.unwrap();
        e.anger = 0.9;
        store.save_emotions(&e).await.unwrap();
        assert_eq!(store.load_emotions().await.unwrap().unwrap().anger, 0.9);

        let genotype = SpiritGenotype::default();
        store.save_genotype(&genotype).await.unwrap();
        store
            .save_genotype(&SpiritGenotype::from_temperament(spirit_core::Temperament::Sanguine))
            .await
            .unwrap();
        assert_eq!(store.load_genotype().await.unwrap(), Some(genotype));
    }

    #[tokio::test]
    async fn test_memory_store_adoption_is_sticky() {
        let store = MemoryStore::new();
        let mut token = VocabToken {
            word: "omnissiah".into(),
            frequency: 12,
            positive_count: 10,
            novelty: 0.4,
            adopted: true,
        };
        store.save_vocabulary(&[token.clone()]).await.unwrap();

        token.adopted = false;
        token.frequency = 13;
        store.save_vocabulary(&[token]).await.unwrap();

        let stored = store.load_vocabulary().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].adopted);
        assert_eq!(stored[0].frequency, 13);
    }
}
