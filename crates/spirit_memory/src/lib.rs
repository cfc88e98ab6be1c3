//! # Spirit Memory
//!
//! Slow state and persistence for the Machine Spirit:
//!
//! - **Learning**: associations, vocabulary osmosis and scars
//! - **Cognition**: experience, plasticity and concept clusters
//! - **Bonds**: per-operator relationships and titles
//! - **Narrative**: the bounded store of legends
//! - **Warm / Symbolic**: recency windows and the token table
//! - **Storage**: the [`SpiritStore`] trait with SQLite and in-memory backends
//! - **Spirit**: the orchestrator tying everything together, plus its autonomic loop

pub mod autonomic;
pub mod bonds;
pub mod cognitive;
pub mod coordinator;
pub mod learning;
pub mod narrative;
pub mod sqlite;
pub mod store;
pub mod symbolic;
pub mod warm;

pub use autonomic::{spawn_autonomic, spawn_autonomic_with};
pub use bonds::{Bond, BondEngine, OperatorTitle};
pub use cognitive::{CognitiveEngine, ConceptCluster, InteractionTrajectory};
pub use coordinator::{CognitiveSnapshot, Spirit, SpiritOptions, SpiritSnapshot};
pub use learning::{
    Association, AssociationKey, LearningContext, LearningEngine, Scar, TimeBucket, VocabToken,
    Wound,
};
pub use narrative::{EmotionalImpact, Episode, NarrativeEvent, NarrativeMemory};
pub use sqlite::SqliteStore;
pub use store::{InteractionRecord, MemoryStore, SpiritStore};
pub use symbolic::SymbolicMemory;
pub use warm::{WarmMemory, WarmSnapshot};

#[cfg(test)]
mod tests;
