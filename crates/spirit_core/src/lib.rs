//! # Spirit Core
//!
//! Shared vocabulary for the Machine Spirit engine. Everything here is plain
//! data: the emotion vector, outcomes and their distributions, the genotype,
//! the decision context and the injectable random source.

pub mod config;
pub mod context;
pub mod emotion;
pub mod error;
pub mod genotype;
pub mod outcome;
pub mod random;

pub use config::{HeartbeatSettings, MemoryConfig, SpiritConfig, StorageConfig};
pub use context::{BondModifiers, DecisionContext, EventCategory, ScarTrigger};
pub use emotion::{EmotionDelta, EmotionModifiers, EmotionVector};
pub use error::ParseError;
pub use genotype::{SpiritGenotype, Temperament, TemperamentTraits};
pub use outcome::{Outcome, OutcomeDistribution, OutcomeWeights};
pub use random::{gaussian, RandomSource, ScriptedRandom, SeededRandom, SystemRandom};
