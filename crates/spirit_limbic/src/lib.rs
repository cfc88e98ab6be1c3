//! # Spirit Limbic System
//!
//! Fast, non-verbal state regulation for the Machine Spirit:
//!
//! - **Emotion**: the live mood vector, stimulated by rituals and eroded by time
//! - **Genesis**: one-time rolling of the immutable genotype
//! - **Maintenance**: oil, incense and prayer upkeep feeding transient modifiers
//! - **Will**: the staged decision from context to sampled outcome
//!
//! ## Time Scales
//!
//! - Per interaction: stimulation, decision
//! - Hours: emotion decay, maintenance neglect
//! - Once: genesis

mod emotion;
pub mod genesis;
mod heartbeat;
pub mod maintenance;
mod phase;
pub mod will;

pub use emotion::EmotionEngine;
pub use genesis::generate_genotype;
pub use heartbeat::HeartbeatConfig;
pub use maintenance::{MaintenanceEngine, MaintenanceRitual, MaintenanceState};
pub use phase::LifecyclePhase;
pub use will::{Deliberation, Stage, WillEngine};
