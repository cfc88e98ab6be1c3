//! Learning engine - associative memory, vocabulary osmosis, trauma
//!
//! Every interaction updates three independent stores:
//!
//! - **Associations** keyed by [`AssociationKey`] at three levels of
//!   specificity (verb, verb at a time of day, verb from one operator)
//! - **Vocabulary**: operator words the Spirit slowly adopts once they keep
//!   accompanying favourable outcomes
//! - **Scars**: append-only records of verbs whose provocation built up past
//!   the trauma threshold. Impulses accumulate per verb as a fading wound,
//!   so a Spirit already saturated with anger still scars.
//!
//! Associations feed back into decisions as multiplicative
//! [`OutcomeWeights`], walked from the most specific key to the least.

use anyhow::{Context, Result};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use spirit_core::{EmotionDelta, EmotionVector, Outcome, OutcomeDistribution, OutcomeWeights};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Accumulated anger or fear impulse on one verb that leaves a scar.
pub const TRAUMA_THRESHOLD: f64 = 0.35;
/// Per-hour retention of an open wound.
const WOUND_FADE: f64 = 0.95;
/// Mean absolute association weight above which the Spirit is "too predictable".
pub const CHAOS_THRESHOLD: f64 = 0.8;
/// Favourable sightings before a word is adopted.
pub const ADOPTION_THRESHOLD: u32 = 10;
const NOVELTY_DECAY: f64 = 0.95;
const MIN_TOKEN_LEN: usize = 3;

// ============================================================================
// Keys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeBucket::Morning,
            12..=17 => TimeBucket::Afternoon,
            18..=21 => TimeBucket::Evening,
            _ => TimeBucket::Night,
        }
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self::from_hour(time.hour())
    }
}

/// Composite association key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssociationKey {
    Verb(String),
    VerbTime(String, TimeBucket),
    VerbOperator(String, String),
}

impl AssociationKey {
    /// Keys that apply to one interaction, most specific first.
    pub fn precedence(verb: &str, bucket: TimeBucket, operator: Option<&str>) -> Vec<Self> {
        let mut keys = Vec::with_capacity(3);
        if let Some(op) = operator {
            keys.push(AssociationKey::VerbOperator(verb.to_string(), op.to_string()));
        }
        keys.push(AssociationKey::VerbTime(verb.to_string(), bucket));
        keys.push(AssociationKey::Verb(verb.to_string()));
        keys
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationKey::Verb(v) => write!(f, "{}", v),
            AssociationKey::VerbTime(v, b) => write!(f, "{}@{:?}", v, b),
            AssociationKey::VerbOperator(v, op) => write!(f, "{}#{}", v, op),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub key: AssociationKey,
    /// Learned preference, [-1, 1].
    pub weight: f64,
    /// Accumulated hostility, [0, 1].
    pub stress: f64,
    /// Accumulated boredom, >= 0.
    pub staleness: f64,
}

impl Association {
    fn new(key: AssociationKey) -> Self {
        Self {
            key,
            weight: 0.0,
            stress: 0.0,
            staleness: 0.0,
        }
    }

    fn observe(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Accept => {
                self.weight = (self.weight + 0.05).min(1.0);
                self.stress = (self.stress - 0.15).max(0.0);
                self.staleness = (self.staleness - 0.05).max(0.0);
            }
            Outcome::Reject | Outcome::Anger => {
                self.weight = (self.weight - 0.1).max(-1.0);
                self.stress = (self.stress + 0.2).min(1.0);
            }
            Outcome::Silence => self.staleness += 0.1,
            Outcome::Omen | Outcome::Whisper | Outcome::Lockout => {}
        }
    }

    /// Fold this association's influence into `weights`.
    fn shape(&self, weights: &mut OutcomeWeights) {
        let w = self.weight;
        if w > 0.0 {
            weights.scale(Outcome::Accept, 1.0 + w * 0.5);
            weights.scale(Outcome::Reject, 1.0 - w * 0.3);
        } else if w < 0.0 {
            weights.scale(Outcome::Reject, 1.0 - w * 0.5);
            weights.scale(Outcome::Anger, 1.0 - w * 0.3);
            weights.scale(Outcome::Accept, 1.0 + w * 0.5);
        }
        if self.stress > 0.5 {
            weights.scale(Outcome::Anger, 1.0 + self.stress);
        }
        if self.staleness > 0.3 {
            weights.scale(Outcome::Silence, 1.0 + self.staleness);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabToken {
    pub word: String,
    pub frequency: u32,
    pub positive_count: u32,
    pub novelty: f64,
    pub adopted: bool,
}

impl VocabToken {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            frequency: 0,
            positive_count: 0,
            novelty: 1.0,
            adopted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scar {
    pub verb: String,
    /// UTC hour of day, 0-23.
    pub hour: u32,
    /// First few semantic tokens of the wounding invocation.
    pub pattern: String,
    pub severity: f64,
    pub timestamp: DateTime<Utc>,
}

impl Scar {
    /// Identifier shared with bonds when an operator witnessed the wound.
    pub fn id(&self) -> String {
        format!("{}-{}", self.verb, self.timestamp.timestamp_millis())
    }
}

/// Unhealed provocation on one verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    pub anger: f64,
    pub fear: f64,
    pub updated: DateTime<Utc>,
}

impl Wound {
    fn fresh(at: DateTime<Utc>) -> Self {
        Self {
            anger: 0.0,
            fear: 0.0,
            updated: at,
        }
    }

    /// Fade by the time since the last impulse, then add this one.
    /// Soothing impulses heal, but a wound never goes negative.
    fn absorb(&mut self, impulse: &EmotionDelta, at: DateTime<Utc>) {
        let hours = (at - self.updated).num_milliseconds().max(0) as f64 / 3_600_000.0;
        let fade = WOUND_FADE.powf(hours);
        self.anger = (self.anger * fade + impulse.anger).max(0.0);
        self.fear = (self.fear * fade + impulse.fear).max(0.0);
        if at > self.updated {
            self.updated = at;
        }
    }

    fn pain(&self) -> f64 {
        self.anger.max(self.fear)
    }
}

/// Everything `learn` needs to know about one finished interaction.
#[derive(Debug, Clone)]
pub struct LearningContext<'a> {
    pub verb: &'a str,
    pub at: DateTime<Utc>,
    pub semantic: &'a [String],
    pub outcome: Outcome,
    pub operator: Option<&'a str>,
    /// Raw emotional impulse the interaction delivered, before clamping.
    pub impulse: EmotionDelta,
}

/// Serialised form of the learning engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LearningState {
    associations: Vec<Association>,
    vocabulary: Vec<VocabToken>,
    scars: Vec<Scar>,
    wounds: Vec<(String, Wound)>,
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LearningEngine {
    associations: HashMap<AssociationKey, Association>,
    vocabulary: BTreeMap<String, VocabToken>,
    scars: Vec<Scar>,
    wounds: BTreeMap<String, Wound>,
}

impl LearningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the separately persisted vocabulary and scar log when
    /// the association blob is unavailable.
    pub fn from_parts(vocabulary: Vec<VocabToken>, scars: Vec<Scar>) -> Self {
        Self {
            associations: HashMap::new(),
            vocabulary: vocabulary.into_iter().map(|t| (t.word.clone(), t)).collect(),
            scars,
            wounds: BTreeMap::new(),
        }
    }

    /// Absorb one interaction. Returns the scar it left, if any.
    pub fn learn(&mut self, ctx: &LearningContext<'_>) -> Option<Scar> {
        let bucket = TimeBucket::at(ctx.at);
        for key in AssociationKey::precedence(ctx.verb, bucket, ctx.operator) {
            self.associations
                .entry(key.clone())
                .or_insert_with(|| Association::new(key))
                .observe(ctx.outcome);
        }

        self.absorb_vocabulary(ctx.semantic, ctx.outcome);
        self.evaluate_trauma(ctx)
    }

    fn absorb_vocabulary(&mut self, semantic: &[String], outcome: Outcome) {
        for word in semantic.iter().filter(|w| w.chars().count() >= MIN_TOKEN_LEN) {
            let token = self
                .vocabulary
                .entry(word.clone())
                .or_insert_with(|| VocabToken::new(word));
            token.frequency += 1;
            if outcome.is_positive() {
                token.positive_count += 1;
            }
            token.novelty *= NOVELTY_DECAY;
            if !token.adopted && token.positive_count >= ADOPTION_THRESHOLD {
                token.adopted = true;
                tracing::info!("Vocabulary adopted: '{}'", token.word);
            }
        }
    }

    fn evaluate_trauma(&mut self, ctx: &LearningContext<'_>) -> Option<Scar> {
        let wound = self
            .wounds
            .entry(ctx.verb.to_string())
            .or_insert_with(|| Wound::fresh(ctx.at));
        wound.absorb(&ctx.impulse, ctx.at);
        let pain = wound.pain();
        if pain <= TRAUMA_THRESHOLD {
            tracing::trace!("Wound on '{}' at {:.2}", ctx.verb, pain);
            return None;
        }
        self.wounds.remove(ctx.verb);

        let scar = Scar {
            verb: ctx.verb.to_string(),
            hour: ctx.at.hour(),
            pattern: ctx
                .semantic
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            severity: pain.clamp(0.0, 1.0),
            timestamp: ctx.at,
        };
        tracing::warn!(
            "Scar formed: '{}' at hour {} (severity {:.2})",
            scar.verb,
            scar.hour,
            scar.severity
        );
        self.scars.push(scar.clone());
        Some(scar)
    }

    pub fn wound(&self, verb: &str) -> Option<&Wound> {
        self.wounds.get(verb)
    }

    /// Append an externally observed scar.
    pub fn record_scar(&mut self, scar: Scar) {
        self.scars.push(scar);
    }

    /// Multiplicative factors from every association matching this interaction.
    pub fn association_weights(
        &self,
        verb: &str,
        at: DateTime<Utc>,
        operator: Option<&str>,
    ) -> OutcomeWeights {
        let mut weights = OutcomeWeights::default();
        for key in AssociationKey::precedence(verb, TimeBucket::at(at), operator) {
            if let Some(assoc) = self.associations.get(&key) {
                assoc.shape(&mut weights);
            }
        }
        weights
    }

    pub fn adjust_outcome_probabilities(
        &self,
        verb: &str,
        at: DateTime<Utc>,
        operator: Option<&str>,
        base: OutcomeDistribution,
    ) -> OutcomeDistribution {
        base.weighted(&self.association_weights(verb, at, operator))
            .normalized()
    }

    pub fn should_inject_chaos(&self) -> bool {
        if self.associations.is_empty() {
            return false;
        }
        let total: f64 = self.associations.values().map(|a| a.weight.abs()).sum();
        total / self.associations.len() as f64 > CHAOS_THRESHOLD
    }

    /// The most severe scar for `verb` at `hour`.
    pub fn scar_trigger(&self, verb: &str, hour: u32) -> Option<&Scar> {
        self.scars
            .iter()
            .filter(|s| s.verb == verb && s.hour == hour)
            .max_by(|a, b| a.severity.total_cmp(&b.severity))
    }

    /// Reward signal: calmer and more trusting is good, more bored is bad.
    pub fn compute_reward(before: &EmotionVector, after: &EmotionVector) -> f64 {
        let anger_reduction = before.anger - after.anger;
        let trust_increase = after.trust - before.trust;
        let ennui_increase = after.ennui - before.ennui;
        anger_reduction * 0.5 + trust_increase * 0.8 - ennui_increase * 0.3
    }

    pub fn adopted_vocabulary(&self) -> Vec<String> {
        self.vocabulary
            .values()
            .filter(|t| t.adopted)
            .map(|t| t.word.clone())
            .collect()
    }

    pub fn association(&self, key: &AssociationKey) -> Option<&Association> {
        self.associations.get(key)
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &VocabToken> {
        self.vocabulary.values()
    }

    pub fn scars(&self) -> &[Scar] {
        &self.scars
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut associations: Vec<Association> = self.associations.values().cloned().collect();
        associations.sort_by(|a, b| a.key.cmp(&b.key));
        let state = LearningState {
            associations,
            vocabulary: self.vocabulary.values().cloned().collect(),
            scars: self.scars.clone(),
            wounds: self
                .wounds
                .iter()
                .map(|(verb, wound)| (verb.clone(), wound.clone()))
                .collect(),
        };
        bincode::serialize(&state).context("Failed to serialize learning state")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: LearningState =
            bincode::deserialize(bytes).context("Failed to deserialize learning state")?;
        Ok(Self {
            associations: state
                .associations
                .into_iter()
                .map(|a| (a.key.clone(), a))
                .collect(),
            vocabulary: state
                .vocabulary
                .into_iter()
                .map(|t| (t.word.clone(), t))
                .collect(),
            scars: state.scars,
            wounds: state.wounds.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 15, 0).unwrap()
    }

    fn calm() -> EmotionVector {
        EmotionVector::default()
    }

    fn ctx<'a>(verb: &'a str, outcome: Outcome, semantic: &'a [String]) -> LearningContext<'a> {
        LearningContext {
            verb,
            at: at(9),
            semantic,
            outcome,
            operator: Some("tech-priest"),
            impulse: EmotionDelta::default(),
        }
    }

    #[test]
    fn test_time_buckets() {
        assert_eq!(TimeBucket::from_hour(5), TimeBucket::Night);
        assert_eq!(TimeBucket::from_hour(6), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(12), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(18), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(22), TimeBucket::Night);
    }

    #[test]
    fn test_precedence_order() {
        let keys = AssociationKey::precedence("build", TimeBucket::Morning, Some("op"));
        assert!(matches!(keys[0], AssociationKey::VerbOperator(..)));
        assert!(matches!(keys[1], AssociationKey::VerbTime(..)));
        assert!(matches!(keys[2], AssociationKey::Verb(..)));
        assert_eq!(AssociationKey::precedence("build", TimeBucket::Night, None).len(), 2);
    }

    #[test]
    fn test_association_updates_all_keys() {
        let mut engine = LearningEngine::new();
        engine.learn(&ctx("build", Outcome::Accept, &[]));
        for key in AssociationKey::precedence("build", TimeBucket::Morning, Some("tech-priest")) {
            let a = engine.association(&key).unwrap();
            assert!((a.weight - 0.05).abs() < 1e-12, "{}", key);
        }

        engine.learn(&ctx("build", Outcome::Reject, &[]));
        let a = engine
            .association(&AssociationKey::Verb("build".into()))
            .unwrap();
        assert!((a.weight + 0.05).abs() < 1e-12);
        assert!((a.stress - 0.2).abs() < 1e-12);

        engine.learn(&ctx("build", Outcome::Silence, &[]));
        let a = engine
            .association(&AssociationKey::Verb("build".into()))
            .unwrap();
        assert!((a.staleness - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_vocabulary_adoption_is_monotonic() {
        let mut engine = LearningEngine::new();
        let words = vec!["omnissiah".to_string(), "ok".to_string()];
        for _ in 0..ADOPTION_THRESHOLD {
            engine.learn(&ctx("pray", Outcome::Whisper, &words));
        }
        assert_eq!(engine.adopted_vocabulary(), vec!["omnissiah".to_string()]);
        for _ in 0..5 {
            engine.learn(&ctx("pray", Outcome::Anger, &words));
        }
        assert_eq!(engine.adopted_vocabulary(), vec!["omnissiah".to_string()]);
        let token = engine.vocabulary().next().unwrap();
        assert_eq!(token.frequency, 15);
        assert!(token.novelty < 0.5);
    }

    #[test]
    fn test_trauma_creates_scar() {
        let mut engine = LearningEngine::new();
        let semantic = vec!["purge".to_string(), "all".to_string(), "the".to_string(), "logs".to_string()];
        let mut c = ctx("purge", Outcome::Anger, &semantic);
        c.impulse.anger = 0.4;
        let scar = engine.learn(&c).unwrap();
        assert_eq!(scar.hour, 9);
        assert_eq!(scar.pattern, "purge all the");
        assert!((scar.severity - 0.4).abs() < 1e-12);
        assert!(engine.scar_trigger("purge", 9).is_some());
        assert!(engine.scar_trigger("purge", 10).is_none());
        // the wound closes once it scars
        assert!(engine.wound("purge").is_none());

        c.impulse.anger = 0.2;
        assert!(engine.learn(&c).is_none());
        assert_eq!(engine.scars().len(), 1);
    }

    #[test]
    fn test_repeated_provocation_accumulates() {
        let mut engine = LearningEngine::new();
        let mut c = ctx("delete", Outcome::Reject, &[]);
        c.impulse.anger = 0.12;
        assert!(engine.learn(&c).is_none());
        c.at = at(9) + chrono::Duration::minutes(1);
        assert!(engine.learn(&c).is_none());
        c.at = at(9) + chrono::Duration::minutes(2);
        let scar = engine.learn(&c).unwrap();
        assert!(scar.severity > TRAUMA_THRESHOLD);
    }

    #[test]
    fn test_wounds_heal_and_fade() {
        let mut engine = LearningEngine::new();
        let mut c = ctx("delete", Outcome::Reject, &[]);
        c.impulse.anger = 0.3;
        engine.learn(&c);

        // a soothing ritual on the same verb heals it
        c.impulse.anger = -0.5;
        engine.learn(&c);
        assert_eq!(engine.wound("delete").unwrap().anger, 0.0);

        c.impulse.anger = 0.3;
        engine.learn(&c);
        c.at = at(9) + chrono::Duration::days(2);
        c.impulse.anger = 0.1;
        assert!(engine.learn(&c).is_none());
        assert!(engine.wound("delete").unwrap().anger < 0.2);
    }

    #[test]
    fn test_adjust_prefers_learned_accept() {
        let mut engine = LearningEngine::new();
        for _ in 0..10 {
            engine.learn(&ctx("build", Outcome::Accept, &[]));
        }
        let adjusted = engine.adjust_outcome_probabilities(
            "build",
            at(9),
            Some("tech-priest"),
            OutcomeDistribution::uniform(),
        );
        assert!((adjusted.sum() - 1.0).abs() < 1e-9);
        assert!(adjusted[Outcome::Accept] > adjusted[Outcome::Reject]);

        let untouched =
            engine.adjust_outcome_probabilities("dance", at(9), None, OutcomeDistribution::uniform());
        assert_eq!(untouched, OutcomeDistribution::uniform().normalized());
    }

    #[test]
    fn test_chaos_after_saturation() {
        let mut engine = LearningEngine::new();
        assert!(!engine.should_inject_chaos());
        for _ in 0..20 {
            engine.learn(&ctx("build", Outcome::Accept, &[]));
        }
        assert!(engine.should_inject_chaos());
    }

    #[test]
    fn test_reward_signal() {
        let before = calm();
        let after = EmotionVector {
            anger: before.anger - 0.1,
            trust: before.trust + 0.1,
            ennui: before.ennui + 0.1,
            ..before
        };
        let r = LearningEngine::compute_reward(&before, &after);
        assert!((r - (0.05 + 0.08 - 0.03)).abs() < 1e-12);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut engine = LearningEngine::new();
        let words = vec!["binary".to_string()];
        let mut c = ctx("delete", Outcome::Anger, &words);
        c.impulse.fear = 0.5;
        engine.learn(&c);
        c.verb = "kill";
        c.impulse.fear = 0.1;
        engine.learn(&c);
        engine.learn(&ctx("build", Outcome::Accept, &words));

        let restored = LearningEngine::from_bytes(&engine.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.scars(), engine.scars());
        assert_eq!(
            restored.vocabulary().collect::<Vec<_>>(),
            engine.vocabulary().collect::<Vec<_>>()
        );
        let key = AssociationKey::VerbOperator("delete".into(), "tech-priest".into());
        assert_eq!(restored.association(&key), engine.association(&key));
        assert_eq!(restored.wound("kill"), engine.wound("kill"));
        assert!(restored.wound("kill").is_some());
        assert!(LearningEngine::from_bytes(b"garbage").is_err());
    }
}
