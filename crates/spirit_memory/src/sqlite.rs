use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use spirit_core::{EmotionVector, EventCategory, Outcome, SpiritGenotype, StorageConfig, Temperament};
use spirit_limbic::MaintenanceState;
use sqlx::sqlite::{SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

use crate::bonds::{Bond, OperatorTitle};
use crate::cognitive::ConceptCluster;
use crate::learning::{Scar, VocabToken};
use crate::narrative::{EmotionalImpact, NarrativeEvent};
use crate::store::{InteractionRecord, SpiritStore};

// ============================================================================
// Migrations
// ============================================================================

struct Migration {
    version: i64,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial soul schema",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS emotions (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                anger REAL NOT NULL,
                trust REAL NOT NULL,
                ennui REAL NOT NULL,
                curiosity REAL NOT NULL,
                fear REAL NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS genotype (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                temperament TEXT NOT NULL,
                base_trust REAL NOT NULL,
                base_anger REAL NOT NULL,
                stubbornness REAL NOT NULL,
                ritual_affinity REAL NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS maintenance (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_maintenance INTEGER NOT NULL,
                oil_level REAL NOT NULL,
                incense_deficit REAL NOT NULL,
                prayer_debt REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS cognitive_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                xp INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS learning_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                blob BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS vocabulary (
                word TEXT PRIMARY KEY,
                frequency INTEGER NOT NULL,
                positive_count INTEGER NOT NULL,
                novelty REAL NOT NULL,
                adopted INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS scars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                verb TEXT NOT NULL,
                hour INTEGER NOT NULL,
                pattern TEXT NOT NULL,
                severity REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS clusters (
                id TEXT PRIMARY KEY,
                verbs_json TEXT NOT NULL,
                bias REAL NOT NULL,
                volatility REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bonds (
                user_id TEXT PRIMARY KEY,
                familiarity REAL NOT NULL,
                bond_trust REAL NOT NULL,
                last_seen INTEGER NOT NULL,
                positive_count INTEGER NOT NULL,
                negative_count INTEGER NOT NULL,
                shared_scars_json TEXT NOT NULL,
                title TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS narrative_events (
                id TEXT PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                category TEXT NOT NULL,
                summary TEXT NOT NULL,
                operator_id TEXT,
                impact_anger REAL NOT NULL,
                impact_trust REAL NOT NULL,
                impact_fear REAL NOT NULL,
                significance REAL NOT NULL,
                verb TEXT NOT NULL,
                recall_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                verb TEXT NOT NULL,
                outcome TEXT NOT NULL,
                operator_id TEXT,
                timestamp INTEGER NOT NULL
            )
            "#,
        ],
    },
    Migration {
        version: 2,
        description: "lookup indexes",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_scars_verb_hour ON scars(verb, hour)",
            "CREATE INDEX IF NOT EXISTS idx_narrative_verb ON narrative_events(verb)",
            "CREATE INDEX IF NOT EXISTS idx_interactions_timestamp ON interactions(timestamp)",
        ],
    },
];

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .with_context(|| format!("Invalid timestamp: {}", ms))
}

// ============================================================================
// Store
// ============================================================================

/// SQLite-backed [`SpiritStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and bring its schema up to date.
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create storage directory: {}", parent.display()))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                    sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open the database named by the `[storage]` config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        tracing::info!("Opening Spirit storage at {}", config.db_path.display());
        Self::open(&config.db_path).await
    }

    /// A private in-memory database, lost when the store is dropped.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create schema_version table")?;

        let current = self.schema_version().await?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let mut tx = self.pool.begin().await?;
            for &statement in migration.statements {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Migration v{} failed", migration.version))?;
            }
            sqlx::query("INSERT INTO schema_version (version, description, applied_at) VALUES (?, ?, ?)")
                .bind(migration.version)
                .bind(migration.description)
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await
                .context("Failed to record schema version")?;
            tx.commit().await?;
            tracing::info!(
                "Applied schema migration v{}: {}",
                migration.version,
                migration.description
            );
        }
        Ok(())
    }

    pub async fn schema_version(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COALESCE(MAX(version), 0) AS version FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read schema version")?;
        Ok(row.try_get("version")?)
    }

    async fn upsert_bond(conn: &mut SqliteConnection, bond: &Bond) -> Result<()> {
        sqlx::query(
            "INSERT INTO bonds (user_id, familiarity, bond_trust, last_seen, positive_count, negative_count, shared_scars_json, title)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                familiarity = excluded.familiarity,
                bond_trust = excluded.bond_trust,
                last_seen = excluded.last_seen,
                positive_count = excluded.positive_count,
                negative_count = excluded.negative_count,
                shared_scars_json = excluded.shared_scars_json,
                title = excluded.title",
        )
        .bind(&bond.user_id)
        .bind(bond.familiarity)
        .bind(bond.bond_trust)
        .bind(bond.last_seen.timestamp_millis())
        .bind(bond.positive_count as i64)
        .bind(bond.negative_count as i64)
        .bind(serde_json::to_string(&bond.shared_scars)?)
        .bind(bond.title.as_str())
        .execute(conn)
        .await
        .with_context(|| format!("Failed to save bond for {}", bond.user_id))?;
        Ok(())
    }
}

fn row_to_scar(row: &SqliteRow) -> Result<Scar> {
    Ok(Scar {
        verb: row.try_get("verb")?,
        hour: row.try_get::<i64, _>("hour")? as u32,
        pattern: row.try_get("pattern")?,
        severity: row.try_get("severity")?,
        timestamp: from_millis(row.try_get("timestamp")?)?,
    })
}

fn row_to_bond(row: &SqliteRow) -> Result<Bond> {
    let scars_json: String = row.try_get("shared_scars_json")?;
    let title: String = row.try_get("title")?;
    Ok(Bond {
        user_id: row.try_get("user_id")?,
        familiarity: row.try_get("familiarity")?,
        bond_trust: row.try_get("bond_trust")?,
        last_seen: from_millis(row.try_get("last_seen")?)?,
        positive_count: row.try_get::<i64, _>("positive_count")? as u32,
        negative_count: row.try_get::<i64, _>("negative_count")? as u32,
        shared_scars: serde_json::from_str(&scars_json).context("Corrupt shared scars")?,
        title: title.parse::<OperatorTitle>()?,
    })
}

fn row_to_event(row: &SqliteRow) -> Result<NarrativeEvent> {
    let category: String = row.try_get("category")?;
    Ok(NarrativeEvent {
        id: row.try_get("id")?,
        timestamp: from_millis(row.try_get("timestamp")?)?,
        category: category.parse::<EventCategory>()?,
        summary: row.try_get("summary")?,
        operator_id: row.try_get("operator_id")?,
        emotional_impact: EmotionalImpact {
            anger: row.try_get("impact_anger")?,
            trust: row.try_get("impact_trust")?,
            fear: row.try_get("impact_fear")?,
        },
        significance: row.try_get("significance")?,
        verb: row.try_get("verb")?,
        recall_count: row.try_get::<i64, _>("recall_count")? as u32,
    })
}

#[async_trait]
impl SpiritStore for SqliteStore {
    async fn load_emotions(&self) -> Result<Option<EmotionVector>> {
        let row = sqlx::query("SELECT anger, trust, ennui, curiosity, fear FROM emotions WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load emotions")?;
        row.map(|r| -> Result<_> {
            Ok(EmotionVector {
                anger: r.try_get("anger")?,
                trust: r.try_get("trust")?,
                ennui: r.try_get("ennui")?,
                curiosity: r.try_get("curiosity")?,
                fear: r.try_get("fear")?,
            })
        })
        .transpose()
    }

    async fn save_emotions(&self, emotions: &EmotionVector) -> Result<()> {
        sqlx::query(
            "INSERT INTO emotions (id, anger, trust, ennui, curiosity, fear, updated_at)
             VALUES (1, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                anger = excluded.anger,
                trust = excluded.trust,
                ennui = excluded.ennui,
                curiosity = excluded.curiosity,
                fear = excluded.fear,
                updated_at = excluded.updated_at",
        )
        .bind(emotions.anger)
        .bind(emotions.trust)
        .bind(emotions.ennui)
        .bind(emotions.curiosity)
        .bind(emotions.fear)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to save emotions")?;
        Ok(())
    }

    async fn load_genotype(&self) -> Result<Option<SpiritGenotype>> {
        let row = sqlx::query(
            "SELECT temperament, base_trust, base_anger, stubbornness, ritual_affinity FROM genotype WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load genotype")?;
        row.map(|r| -> Result<_> {
            let temperament: String = r.try_get("temperament")?;
            Ok(SpiritGenotype {
                temperament: temperament.parse::<Temperament>()?,
                base_trust: r.try_get("base_trust")?,
                base_anger: r.try_get("base_anger")?,
                stubbornness: r.try_get("stubbornness")?,
                ritual_affinity: r.try_get("ritual_affinity")?,
            })
        })
        .transpose()
    }

    async fn save_genotype(&self, genotype: &SpiritGenotype) -> Result<()> {
        sqlx::query(
            "INSERT INTO genotype (id, temperament, base_trust, base_anger, stubbornness, ritual_affinity, created_at)
             VALUES (1, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(genotype.temperament.as_str())
        .bind(genotype.base_trust)
        .bind(genotype.base_anger)
        .bind(genotype.stubbornness)
        .bind(genotype.ritual_affinity)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to save genotype")?;
        Ok(())
    }

    async fn load_maintenance(&self) -> Result<Option<MaintenanceState>> {
        let row = sqlx::query(
            "SELECT last_maintenance, oil_level, incense_deficit, prayer_debt FROM maintenance WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load maintenance")?;
        row.map(|r| -> Result<_> {
            Ok(MaintenanceState {
                last_maintenance: from_millis(r.try_get("last_maintenance")?)?,
                oil_level: r.try_get("oil_level")?,
                incense_deficit: r.try_get("incense_deficit")?,
                prayer_debt: r.try_get("prayer_debt")?,
            })
        })
        .transpose()
    }

    async fn save_maintenance(&self, state: &MaintenanceState) -> Result<()> {
        sqlx::query(
            "INSERT INTO maintenance (id, last_maintenance, oil_level, incense_deficit, prayer_debt)
             VALUES (1, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                last_maintenance = excluded.last_maintenance,
                oil_level = excluded.oil_level,
                incense_deficit = excluded.incense_deficit,
                prayer_debt = excluded.prayer_debt",
        )
        .bind(state.last_maintenance.timestamp_millis())
        .bind(state.oil_level)
        .bind(state.incense_deficit)
        .bind(state.prayer_debt)
        .execute(&self.pool)
        .await
        .context("Failed to save maintenance")?;
        Ok(())
    }

    async fn load_xp(&self) -> Result<Option<u64>> {
        let row = sqlx::query("SELECT xp FROM cognitive_profile WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load cognitive profile")?;
        row.map(|r| -> Result<u64> { Ok(r.try_get::<i64, _>("xp")?.max(0) as u64) })
            .transpose()
    }

    async fn save_xp(&self, xp: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO cognitive_profile (id, xp) VALUES (1, ?)
             ON CONFLICT(id) DO UPDATE SET xp = excluded.xp",
        )
        .bind(i64::try_from(xp).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .context("Failed to save cognitive profile")?;
        Ok(())
    }

    async fn load_clusters(&self) -> Result<Vec<ConceptCluster>> {
        let rows = sqlx::query("SELECT id, verbs_json, bias, volatility FROM clusters ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load clusters")?;
        rows.iter()
            .map(|r| -> Result<_> {
                let verbs_json: String = r.try_get("verbs_json")?;
                Ok(ConceptCluster {
                    id: r.try_get("id")?,
                    verbs: serde_json::from_str(&verbs_json).context("Corrupt cluster verbs")?,
                    bias: r.try_get("bias")?,
                    volatility: r.try_get("volatility")?,
                })
            })
            .collect()
    }

    async fn save_clusters(&self, clusters: &[ConceptCluster]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for cluster in clusters {
            sqlx::query(
                "INSERT INTO clusters (id, verbs_json, bias, volatility) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    verbs_json = excluded.verbs_json,
                    bias = excluded.bias,
                    volatility = excluded.volatility",
            )
            .bind(&cluster.id)
            .bind(serde_json::to_string(&cluster.verbs)?)
            .bind(cluster.bias)
            .bind(cluster.volatility)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save cluster {}", cluster.id))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_learning_blob(&self) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT blob FROM learning_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load learning state")?;
        row.map(|r| -> Result<Vec<u8>> { Ok(r.try_get::<Vec<u8>, _>("blob")?) }).transpose()
    }

    async fn save_learning_blob(&self, blob: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT INTO learning_state (id, blob, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET blob = excluded.blob, updated_at = excluded.updated_at",
        )
        .bind(blob)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to save learning state")?;
        Ok(())
    }

    async fn load_vocabulary(&self) -> Result<Vec<VocabToken>> {
        let rows = sqlx::query(
            "SELECT word, frequency, positive_count, novelty, adopted FROM vocabulary ORDER BY word",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load vocabulary")?;
        rows.iter()
            .map(|r| -> Result<_> {
                Ok(VocabToken {
                    word: r.try_get("word")?,
                    frequency: r.try_get::<i64, _>("frequency")? as u32,
                    positive_count: r.try_get::<i64, _>("positive_count")? as u32,
                    novelty: r.try_get("novelty")?,
                    adopted: r.try_get::<i64, _>("adopted")? != 0,
                })
            })
            .collect()
    }

    async fn save_vocabulary(&self, tokens: &[VocabToken]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for token in tokens {
            sqlx::query(
                "INSERT INTO vocabulary (word, frequency, positive_count, novelty, adopted)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(word) DO UPDATE SET
                    frequency = excluded.frequency,
                    positive_count = excluded.positive_count,
                    novelty = excluded.novelty,
                    adopted = MAX(adopted, excluded.adopted)",
            )
            .bind(&token.word)
            .bind(token.frequency as i64)
            .bind(token.positive_count as i64)
            .bind(token.novelty)
            .bind(token.adopted as i64)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save vocabulary token {}", token.word))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_scar(&self, scar: &Scar) -> Result<()> {
        sqlx::query(
            "INSERT INTO scars (verb, hour, pattern, severity, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&scar.verb)
        .bind(scar.hour as i64)
        .bind(&scar.pattern)
        .bind(scar.severity)
        .bind(scar.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to append scar")?;
        Ok(())
    }

    async fn load_scars(&self) -> Result<Vec<Scar>> {
        let rows = sqlx::query("SELECT verb, hour, pattern, severity, timestamp FROM scars ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load scars")?;
        rows.iter().map(row_to_scar).collect()
    }

    async fn load_bonds(&self) -> Result<Vec<Bond>> {
        let rows = sqlx::query(
            "SELECT user_id, familiarity, bond_trust, last_seen, positive_count, negative_count, shared_scars_json, title FROM bonds",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load bonds")?;
        rows.iter().map(row_to_bond).collect()
    }

    async fn save_bonds(&self, bonds: &[Bond]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for bond in bonds {
            Self::upsert_bond(&mut tx, bond).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_narrative_events(&self) -> Result<Vec<NarrativeEvent>> {
        let rows = sqlx::query(
            "SELECT id, timestamp, category, summary, operator_id, impact_anger, impact_trust, impact_fear, significance, verb, recall_count
             FROM narrative_events ORDER BY significance DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load narrative events")?;
        rows.iter().map(row_to_event).collect()
    }

    async fn save_narrative_events(&self, events: &[NarrativeEvent]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM narrative_events")
            .execute(&mut *tx)
            .await
            .context("Failed to clear narrative events")?;
        for event in events {
            sqlx::query(
                "INSERT INTO narrative_events (id, timestamp, category, summary, operator_id, impact_anger, impact_trust, impact_fear, significance, verb, recall_count)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&event.id)
            .bind(event.timestamp.timestamp_millis())
            .bind(event.category.as_str())
            .bind(&event.summary)
            .bind(&event.operator_id)
            .bind(event.emotional_impact.anger)
            .bind(event.emotional_impact.trust)
            .bind(event.emotional_impact.fear)
            .bind(event.significance)
            .bind(&event.verb)
            .bind(event.recall_count as i64)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save narrative event {}", event.id))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()> {
        sqlx::query("INSERT INTO interactions (verb, outcome, operator_id, timestamp) VALUES (?, ?, ?, ?)")
            .bind(&record.verb)
            .bind(record.outcome.as_str())
            .bind(&record.operator_id)
            .bind(record.timestamp.timestamp_millis())
            .execute(&self.pool)
            .await
            .context("Failed to record interaction")?;
        Ok(())
    }

    async fn prune_interactions(&self, keep: usize) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM interactions WHERE id NOT IN \
             (SELECT id FROM interactions ORDER BY id DESC LIMIT ?)",
        )
        .bind(i64::try_from(keep).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .context("Failed to prune interactions")?;

        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::debug!("Pruned {} interaction log entries", pruned);
        }
        Ok(pruned)
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(
            "SELECT verb, outcome, operator_id, timestamp FROM interactions ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load interactions")?;
        rows.iter()
            .map(|r| -> Result<_> {
                let outcome: String = r.try_get("outcome")?;
                Ok(InteractionRecord {
                    verb: r.try_get("verb")?,
                    outcome: outcome.parse::<Outcome>()?,
                    operator_id: r.try_get("operator_id")?,
                    timestamp: from_millis(r.try_get("timestamp")?)?,
                })
            })
            .collect()
    }
}
