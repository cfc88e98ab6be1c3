use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpiritConfig {
    pub storage: StorageConfig,
    pub heartbeat: HeartbeatSettings,
    pub memory: MemoryConfig,
}

impl SpiritConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SpiritConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SPIRIT_DB_PATH") {
            self.storage.db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SPIRIT_PULSE_SECS") {
            if let Ok(n) = v.parse() {
                self.heartbeat.base_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("SPIRIT_PULSE_JITTER") {
            if let Ok(n) = v.parse::<f64>() {
                self.heartbeat.jitter = n.clamp(0.0, 1.0);
            }
        }
        if let Ok(v) = std::env::var("SPIRIT_TIME_SCALE") {
            if let Ok(n) = v.parse::<f64>() {
                if n > 0.0 {
                    self.heartbeat.time_scale = n;
                }
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding the Spirit's soul. Parent directories are created on open.
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".machine-spirit")
        .join("soul.db")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    /// Mean seconds between autonomous pulses.
    pub base_interval_secs: u64,
    /// Fractional spread around the base interval (0.5 = ±50%).
    pub jitter: f64,
    /// Simulated hours per real hour passed to `pulse`.
    pub time_scale: f64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            base_interval_secs: 60,
            jitter: 0.5,
            time_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub narrative_capacity: usize,
    /// Interaction log rows kept after pruning.
    pub interaction_log_limit: usize,
    pub mutterings_cap: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            narrative_capacity: 100,
            interaction_log_limit: 5000,
            mutterings_cap: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SpiritConfig::default();
        assert_eq!(cfg.heartbeat.base_interval_secs, 60);
        assert_eq!(cfg.heartbeat.jitter, 0.5);
        assert_eq!(cfg.memory.narrative_capacity, 100);
        assert_eq!(cfg.memory.interaction_log_limit, 5000);
        assert!(cfg.storage.db_path.ends_with("soul.db"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[heartbeat]
base_interval_secs = 15
"#;
        let cfg: SpiritConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.heartbeat.base_interval_secs, 15);
        // Defaults for unspecified fields
        assert_eq!(cfg.heartbeat.jitter, 0.5);
        assert_eq!(cfg.memory.mutterings_cap, 20);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[storage]
db_path = "data/soul.db"

[heartbeat]
base_interval_secs = 30
jitter = 0.25
time_scale = 60.0

[memory]
narrative_capacity = 50
interaction_log_limit = 1000
mutterings_cap = 8
"#;
        let cfg: SpiritConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.storage.db_path, PathBuf::from("data/soul.db"));
        assert_eq!(cfg.heartbeat.jitter, 0.25);
        assert_eq!(cfg.heartbeat.time_scale, 60.0);
        assert_eq!(cfg.memory.narrative_capacity, 50);
        assert_eq!(cfg.memory.interaction_log_limit, 1000);
        assert_eq!(cfg.memory.mutterings_cap, 8);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let cfg = SpiritConfig::load_or_default("/nonexistent/spirit.toml");
        assert_eq!(cfg.memory.narrative_capacity, 100);
    }
}
