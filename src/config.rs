use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SynthesisConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// How long a blocked write waits on a busy store before failing as
    /// retryable, in milliseconds.
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Model identifier recorded with embeddings when callers don't name one.
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// KNN over-fetch factor: candidates = limit × multiplier, so tenant
    /// scoping and per-model dedup still leave enough survivors.
    pub candidate_multiplier: usize,
    pub default_max_hops: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8081,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_synthesis_dir()
            .join("synthesis.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            default_model: "all-MiniLM-L6-v2".into(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            candidate_multiplier: 4,
            default_max_hops: 2,
        }
    }
}

/// Returns `~/.synthesis/`
pub fn default_synthesis_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".synthesis")
}

/// Returns the default config file path: `~/.synthesis/config.toml`
pub fn default_config_path() -> PathBuf {
    default_synthesis_dir().join("config.toml")
}

impl SynthesisConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SynthesisConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (SYNTHESIS_DB,
    /// SYNTHESIS_LOG_LEVEL, SYNTHESIS_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SYNTHESIS_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("SYNTHESIS_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SYNTHESIS_MODEL") {
            self.index.default_model = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SynthesisConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.default_max_hops, 2);
        assert!(config.storage.db_path.ends_with("synthesis.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9090

[storage]
db_path = "/tmp/test.db"
busy_timeout_ms = 250

[search]
default_limit = 25
"#;
        let config: SynthesisConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.storage.busy_timeout_ms, 250);
        assert_eq!(config.search.default_limit, 25);
        // defaults still apply for unset fields
        assert_eq!(config.search.candidate_multiplier, 4);
        assert_eq!(config.index.default_model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = SynthesisConfig::default();
        std::env::set_var("SYNTHESIS_DB", "/tmp/override.db");
        std::env::set_var("SYNTHESIS_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");

        std::env::remove_var("SYNTHESIS_DB");
        std::env::remove_var("SYNTHESIS_LOG_LEVEL");
    }
}
