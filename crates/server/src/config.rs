//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Store directory path
    pub store_path: PathBuf,

    /// HTTP listen address
    pub http_listen: String,

    /// Static bearer token for API auth. Empty or missing means a random
    /// dev token is generated at startup unless auth is disabled.
    pub auth_token: Option<String>,

    /// Disable API auth entirely (not recommended)
    pub auth_disabled: bool,

    /// Seed demo bugs into an empty store at startup
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            store_path: bugtrack_common::default_store_path(),
            http_listen: "127.0.0.1:8080".to_string(),
            auth_token: None,
            auth_disabled: false,
            seed_demo: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the database path
    pub fn db_path(&self) -> PathBuf {
        self.store_path.join("state.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.http_listen, "127.0.0.1:8080");
        assert!(!cfg.auth_disabled);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = ServerConfig {
            http_listen: "0.0.0.0:9090".to_string(),
            seed_demo: true,
            ..Default::default()
        };
        cfg.save(&path).unwrap();

        let loaded = ServerConfig::load(&path).unwrap();
        assert_eq!(loaded.http_listen, "0.0.0.0:9090");
        assert!(loaded.seed_demo);
    }
}
