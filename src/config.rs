//! Daemon configuration -- TOML file with defaults for everything.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address the API server binds to.
    pub bind: String,
    /// SQLite database path.
    pub db_path: String,
    /// Identity the `me` assignee filter resolves to. Stands in for an
    /// authenticated user until there is real auth.
    pub current_user: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            db_path: "data/incidentd.db".to_string(),
            current_user: "Dave".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults if no path given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Config::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file {}", p.display()))
            }
        }
    }
}
