//! Relay configuration file.
//!
//! The file mirrors the plugin's `config.yml`: a `database` section with the
//! MySQL connection settings, and optionally an `sqlite` path that switches
//! the relay to the embedded backend.

use std::path::{Path, PathBuf};

use achievelog_core::ConnectionConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default)]
    pub database: Option<ConnectionConfig>,
    #[serde(default)]
    pub sqlite: Option<PathBuf>,
}

/// Which backend the relay should open.
#[derive(Debug, Clone)]
pub enum Backend {
    MySql(ConnectionConfig),
    Sqlite(PathBuf),
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Resolve the backend; a command-line sqlite path wins over the file.
    pub fn backend(self, sqlite_override: Option<PathBuf>) -> Result<Backend> {
        if let Some(path) = sqlite_override.or(self.sqlite) {
            return Ok(Backend::Sqlite(path));
        }
        match self.database {
            Some(database) => {
                database.validate()?;
                Ok(Backend::MySql(database))
            }
            None => bail!("config has neither a `database` section nor an `sqlite` path"),
        }
    }
}
