//! Server configuration, read from `HBNB_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

/// Which storage engine backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// In-memory objects serialized to a JSON file
    File,
    /// SQLite database
    Db,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_host: String,
    pub api_port: u16,
    pub type_storage: StorageType,
    pub file_path: PathBuf,
    pub database_path: PathBuf,
    /// Deployment environment; `test` resets the database on reload
    pub env: Option<String>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix("HBNB"))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 5000)?
            .set_default("type_storage", "file")?
            .set_default("file_path", "file.json")?
            .set_default("database_path", "hbnb.db")?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn is_test(&self) -> bool {
        self.env.as_deref() == Some("test")
    }
}
