//! Configuration loading and management

mod io;
mod settings;
mod token;

pub use settings::{AdvisoryConfig, ServerSettings, StorageSettings};
pub use token::generate_auth_token;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::RewardSettings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    /// Point values applied by the engine
    #[serde(default)]
    pub rewards: RewardSettings,

    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

impl Config {
    /// Database path, falling back to `~/.trailquest/trailquest.db`
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("trailquest.db"))
    }

    /// Defaults plus a fresh shared token, as written by `init`
    pub fn with_generated_token() -> Self {
        let mut config = Self::default();
        config.server.auth_token = Some(generate_auth_token());
        config
    }
}
