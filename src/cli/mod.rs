//! CLI command implementations

pub mod init;
pub mod leaderboard;
pub mod seed;
pub mod serve;
pub mod user;

use std::path::Path;

use anyhow::{Context, Result};

use trailquest::config::Config;
use trailquest::engine::Engine;

/// Open the engine on `--db`, or the configured database path
pub fn open_engine(config: &Config, db_override: Option<&Path>) -> Result<Engine> {
    let db_path = db_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.db_path());
    Engine::open(&db_path, config.rewards.clone())
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}
