//! Init command implementation

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use trailquest::config::Config;

/// Write a default config with a fresh shared token and create the database
pub async fn init_command(config_path: Option<&Path>, db_override: Option<&Path>, force: bool) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::with_generated_token();
    if let Some(db) = db_override {
        config.storage.db_path = Some(PathBuf::from(db));
    }
    config.save_to_file(&config_path)?;
    println!("Created: {}", config_path.display());

    let db_path = config.db_path();
    super::open_engine(&config, None)?;
    println!("Database: {}", db_path.display());
    if let Some(token) = &config.server.auth_token {
        println!("API token (send as X-Trailquest-Token): {}", token);
    }

    Ok(())
}
