//! Leaderboard command implementation

use anyhow::Result;
use std::path::Path;

use trailquest::config::Config;

/// Print the top users by points
pub async fn leaderboard_command(config: &Config, db_override: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let engine = super::open_engine(config, db_override)?;
    let users = engine.leaderboard(limit)?;

    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }

    println!("Leaderboard ({}):\n", users.len());
    for (rank, user) in users.iter().enumerate() {
        println!(
            "  {:>3}. {:<24} {:>6} pts  L{} {}",
            rank + 1,
            user.name,
            user.total_points,
            user.level,
            user.level_title
        );
    }
    Ok(())
}
