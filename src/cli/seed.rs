//! Seed command implementation

use anyhow::Result;
use std::path::Path;

use trailquest::config::Config;

/// Insert sample achievements, rewards, messages and paths
pub async fn seed_command(config: &Config, db_override: Option<&Path>) -> Result<()> {
    let engine = super::open_engine(config, db_override)?;
    let report = engine.seed()?;

    if report.total() == 0 {
        println!("Nothing to seed, catalog tables already populated.");
        return Ok(());
    }

    println!("Seeded sample data:");
    println!("  achievements:        {}", report.achievements);
    println!("  reward items:        {}", report.reward_items);
    println!("  motivation messages: {}", report.motivation_messages);
    println!("  paths:               {}", report.paths);
    println!("  tasks:               {}", report.tasks);
    Ok(())
}
