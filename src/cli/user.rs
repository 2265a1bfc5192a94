//! User command implementation

use anyhow::Result;
use std::path::Path;

use trailquest::config::Config;
use trailquest::domain::NewUser;
use trailquest::engine::LevelProgress;

/// Register a user and print the new id
pub async fn create_command(
    config: &Config,
    db_override: Option<&Path>,
    name: String,
    email: String,
) -> Result<()> {
    let engine = super::open_engine(config, db_override)?;
    let user = engine.users().create(&NewUser { name, email })?;
    println!("Created user {} ({})", user.id, user.name);
    Ok(())
}

/// Print a user's progression state
pub async fn show_command(config: &Config, db_override: Option<&Path>, user_id: &str) -> Result<()> {
    let engine = super::open_engine(config, db_override)?;
    let user = engine.users().get(user_id)?;
    let progress = LevelProgress::new(user.total_points);

    println!("{} <{}>", user.name, user.email);
    println!("  id:               {}", user.id);
    println!("  points:           {}", user.total_points);
    print!("  level:            {} {}", user.level, user.level_title);
    if progress.is_max_level() {
        println!(" (max)");
    } else {
        println!(" ({:.0}% to next)", progress.progress_to_next() * 100.0);
    }
    println!("  routes completed: {}", user.routes_completed);

    if !user.achievements.is_empty() {
        println!("  achievements:     {}", user.achievements.join(", "));
    }
    if !user.badges.is_empty() {
        println!("  badges:           {}", user.badges.join(", "));
    }

    let inventory = engine.rewards().inventory(&user.id)?;
    if !inventory.is_empty() {
        let names: Vec<_> = inventory.iter().map(|i| i.item_name.as_str()).collect();
        println!("  rewards:          {}", names.join(", "));
    }

    for entry in engine.ledger().entries(&user.id, 5)? {
        println!(
            "  {} {:+} {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.delta,
            entry.reason.as_str()
        );
    }
    Ok(())
}
