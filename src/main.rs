use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use trailquest::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "trailquest")]
#[command(about = "Trailquest - points, achievements and rewards for travel routes")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.trailquest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides storage.db_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config with a fresh API token
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the JSON API server
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Insert sample achievements, rewards and paths into empty tables
    Seed,

    /// Show the top users by points
    Leaderboard {
        /// Number of users to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a new user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Show points, level, badges and recent ledger entries
    Show {
        /// User id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let db = cli.db.as_deref();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Init { force }) => {
            cli::init::init_command(config_path, db, force).await?;
        }
        Some(Commands::Serve { port }) => {
            let config = Config::load(config_path)?;
            cli::serve::serve_command(&config, db, port).await?;
        }
        Some(Commands::Seed) => {
            let config = Config::load(config_path)?;
            cli::seed::seed_command(&config, db).await?;
        }
        Some(Commands::Leaderboard { limit }) => {
            let config = Config::load(config_path)?;
            cli::leaderboard::leaderboard_command(&config, db, limit).await?;
        }
        Some(Commands::User { command }) => {
            let config = Config::load(config_path)?;
            match command {
                UserCommands::Create { name, email } => {
                    cli::user::create_command(&config, db, name, email).await?;
                }
                UserCommands::Show { id } => {
                    cli::user::show_command(&config, db, &id).await?;
                }
            }
        }
        None => {
            // Default: run the server
            let config = Config::load(config_path)?;
            cli::serve::serve_command(&config, db, None).await?;
        }
    }

    Ok(())
}
