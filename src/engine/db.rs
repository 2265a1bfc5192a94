//! SQLite database connection and schema management
//!
//! Manages the `~/.trailquest/trailquest.db` database with automatic schema
//! migration. Every multi-statement mutation goes through [`EngineDb::write`],
//! which holds the connection lock and an `IMMEDIATE` transaction for the
//! whole check-and-mutate sequence.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::EngineError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the progression database
#[derive(Clone)]
pub struct EngineDb {
    conn: Arc<Mutex<Connection>>,
}

impl EngineDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL lets the CLI read while the server writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection for reads
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-transaction drops the transaction, which rolls it back,
        // so the connection behind a poisoned lock is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside one immediate transaction, committing only on `Ok`
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create schema")?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: lookup indexes for per-owner listings and the journal
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_routes_user ON routes(user_id);
                CREATE INDEX IF NOT EXISTS idx_challenges_route ON challenges(route_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_path ON tasks(path_id);
                CREATE INDEX IF NOT EXISTS idx_ledger_user ON ledger_entries(user_id, id);
                CREATE INDEX IF NOT EXISTS idx_users_points ON users(total_points DESC, created_at);
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }
}

/// SQL schema for the progression database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    total_points INTEGER NOT NULL DEFAULT 0 CHECK (total_points >= 0),
    routes_completed INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

-- Set-valued user fields: the composite keys make set-union an INSERT OR IGNORE
CREATE TABLE IF NOT EXISTS user_badges (
    user_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    granted_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, title)
);

CREATE TABLE IF NOT EXISTS user_achievements (
    user_id TEXT NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    unlocked_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, title)
);

CREATE TABLE IF NOT EXISTS user_rewards (
    user_id TEXT NOT NULL REFERENCES users(id),
    item_id TEXT NOT NULL,
    acquired_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, item_id)
);

-- Append-only journal of balance changes
CREATE TABLE IF NOT EXISTS ledger_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(id),
    delta INTEGER NOT NULL,
    reason TEXT NOT NULL,
    reference TEXT,
    created_at INTEGER NOT NULL
);

-- Catalog
CREATE TABLE IF NOT EXISTS achievement_rules (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    condition_type TEXT NOT NULL,
    condition_value INTEGER NOT NULL,
    reward_points INTEGER NOT NULL DEFAULT 0,
    badge_icon TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reward_items (
    id TEXT PRIMARY KEY,
    item_name TEXT NOT NULL,
    cost INTEGER NOT NULL CHECK (cost >= 0),
    category TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS motivation_messages (
    id TEXT PRIMARY KEY,
    trigger_event TEXT NOT NULL,
    message_text TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_motivation_trigger ON motivation_messages(trigger_event);

-- Activities (locations are stored as JSON documents)
CREATE TABLE IF NOT EXISTS routes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    start_json TEXT NOT NULL,
    end_json TEXT NOT NULL,
    waypoints_json TEXT NOT NULL DEFAULT '[]',
    route_type TEXT NOT NULL,
    distance REAL,
    duration REAL,
    points_earned INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS challenges (
    id TEXT PRIMARY KEY,
    route_id TEXT NOT NULL,
    challenge_type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    location_json TEXT NOT NULL,
    points INTEGER NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS paths (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    start_json TEXT NOT NULL,
    end_json TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    ai_suggested INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    path_id TEXT NOT NULL REFERENCES paths(id),
    task_description TEXT NOT NULL,
    reward_points INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'Not Started',
    created_at INTEGER NOT NULL,
    completed_at INTEGER
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
