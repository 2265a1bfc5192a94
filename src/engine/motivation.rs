//! Feedback strings shown alongside completion results

use std::sync::Arc;

use tracing::{debug, warn};

use super::catalog::CatalogRepository;

pub const TRIGGER_TASK_COMPLETED: &str = "task_completed";
pub const TRIGGER_ROUTE_COMPLETED: &str = "route_completed";
pub const TRIGGER_DAILY_LOGIN: &str = "daily_login";

const FALLBACK_MESSAGE: &str = "Keep going!";

/// Built-in messages used when the catalog has none for a trigger
fn defaults(trigger: &str) -> &'static [&'static str] {
    match trigger {
        TRIGGER_TASK_COMPLETED => &["🔥 You’re unstoppable! Keep going!", "Nice! Another one down."],
        TRIGGER_ROUTE_COMPLETED => &[
            "Great job finishing the route!",
            "🏁 Route complete! On to the next adventure.",
        ],
        TRIGGER_DAILY_LOGIN => &["Welcome back, explorer!", "New day, new quests!"],
        _ => &[],
    }
}

/// Picks a message for a trigger event. Stateless apart from the catalog.
#[derive(Clone)]
pub struct MotivationSelector {
    catalog: Arc<dyn CatalogRepository>,
}

impl MotivationSelector {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Uniform pick among stored messages, then built-in defaults, then a
    /// generic fallback. Never fails: a catalog error degrades to defaults.
    pub fn pick(&self, trigger: &str) -> String {
        let stored = match self.catalog.motivation_messages(trigger) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    "[trailquest:motivation] Failed to read messages for '{}': {}",
                    trigger, e
                );
                Vec::new()
            }
        };

        if !stored.is_empty() {
            let idx = random_index(stored.len());
            return stored[idx].message_text.clone();
        }

        let builtin = defaults(trigger);
        if builtin.is_empty() {
            debug!("[trailquest:motivation] No messages for '{}'", trigger);
            return FALLBACK_MESSAGE.to_string();
        }
        builtin[random_index(builtin.len())].to_string()
    }
}

/// Uniform index in `0..len` from the OS RNG; `len` must be non-zero
fn random_index(len: usize) -> usize {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0;
    }
    (u64::from_le_bytes(buf) % len as u64) as usize
}
