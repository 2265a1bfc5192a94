//! Advisory text collaborator
//!
//! Free-form travel advice from an external text-generation service. The
//! advisor only ever produces display text; nothing it returns feeds back
//! into points, achievements or completion state.

mod http;

use tracing::warn;

pub use http::HttpAdvisor;

use crate::config::AdvisoryConfig;
use crate::error::EngineError;

/// Text shown in place of advice when the service fails
pub const PLACEHOLDER: &str =
    "Travel tips are unavailable right now. Keep exploring and check back soon!";

/// A source of human-readable advice
pub trait Advisor: Send + Sync {
    /// Generate text for a prompt; fails with `AdvisoryUnavailable`
    fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}

/// Canned responses, used when no service is configured
#[derive(Debug, Clone, Default)]
pub struct StubAdvisor;

impl Advisor for StubAdvisor {
    fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        let topic = prompt
            .lines()
            .find_map(|l| l.trim().strip_prefix("User question:"))
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or("your trip");
        Ok(format!(
            "Here's a tip for {topic}: start early, carry water and leave room for detours."
        ))
    }
}

/// Build the advisor selected by the configuration
pub fn from_config(config: &AdvisoryConfig) -> Box<dyn Advisor> {
    match (&config.url, config.enabled) {
        (Some(url), true) => Box::new(HttpAdvisor::from_config(url, config)),
        (None, true) => {
            warn!("[trailquest:advisory] Advisory enabled without a url, using stub");
            Box::new(StubAdvisor)
        }
        _ => Box::new(StubAdvisor),
    }
}

/// Prompt for the chat endpoint
pub fn chat_prompt(message: &str, user_context: &str) -> String {
    format!(
        "You are a helpful travel assistant specialized in route planning and travel recommendations.\n\
         User context: {user_context}\n\
         User question: {message}\n\
         Provide practical, engaging advice for a travel app user."
    )
}

/// Advice text, or the placeholder when the service fails
pub fn advise_or_placeholder(advisor: &dyn Advisor, prompt: &str) -> String {
    match advisor.generate(prompt) {
        Ok(text) => text,
        Err(e) => {
            warn!("[trailquest:advisory] {}, using placeholder", e);
            PLACEHOLDER.to_string()
        }
    }
}
