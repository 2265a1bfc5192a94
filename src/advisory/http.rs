//! HTTP client for the advisory text service

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Advisor;
use crate::config::AdvisoryConfig;
use crate::error::EngineError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Posts `{"model", "prompt"}` to `<url>` and reads `{"text"}`
#[derive(Clone)]
pub struct HttpAdvisor {
    url: String,
    model: String,
    api_key: Option<String>,
    client: ureq::Agent,
}

impl HttpAdvisor {
    pub fn new(url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(timeout)
            .build();

        Self {
            url: url.into(),
            model: model.into(),
            api_key: None,
            client,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub(super) fn from_config(url: &str, config: &AdvisoryConfig) -> Self {
        let key = config
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|k| !k.is_empty());
        Self::new(url, &config.model, Duration::from_secs(config.timeout_secs)).with_api_key(key)
    }
}

impl Advisor for HttpAdvisor {
    fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        let mut request = self.client.post(&self.url);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        debug!("[trailquest:advisory] POST {} ({} chars)", self.url, prompt.len());
        let response: GenerateResponse = request
            .send_json(GenerateRequest {
                model: &self.model,
                prompt,
            })
            .map_err(|e| EngineError::AdvisoryUnavailable(e.to_string()))?
            .into_json()
            .map_err(|e| EngineError::AdvisoryUnavailable(format!("bad response: {e}")))?;

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_service_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let advisor = HttpAdvisor::new("http://127.0.0.1:9/generate", "m", Duration::from_secs(1));
        let err = advisor.generate("hello").unwrap_err();
        assert_eq!(err.reason(), "advisory_unavailable");
    }
}
