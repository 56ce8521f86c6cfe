use crate::advisory::TextGenerator;
use crate::error::{EngineError, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Per-request ceiling. Risk assessment degrades to the static fallback
/// rather than waiting on a slow completion.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Text-generation collaborator backed by the Gemini `generateContent`
/// endpoint. Only used for mitigation prose; every error path is absorbed
/// upstream by the risk scorer.
#[derive(Clone)]
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiAdvisor {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let res = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::TextGeneration(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineError::TextGeneration(format!(
                "API error (status {}): {}",
                status, err_text
            )));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| EngineError::TextGeneration(e.to_string()))?;

        body.get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| {
                EngineError::TextGeneration("no text candidate in response".to_string())
            })
    }
}

impl TextGenerator for GeminiAdvisor {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.generate(prompt))
    }
}
