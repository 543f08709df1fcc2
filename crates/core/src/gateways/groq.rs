use crate::traits::WebSearchModel;
use crate::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// OpenAI-compatible endpoint.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Groq chat-completions client for the fallback path. The default
/// `groq/compound` model performs its own web search server-side.
#[derive(Clone)]
pub struct GroqWebSearch {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GroqWebSearch {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl WebSearchModel for GroqWebSearch {
    async fn search_complete(&self, message: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": message }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "groq".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::EmptyCompletion("groq".to_string()))
    }

    fn ensure_configured(&self) -> Result<(), BackendError> {
        if self.api_key.trim().is_empty() {
            return Err(BackendError::MissingCredentials("groq".to_string()));
        }
        Url::parse(&self.endpoint)?;
        Ok(())
    }
}
