use crate::traits::ChatModel;
use crate::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client. One configured instance per role: the
/// grading handle turns on JSON output, the basic handle stays free-text.
/// Cloning is cheap, so the same basic handle serves both the rewriter and
/// the generator.
#[derive(Clone)]
pub struct GeminiChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
    json_output: bool,
}

impl GeminiChat {
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
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrains responses to `application/json`, used by the relevance
    /// grading handle.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(&self, system: &str, human: &str) -> Result<String, BackendError> {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": human }] }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if self.json_output {
            generation_config.insert("responseMimeType".to_string(), json!("application/json"));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.endpoint, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::EmptyCompletion("gemini".to_string()))
    }

    fn ensure_configured(&self) -> Result<(), BackendError> {
        if self.api_key.trim().is_empty() {
            return Err(BackendError::MissingCredentials("gemini".to_string()));
        }
        Url::parse(&self.endpoint)?;
        Ok(())
    }
}
