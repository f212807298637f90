use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reviewlens_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
}

impl LlmPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), user: user.into() }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String>;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.effective_base_url()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
        };

        tracing::debug!(
            event_name = "llm.request",
            endpoint = %self.endpoint,
            model = %self.model,
            "sending chat completion"
        );

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.context("llm request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("llm endpoint returned {status}: {body}");
        }

        let parsed: ChatResponse =
            response.json().await.context("llm response was not valid json")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("llm response contained no choices"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use reviewlens_core::config::{AppConfig, LlmProvider};

    use super::{ChatResponse, OpenAiCompatibleClient};

    #[test]
    fn endpoint_follows_provider_defaults() {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::Ollama;
        config.model = "llama3.1".to_string();

        let client = OpenAiCompatibleClient::from_config(&config).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "llama3.1");
    }

    #[test]
    fn explicit_base_url_drops_trailing_slash() {
        let mut config = AppConfig::default().llm;
        config.base_url = Some("http://127.0.0.1:8080/v1/".to_string());

        let client = OpenAiCompatibleClient::from_config(&config).expect("client");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8080/v1/chat/completions");
    }

    #[test]
    fn response_shape_tolerates_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#)
                .expect("parse");
        assert!(parsed.choices[0].message.content.is_none());
    }
}
