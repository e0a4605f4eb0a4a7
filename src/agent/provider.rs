use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};
use ollama_rs::models::ModelOptions;
use serde_json::json;

use crate::config::ProviderConfig;

/// The external text-generation capability: one system instruction block,
/// one input text, one output text.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, system: &str, input: &str, temperature: f32) -> Result<String>;

    fn name(&self) -> &str {
        "llm"
    }
}

pub struct OllamaProvider {
    client: ollama_rs::Ollama,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: ollama_rs::Ollama, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn chat_request(&self, system: &str, input: &str, temperature: f32) -> ChatMessageRequest {
        let messages = vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(input.to_string()),
        ];
        ChatMessageRequest::new(self.model.clone(), messages)
            .options(ModelOptions::default().temperature(temperature))
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, system: &str, input: &str, temperature: f32) -> Result<String> {
        let res = self
            .client
            .send_chat_messages(self.chat_request(system, input, temperature))
            .await?;

        Ok(res.message.content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Where an OpenAI-style chat completion request goes and how it authenticates.
enum Endpoint {
    OpenAI { base_url: String, api_key: Option<String>, model: String },
    Azure { endpoint: String, api_key: String, deployment: String, api_version: String },
}

pub struct OpenAICompatibleProvider {
    client: Client,
    endpoint: Endpoint,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: Endpoint::OpenAI { base_url, api_key, model },
        }
    }

    pub fn azure(endpoint: String, api_key: String, deployment: String, api_version: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: Endpoint::Azure { endpoint, api_key, deployment, api_version },
        }
    }

    fn request(&self, body: serde_json::Value) -> reqwest::RequestBuilder {
        match &self.endpoint {
            Endpoint::OpenAI { base_url, api_key, model } => {
                let mut body = body;
                body["model"] = json!(model);
                let mut request = self
                    .client
                    .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
                    .json(&body);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }
                request
            }
            Endpoint::Azure { endpoint, api_key, deployment, api_version } => self
                .client
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    deployment,
                    api_version
                ))
                .header("api-key", api_key)
                .json(&body),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, system: &str, input: &str, temperature: f32) -> Result<String> {
        let body = json!({
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": input },
            ],
            "temperature": temperature,
        });

        let res = self.request(body).send().await?.error_for_status()?;
        let json: serde_json::Value = res.json().await?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to parse content from chat completion response")?;

        Ok(content.trim().to_string())
    }

    fn name(&self) -> &str {
        match self.endpoint {
            Endpoint::OpenAI { .. } => "openai",
            Endpoint::Azure { .. } => "azure",
        }
    }
}

/// Builds the configured backend.
pub fn provider_from_config(config: &ProviderConfig) -> std::sync::Arc<dyn LLMProvider> {
    match config {
        ProviderConfig::Azure { endpoint, api_key, deployment, api_version } => {
            std::sync::Arc::new(OpenAICompatibleProvider::azure(
                endpoint.clone(),
                api_key.clone(),
                deployment.clone(),
                api_version.clone(),
            ))
        }
        ProviderConfig::OpenAI { base_url, api_key, model } => std::sync::Arc::new(
            OpenAICompatibleProvider::new(base_url.clone(), api_key.clone(), model.clone()),
        ),
        ProviderConfig::Ollama { host, port, model } => std::sync::Arc::new(OllamaProvider::new(
            ollama_rs::Ollama::new(host.clone(), *port),
            model.clone(),
        )),
    }
}
