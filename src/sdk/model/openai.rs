// SPDX-License-Identifier: MIT

//! OpenAI Model - chat completions API implementation
//!
//! Works against any OpenAI-compatible endpoint; set `OPENAI_BASE_URL` to
//! point at a proxy or a local server.

use super::{GenerationConfig, Message, Model, Role};
use crate::sdk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const PROVIDER: &str = "OpenAI";

/// OpenAI chat model
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    pub fn new(
        model_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::ApiKeyMissing(PROVIDER.to_string()));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: model_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn message_to_openai(message: &Message) -> Value {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Model => "assistant",
        };
        json!({ "role": role, "content": message.text })
    }

    fn request_body(&self, history: &[Message], config: Option<&GenerationConfig>) -> Value {
        let messages: Vec<Value> = history.iter().map(Self::message_to_openai).collect();
        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if cfg.json_output {
                body["response_format"] = json!({ "type": "json_object" });
            }
        }
        body
    }

    fn parse_openai_response(response: &Value) -> Result<Message, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

        let text = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| ModelError::InvalidResponse("choice has no text content".to_string()))?;

        Ok(Message::model(text))
    }
}

#[async_trait]
impl Model for OpenAIModel {
    fn describe(&self) -> String {
        format!("{}:{}", PROVIDER, self.model_name)
    }

    async fn generate(
        &self,
        history: &[Message],
        config: Option<&GenerationConfig>,
    ) -> Result<Message, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(history, config);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ModelError::api(PROVIDER, format!("{}: {}", status, text)));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}
