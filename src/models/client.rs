use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{ChatbotError, ChatbotResult};
use crate::models::{BaseChatModel, BaseEmbeddingModel, ChatModelMetadata};
use crate::types::ChatMessage;

/// OpenAI-compatible embedding endpoint client
#[derive(Clone)]
pub struct OpenAiEmbeddingModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiEmbeddingModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.embedding_base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl BaseEmbeddingModel for OpenAiEmbeddingModel {
    async fn embed(&self, text: &str) -> ChatbotResult<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbeddingReq<'a> {
            model: &'a str,
            input: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        #[derive(Deserialize)]
        struct EmbeddingResp {
            data: Vec<EmbeddingData>,
        }

        let input = text.trim();
        if input.is_empty() {
            return Err(ChatbotError::ModelError(
                "cannot embed empty text input".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.base_url);
        let mut request = self.client.post(url).json(&EmbeddingReq {
            model: &self.model,
            input,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatbotError::ModelError(format!(
                "embedding endpoint returned {}: {}",
                status,
                normalize_err_body(&body)
            )));
        }

        let response = response.json::<EmbeddingResp>().await?;
        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                ChatbotError::ModelError("embedding endpoint returned no vectors".to_string())
            })?;

        Ok(vector)
    }
}

/// OpenAI-compatible chat completion endpoint client
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.chat_base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl BaseChatModel for OpenAiChatModel {
    async fn metadata(&self) -> ChatbotResult<ChatModelMetadata> {
        #[derive(Deserialize)]
        struct ModelResp {
            id: String,
            #[serde(default)]
            context_window: Option<u32>,
        }

        let url = format!("{}/models/{}", self.base_url, self.model);
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatbotError::ModelError(format!(
                "model metadata endpoint returned {}: {}",
                status,
                normalize_err_body(&body)
            )));
        }

        let response = response.json::<ModelResp>().await?;
        Ok(ChatModelMetadata {
            model: response.id,
            context_window: response.context_window,
        })
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ChatbotResult<ChatMessage> {
        #[derive(Serialize)]
        struct ChatReq<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            stream: bool,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }

        #[derive(Deserialize)]
        struct ChatResp {
            choices: Vec<Choice>,
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(url).json(&ChatReq {
            model: &self.model,
            messages,
            stream: false,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatbotError::ModelError(format!(
                "chat endpoint returned {}: {}",
                status,
                normalize_err_body(&body)
            )));
        }

        let response = response.json::<ChatResp>().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ChatbotError::ModelError("chat endpoint returned no choices".to_string()))
    }
}

/// Pull the `error` field out of a JSON error body when there is one
fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
        if let Some(err) = json
            .pointer("/error/message")
            .and_then(|v| v.as_str())
        {
            return err.to_string();
        }
    }

    trimmed.to_string()
}
