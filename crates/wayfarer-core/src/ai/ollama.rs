//! Ollama backend implementation
//!
//! Local alternative to the hosted model, using the non-streaming
//! `/api/generate` endpoint with JSON output mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::transport::{send_with_retry, HttpReply, RetryPolicy};
use super::types::{BackendInfo, BackendKind, GenerationParams};
use super::GenerativeBackend;

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

/// Sampling options, named the way Ollama expects them
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    num_predict: u32,
}

impl From<&GenerationParams> for OllamaOptions {
    fn from(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            num_predict: params.max_output_tokens,
        }
    }
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl GenerativeBackend for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        retry: &RetryPolicy,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: params.into(),
        };

        let body = send_with_retry(retry, |_attempt| {
            let pending = self.http_client.post(&url).json(&request).send();
            async move { HttpReply::read(pending.await?).await }
        })
        .await?;

        let response: OllamaResponse = serde_json::from_str(&body)?;
        debug!(response_chars = response.response.len(), "Ollama response received");
        Ok(response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: BackendKind::Ollama,
            model: self.model.clone(),
            host: self.base_url.clone(),
            has_api_key: false,
        }
    }
}
