//! Gemini backend implementation
//!
//! Calls the `generateContent` endpoint of the Generative Language API. The
//! API key travels in the `x-goog-api-key` header, so it never appears in a
//! request URL, an error message or a log line.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::transport::{send_with_retry, HttpReply, RetryPolicy};
use super::types::{BackendInfo, BackendKind, GenerationParams};
use super::GenerativeBackend;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// An empty or missing key is accepted here; calls fail with a
    /// configuration error before any request goes out.
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Gemini API key not configured".into()))
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationParams> for GeminiGenerationConfig {
    fn from(params: &GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            max_output_tokens: params.max_output_tokens,
        }
    }
}

/// Response from `generateContent` (only the fields we read)
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        retry: &RetryPolicy,
    ) -> Result<String> {
        let api_key = self.api_key()?;
        let url = self.generate_url();
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: params.into(),
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini");

        let body = send_with_retry(retry, |_attempt| {
            let pending = self
                .http_client
                .post(&url)
                .header(API_KEY_HEADER, api_key)
                .json(&request)
                .send();
            async move { HttpReply::read(pending.await?).await }
        })
        .await?;

        let response: GeminiResponse = serde_json::from_str(&body)?;
        let text = response
            .into_text()
            .ok_or_else(|| Error::InvalidData("Invalid response from Gemini API".into()))?;

        debug!(response_chars = text.len(), "Gemini response received");
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };

        match self
            .http_client
            .get(format!("{}/v1beta/models/{}", self.base_url, self.model))
            .header(API_KEY_HEADER, api_key)
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
            backend: BackendKind::Gemini,
            model: self.model.clone(),
            host: self.base_url.clone(),
            has_api_key: self.api_key.is_some(),
        }
    }
}
