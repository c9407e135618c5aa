//! Pluggable generative backend abstraction
//!
//! # Architecture
//!
//! - `GenerativeBackend` trait: one text-in, text-out call plus health info
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OllamaBackend`, `MockBackend`
//! - `transport`: the retry loop every HTTP backend runs its calls through
//! - `parsing`: pulling JSON plans and chat replies out of model output
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = WayfarerConfig::load(None)?;
//! let ai = AIClient::from_config(&config.ai);
//! let text = ai.generate(&prompt, &GenerationParams::plan(), &RetryPolicy::default()).await?;
//! ```

mod gemini;
mod mock;
mod ollama;
pub mod parsing;
pub mod transport;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, UNSCRIPTED_REPLY};
pub use ollama::OllamaBackend;
pub use parsing::{extract_json, parse_chat_reply, parse_trip_plan, PlanRejection};
pub use transport::{send_with_retry, HttpReply, RetryPolicy};
pub use types::*;

use async_trait::async_trait;

use crate::config::AiConfig;
use crate::error::Result;

/// Trait defining the interface for all generative backends
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send `prompt` and return the model's text, retrying per `retry`
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        retry: &RetryPolicy,
    ) -> Result<String>;

    /// Check if the backend is reachable and configured
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;

    /// Describe the backend for health output
    fn info(&self) -> BackendInfo;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (hosted)
    Gemini(GeminiBackend),
    /// Ollama (local HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Build the client selected by the `[ai]` config section
    ///
    /// Empty host or model fall back to the backend's defaults.
    pub fn from_config(config: &AiConfig) -> Self {
        let kind = config.backend;
        let host = non_empty(config.host.as_deref()).unwrap_or(kind.default_host());
        let model = non_empty(config.model.as_deref()).unwrap_or(kind.default_model());

        match kind {
            BackendKind::Gemini => {
                AIClient::Gemini(GeminiBackend::new(host, model, config.api_key.clone()))
            }
            BackendKind::Ollama => AIClient::Ollama(OllamaBackend::new(host, model)),
            BackendKind::Mock => AIClient::Mock(MockBackend::new().with_model(model)),
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, model: &str, api_key: Option<String>) -> Self {
        AIClient::Gemini(GeminiBackend::new(host, model, api_key))
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Implement GenerativeBackend for AIClient by delegating to the inner backend
#[async_trait]
impl GenerativeBackend for AIClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
        retry: &RetryPolicy,
    ) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.generate(prompt, params, retry).await,
            AIClient::Ollama(b) => b.generate(prompt, params, retry).await,
            AIClient::Mock(b) => b.generate(prompt, params, retry).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }

    fn info(&self) -> BackendInfo {
        match self {
            AIClient::Gemini(b) => b.info(),
            AIClient::Ollama(b) => b.info(),
            AIClient::Mock(b) => b.info(),
        }
    }
}
