//! Mock backend for testing
//!
//! Replays scripted upstream replies through the real retry loop and records
//! every prompt it receives. With nothing scripted it answers with plain text,
//! which sends plan generation down the fallback path.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::transport::{send_with_retry, HttpReply, RetryPolicy};
use super::types::{BackendInfo, BackendKind, GenerationParams};
use super::GenerativeBackend;

/// Reply used when the script is empty
pub const UNSCRIPTED_REPLY: &str = "Mock backend has no scripted reply.";

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    model: String,
    script: Arc<Mutex<VecDeque<HttpReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            model: "mock".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Create a new instance with a different model name (shares the script)
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Queue a successful reply carrying `text`
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push_reply(HttpReply::new(200, text))
    }

    /// Queue an upstream failure status
    pub fn push_status(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push_reply(HttpReply::new(status, body))
    }

    fn push_reply(&self, reply: HttpReply) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Scripted replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or_default()
    }

    fn next_reply(&self) -> Result<HttpReply> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| Error::InvalidData("Failed to acquire mock script lock".into()))?;
        Ok(script
            .pop_front()
            .unwrap_or_else(|| HttpReply::new(200, UNSCRIPTED_REPLY)))
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
        retry: &RetryPolicy,
    ) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| Error::InvalidData("Failed to acquire mock prompt lock".into()))?
            .push(prompt.to_string());

        send_with_retry(retry, |_attempt| {
            let reply = self.next_reply();
            async move { reply }
        })
        .await
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: BackendKind::Mock,
            model: self.model.clone(),
            host: self.host().to_string(),
            has_api_key: false,
        }
    }
}
