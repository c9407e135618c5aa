//! Test utilities for wayfarer-core
//!
//! A mock Gemini server that replays scripted replies and records what it
//! was sent, for exercising the real HTTP backend end to end.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// One scripted reply from the mock server
#[derive(Debug, Clone)]
pub enum MockGeminiReply {
    /// 200 with a single candidate carrying this text
    Text(String),
    /// Any status with a raw body
    Status(u16, String),
    /// 200 with an empty candidate list
    NoCandidates,
}

impl MockGeminiReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn status(status: u16) -> Self {
        Self::Status(status, format!("{{\"error\": {{\"code\": {}}}}}", status))
    }
}

/// A request the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub api_key: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// The prompt text sent in `contents[0].parts[0].text`
    pub fn prompt(&self) -> Option<&str> {
        self.body["contents"][0]["parts"][0]["text"].as_str()
    }
}

#[derive(Default)]
struct MockState {
    script: Mutex<VecDeque<MockGeminiReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Gemini server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port with a reply script
    pub async fn start(script: Vec<MockGeminiReply>) -> Self {
        let state = Arc::new(MockState {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        });

        // The model segment also carries the `:generateContent` action
        let app = Router::new()
            .route(
                "/v1beta/models/:model",
                get(handle_model).post(handle_generate),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Generation requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model metadata endpoint (health check)
async fn handle_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({
        "name": format!("models/{}", model),
        "displayName": "Mock Gemini",
    }))
}

/// `generateContent` endpoint
async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Path(model): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(model) = model.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, "unknown action").into_response();
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        model: model.to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let reply = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| MockGeminiReply::text("Mock Gemini has no scripted reply."));

    match reply {
        MockGeminiReply::Text(text) => Json(json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        MockGeminiReply::Status(status, body) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        MockGeminiReply::NoCandidates => Json(json!({"candidates": []})).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerationParams, GenerativeBackend, GeminiBackend, RetryPolicy};
    use crate::error::Error;

    #[tokio::test]
    async fn test_gemini_round_trip() {
        let server = MockGeminiServer::start(vec![MockGeminiReply::text("hello from gemini")]).await;
        let backend = GeminiBackend::new(&server.url(), "gemini-2.0-flash", Some("test-key".into()));

        let text = backend
            .generate("plan Goa", &GenerationParams::plan(), &RetryPolicy::no_retry())
            .await
            .unwrap();

        assert_eq!(text, "hello from gemini");
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-2.0-flash");
        assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));
        assert_eq!(requests[0].prompt(), Some("plan Goa"));
        assert_eq!(requests[0].body["generationConfig"]["topK"], 10);
        assert_eq!(requests[0].body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[tokio::test]
    async fn test_gemini_upstream_status() {
        let server = MockGeminiServer::start(vec![MockGeminiReply::status(400)]).await;
        let backend = GeminiBackend::new(&server.url(), "m", Some("k".into()));

        let err = backend
            .generate("x", &GenerationParams::chat(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upstream { status: 400, .. }));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_gemini_no_candidates_is_invalid_data() {
        let server = MockGeminiServer::start(vec![MockGeminiReply::NoCandidates]).await;
        let backend = GeminiBackend::new(&server.url(), "m", Some("k".into()));

        let err = backend
            .generate("x", &GenerationParams::plan(), &RetryPolicy::no_retry())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_gemini_health_check() {
        let server = MockGeminiServer::start(vec![]).await;
        let backend = GeminiBackend::new(&server.url(), "gemini-2.0-flash", Some("k".into()));
        assert!(backend.health_check().await);
    }
}
