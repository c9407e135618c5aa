//! Wayfarer Web Server
//!
//! Axum-based REST API for the Wayfarer trip planner.
//!
//! - Trip plan generation and chat modification
//! - Budget range preview and backend health
//! - Permissive CORS headers on every response, with `OPTIONS` answered directly
//! - JSON error envelope (`{error, ...}`) for every failure

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{self, InvalidHeaderValue},
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use wayfarer_core::{GenerativeBackend, ServerSettings, TripPlanner, WayfarerConfig};

mod handlers;

/// CORS headers stamped on every response
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    pub allow_origin: HeaderValue,
    pub allow_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn new(origin: &str, headers: &[String]) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(origin)?,
            allow_headers: HeaderValue::from_str(&headers.join(", "))?,
        })
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_headers: HeaderValue::from_static(
                "authorization, x-client-info, apikey, content-type",
            ),
        }
    }
}

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub cors: CorsPolicy,
}

impl ServerConfig {
    pub fn from_settings(settings: &ServerSettings) -> anyhow::Result<Self> {
        let cors = CorsPolicy::new(&settings.allowed_origin, &settings.allowed_headers)
            .map_err(|e| anyhow::anyhow!("Invalid CORS header in [server] config: {}", e))?;
        Ok(Self { cors })
    }
}

/// Shared application state
pub struct AppState {
    pub planner: TripPlanner,
    pub config: ServerConfig,
}

/// Answer every `OPTIONS` request with an empty 200 before routing
async fn preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (StatusCode::OK, Body::empty()).into_response();
    }
    next.run(request).await
}

/// Create the application router
pub fn create_router(planner: TripPlanner, config: ServerConfig) -> Router {
    let ai = planner.ai().info();
    info!(
        backend = ai.backend.as_str(),
        model = %ai.model,
        host = %ai.host,
        "AI backend configured"
    );

    let cors = config.cors.clone();
    let state = Arc::new(AppState { planner, config });

    let api_routes = Router::new()
        .route("/generate-trip-plan", post(handlers::generate_trip_plan))
        .route("/modify-trip-plan", post(handlers::modify_trip_plan))
        .route("/budget-range", get(handlers::budget_range))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(middleware::from_fn(preflight_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            cors.allow_origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            cors.allow_headers,
        ))
}

/// Start the server described by `config`
pub async fn serve(config: &WayfarerConfig) -> anyhow::Result<()> {
    let planner = TripPlanner::from_config(config);
    let server_config = ServerConfig::from_settings(&config.server)?;
    serve_with_config(planner, &config.server.host, config.server.port, server_config).await
}

/// Start the server with an already-built planner
pub async fn serve_with_config(
    planner: TripPlanner,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection(&planner).await;

    let app = create_router(planner, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(planner: &TripPlanner) {
    let info = planner.ai().info();

    if info.backend.requires_api_key() && !info.has_api_key {
        warn!(
            backend = info.backend.as_str(),
            "⚠️  No API key configured (set GEMINI_API_KEY); plan requests will fail"
        );
        return;
    }

    if planner.ai().health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            info.host, info.model
        );
    } else {
        warn!(
            "⚠️  AI backend configured but not responding: {} (model: {})",
            info.host, info.model
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
///
/// Serializes as `{"error": message}`, plus one extra field when `detail`
/// is set (`details` for generation, `response` for chat).
pub struct AppError {
    status: StatusCode,
    message: String,
    detail: Option<(&'static str, String)>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            detail: None,
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            detail: None,
            internal: None,
        }
    }

    /// Attach an extra string field to the JSON body
    pub fn with_detail(mut self, field: &'static str, value: &str) -> Self {
        self.detail = Some((field, value.to_string()));
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let mut body = serde_json::json!({
            "error": self.message
        });
        if let Some((field, value)) = self.detail {
            body[field] = serde_json::Value::String(value);
        }

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            detail: None,
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
