//! Server command implementation

use anyhow::Result;
use wayfarer_core::WayfarerConfig;

pub async fn cmd_serve(
    mut config: WayfarerConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let backend = config.ai.backend;
    let model = config
        .ai
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| backend.default_model());

    println!("🚀 Starting Wayfarer web server...");
    println!(
        "   Listening: http://{}:{}",
        config.server.host, config.server.port
    );
    println!("   AI backend: {} ({})", backend, model);
    println!("   CORS origin: {}", config.server.allowed_origin);
    if backend.requires_api_key() && config.ai.api_key.is_none() {
        println!();
        println!("   ⚠️  GEMINI_API_KEY is not set - plan requests will fail");
    }
    println!();

    wayfarer_server::serve(&config).await
}
