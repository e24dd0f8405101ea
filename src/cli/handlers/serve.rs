//! API server handlers

use crate::api::serve_api;
use crate::cli::output::*;
use crate::config::ServiceMode;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_api(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
    live: bool,
) -> Result<()> {
    // CLI arguments take priority over config
    let mut config = config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.cors |= cors;
    if live {
        config.server.mode = ServiceMode::Live;
    }

    println!("🚀 Starting teachrag API Server");
    println!("===============================\n");
    println!("📍 Address: {}", config.bind_address());
    println!(
        "🌐 CORS: {}",
        if config.server.cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    match config.server.mode {
        ServiceMode::Stub => print_info("Mode: stub (fixed responses)"),
        ServiceMode::Live => print_info("Mode: live (Pinecone + Gemini)"),
    }
    println!();

    serve_api(&config).await
}
