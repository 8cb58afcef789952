//! REST API server example
//!
//! This example shows how to run draft-sync with the REST API enabled,
//! allowing a UI process to drive the queue over HTTP.
//!
//! After starting, you can:
//! - Queue drafts via POST http://localhost:6790/drafts
//! - Report connectivity via PUT http://localhost:6790/connectivity
//! - Stream events via GET http://localhost:6790/events

use std::sync::Arc;
use draft_sync::api::start_api_server;
use draft_sync::config::{ApiConfig, Config};
use draft_sync::DraftSyncEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut config = Config {
        api: ApiConfig {
            bind_address: "127.0.0.1:6790".parse()?,
            cors_enabled: true,
            ..Default::default()
        },
        ..Default::default()
    };
    config.publish.endpoint = Some("https://api.example.com/v1/posts".parse()?);

    let engine = Arc::new(DraftSyncEngine::new(config.clone()).await?);
    let config_arc = Arc::new(config);

    println!("🚀 Starting draft-sync REST API server");
    println!("📡 API Base: http://localhost:6790");
    println!("🔄 Events stream: http://localhost:6790/events");
    println!();
    println!("Example commands:");
    println!("  # Queue a draft");
    println!("  curl -X POST http://localhost:6790/drafts \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"content\": \"hello\", \"tags\": [\"intro\"]}}'");
    println!();
    println!("  # Go online (triggers a sync pass)");
    println!("  curl -X PUT http://localhost:6790/connectivity \\");
    println!("    -H 'Content-Type: application/json' -d '{{\"online\": true}}'");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:6790/events");

    // Start the API server (runs indefinitely)
    start_api_server(engine, config_arc).await?;

    Ok(())
}
