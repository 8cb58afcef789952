//! Offline queue example
//!
//! This example demonstrates the core loop of draft-sync:
//! - Creating an engine with a publish endpoint
//! - Subscribing to events
//! - Queueing drafts while offline
//! - Reporting connectivity so the queue drains automatically

use std::time::Duration;
use draft_sync::config::{Config, PublishConfig};
use draft_sync::{DraftSyncEngine, Event, NewDraft};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config {
        publish: PublishConfig {
            endpoint: Some("https://api.example.com/v1/posts".parse()?),
            auth_header: Some("Bearer your_token".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let engine = DraftSyncEngine::new(config).await?;

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::DraftAdded { id } => println!("✓ Queued draft {}", id),
                Event::SyncStarted { pending } => println!("⇪ Syncing {} draft(s)", pending),
                Event::DraftUploaded { id, remote_id } => {
                    println!("✓ Published {} as {}", id, remote_id.unwrap_or_default())
                }
                Event::DraftFailed { id, error } => println!("✗ {} failed: {}", id, error),
                Event::SyncCompleted { report } => println!(
                    "Done: {} uploaded, {} failed",
                    report.uploaded, report.failed
                ),
                _ => {}
            }
        }
    });

    // Nothing leaves the device while offline
    engine.add_draft(NewDraft::text("Notes from the train")).await?;
    engine
        .add_draft(NewDraft {
            content: "Weekend recap".to_string(),
            tags: vec!["weekend".to_string()],
            ..Default::default()
        })
        .await?;
    println!("Pending: {}", engine.stats().await.pending);

    // Back online: the auto-sync watcher runs a pass
    engine.connectivity().set_online(true);
    tokio::time::sleep(Duration::from_secs(5)).await;

    for draft in engine.drafts().await {
        println!("{} [{}] retries={}", draft.id, draft.status, draft.retry_count);
    }

    engine.shutdown().await?;
    Ok(())
}
