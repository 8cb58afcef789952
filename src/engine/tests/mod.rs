use crate::types::Event;
use std::time::Duration;
use tokio::sync::broadcast;

mod lifecycle;

/// Wait for the first event matching `pred`
async fn wait_for_event<F>(events: &mut broadcast::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
