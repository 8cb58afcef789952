use crate::queue::DraftQueue;
use crate::store::test_support::FlakyStore;
use crate::store::{DraftStore, KeyValueStore, MemoryStore};
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;


const KEY: &str = "offline-drafts";

/// Queue over a fresh in-memory store, plus a handle to read the store back
fn memory_queue() -> (DraftQueue, DraftStore, broadcast::Receiver<Event>) {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    queue_over(backend)
}

fn flaky_queue() -> (DraftQueue, DraftStore, Arc<FlakyStore>) {
    let flaky = Arc::new(FlakyStore::new());
    let (queue, store, _rx) = queue_over(flaky.clone());
    (queue, store, flaky)
}

fn queue_over(
    backend: Arc<dyn KeyValueStore>,
) -> (DraftQueue, DraftStore, broadcast::Receiver<Event>) {
    let store = DraftStore::new(backend, KEY);
    let (event_tx, event_rx) = broadcast::channel(100);
    (DraftQueue::new(store.clone(), event_tx), store, event_rx)
}

/// In-memory and persisted state must match after every committed mutation
async fn assert_in_lockstep(queue: &DraftQueue, store: &DraftStore) {
    assert_eq!(queue.drafts().await, store.load_all().await);
}
