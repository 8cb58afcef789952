use crate::error::PublishError;
use crate::publish::{PublishReceipt, PublishService};
use crate::queue::DraftQueue;
use crate::store::{DraftStore, KeyValueStore, MemoryStore};
use crate::sync::SyncCoordinator;
use crate::types::{DraftId, DraftRecord, Event};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore, broadcast};

mod auto_sync;

/// Publisher with scripted failures, call recording and an optional gate
#[derive(Default)]
struct ScriptedPublisher {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<DraftId>>,
    gate: Option<Gate>,
}

struct Gate {
    entered: Notify,
    release: Semaphore,
}

impl ScriptedPublisher {
    fn new() -> Self {
        Self::default()
    }

    fn gated() -> Self {
        Self {
            gate: Some(Gate {
                entered: Notify::new(),
                release: Semaphore::new(0),
            }),
            ..Default::default()
        }
    }

    /// Fail every draft whose content equals `content`
    fn fail_content(&self, content: &str) {
        self.failing.lock().unwrap().insert(content.to_string());
    }

    fn succeed_content(&self, content: &str) {
        self.failing.lock().unwrap().remove(content);
    }

    fn calls(&self) -> Vec<DraftId> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_entered(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.release.add_permits(n);
        }
    }
}

#[async_trait]
impl PublishService for ScriptedPublisher {
    async fn publish(&self, draft: &DraftRecord) -> Result<PublishReceipt, PublishError> {
        self.calls.lock().unwrap().push(draft.id);

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.acquire().await.unwrap().forget();
        }

        if self.failing.lock().unwrap().contains(&draft.content) {
            return Err(PublishError::Rejected {
                status: 503,
                message: format!("cannot publish {}", draft.content),
            });
        }
        Ok(PublishReceipt::with_remote_id(format!("remote-{}", draft.content)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct Harness {
    queue: Arc<DraftQueue>,
    coordinator: Arc<SyncCoordinator>,
    publisher: Arc<ScriptedPublisher>,
    events: broadcast::Receiver<Event>,
}

fn harness_with(publisher: ScriptedPublisher, backend: Arc<dyn KeyValueStore>) -> Harness {
    let (event_tx, events) = broadcast::channel(1000);
    let store = DraftStore::new(backend, "offline-drafts");
    let queue = Arc::new(DraftQueue::new(store, event_tx.clone()));
    let publisher = Arc::new(publisher);
    let coordinator = Arc::new(SyncCoordinator::new(
        queue.clone(),
        publisher.clone(),
        event_tx,
    ));
    Harness {
        queue,
        coordinator,
        publisher,
        events,
    }
}

fn harness(publisher: ScriptedPublisher) -> Harness {
    harness_with(publisher, Arc::new(MemoryStore::new()))
}
