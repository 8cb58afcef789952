//! Connectivity observation
//!
//! [`Connectivity`] holds the current [`ConnectivityStatus`] in a
//! `tokio::sync::watch` channel. The host pushes changes with
//! [`set_status`](Connectivity::set_status) / [`set_online`](Connectivity::set_online),
//! or lets [`spawn_probe`](Connectivity::spawn_probe) poll a URL. Consumers
//! call [`subscribe`](Connectivity::subscribe) and react to transitions; the
//! engine uses offline-to-online transitions as its automatic sync trigger.

use crate::config::ConnectivityConfig;
use crate::types::{ConnectionType, ConnectivityStatus};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared handle to the current connectivity status
#[derive(Clone, Debug)]
pub struct Connectivity {
    tx: Arc<watch::Sender<ConnectivityStatus>>,
}

impl Connectivity {
    /// Create an observer starting at `initial`
    pub fn new(initial: ConnectivityStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Create an observer with the initial state taken from configuration
    pub fn from_config(config: &ConnectivityConfig) -> Self {
        Self::new(ConnectivityStatus {
            online: config.assume_online,
            connection_type: None,
        })
    }

    /// Current status
    pub fn status(&self) -> ConnectivityStatus {
        *self.tx.borrow()
    }

    /// Whether the network is currently considered reachable
    pub fn is_online(&self) -> bool {
        self.tx.borrow().online
    }

    /// Replace the status; returns `true` if it changed
    ///
    /// Subscribers are only woken on an actual change.
    pub fn set_status(&self, status: ConnectivityStatus) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::info!(
                online = status.online,
                connection_type = ?status.connection_type,
                "connectivity changed"
            );
        }
        changed
    }

    /// Set the online flag, keeping the last connection type hint
    pub fn set_online(&self, online: bool) -> bool {
        let connection_type = self.status().connection_type;
        self.set_status(ConnectivityStatus {
            online,
            connection_type,
        })
    }

    /// Set online with a connection type hint
    pub fn set_connection(&self, online: bool, connection_type: ConnectionType) -> bool {
        self.set_status(ConnectivityStatus {
            online,
            connection_type: Some(connection_type),
        })
    }

    /// Receiver that observes every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.tx.subscribe()
    }

    /// Poll `config.probe_url` on `config.probe_interval`
    ///
    /// Any HTTP response counts as online; a transport error or timeout counts
    /// as offline. Returns `Ok(None)` when no probe URL is configured and a
    /// config error for a zero interval. The task stops when `cancel` fires.
    pub fn spawn_probe(
        &self,
        config: &ConnectivityConfig,
        cancel: CancellationToken,
    ) -> Result<Option<JoinHandle<()>>> {
        let Some(probe_url) = config.probe_url.clone() else {
            return Ok(None);
        };
        if config.probe_interval.is_zero() {
            return Err(Error::Config {
                message: "probe interval must be greater than zero".to_string(),
                key: Some("connectivity.probe_interval".to_string()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        let observer = self.clone();
        let period = config.probe_interval;

        tracing::info!(url = %probe_url, interval_secs = period.as_secs(), "starting connectivity probe");

        Ok(Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let online = probe(&client, &probe_url).await;
                        observer.set_online(online);
                    }
                    _ = cancel.cancelled() => {
                        tracing::debug!("connectivity probe stopped");
                        break;
                    }
                }
            }
        })))
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(ConnectivityStatus::default())
    }
}

async fn probe(client: &reqwest::Client, url: &Url) -> bool {
    match client.head(url.clone()).send().await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "connectivity probe failed");
            false
        }
    }
}
