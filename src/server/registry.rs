//! Process-wide connection registry
//!
//! Tracks every active protocol connection alongside its automation context,
//! and closes them all for shutdown. Each entry deregisters itself when its
//! transport goes away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::AutomationEngine;
use crate::resources::ScreenshotStore;
use crate::rpc::JsonRpcNotification;
use crate::server::AutomationContext;

/// One registered protocol connection
#[derive(Debug)]
pub struct Connection {
    id: u64,
    context: AutomationContext,
    shutdown_tx: watch::Sender<bool>,
}

impl Connection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn context(&self) -> &AutomationContext {
        &self.context
    }

    /// Signal observed by this connection's transport loop when the
    /// connection is closed from the server side
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Dispose this connection's sessions, then release its transport
    pub async fn close(&self) {
        self.context.close().await;
        let _ = self.shutdown_tx.send(true);
    }
}

/// Registry of every live connection
pub struct ConnectionRegistry {
    config: Config,
    engine: Arc<dyn AutomationEngine>,
    screenshots: Arc<ScreenshotStore>,
    connections: Mutex<HashMap<u64, Arc<Connection>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new(config: Config, engine: Arc<dyn AutomationEngine>) -> Self {
        Self {
            config,
            engine,
            screenshots: Arc::new(ScreenshotStore::new()),
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Screenshot store shared by every connection
    pub fn screenshots(&self) -> Arc<ScreenshotStore> {
        Arc::clone(&self.screenshots)
    }

    /// Register a new connection
    ///
    /// Returns the connection and the receiving end of its outbound
    /// notification channel, which the transport's write loop drains.
    pub async fn create(&self) -> (Arc<Connection>, mpsc::UnboundedReceiver<JsonRpcNotification>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        let context = AutomationContext::new(
            self.config.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.screenshots),
            notify_tx,
        );
        let connection = Arc::new(Connection {
            id,
            context,
            shutdown_tx,
        });

        self.connections
            .lock()
            .await
            .insert(id, Arc::clone(&connection));
        info!(connection_id = id, "Connection registered");

        (connection, notify_rx)
    }

    /// Deregister and close one connection; no-op if already gone
    pub async fn remove(&self, id: u64) {
        let removed = self.connections.lock().await.remove(&id);

        if let Some(connection) = removed {
            connection.close().await;
            info!(connection_id = id, "Connection deregistered");
        }
    }

    /// Close every registered connection concurrently
    ///
    /// Entries stay registered until their own closure finishes, so a caller
    /// that abandons this future can still see which connections were left
    /// undisposed.
    pub async fn close_all(&self) {
        let connections: Vec<Arc<Connection>> = {
            self.connections.lock().await.values().cloned().collect()
        };

        if connections.is_empty() {
            return;
        }
        info!(count = connections.len(), "Closing all connections");

        let closures = connections.into_iter().map(|connection| async move {
            connection.close().await;
            self.connections.lock().await.remove(&connection.id());
            debug!(connection_id = connection.id(), "Connection closed");
        });
        futures::future::join_all(closures).await;
    }

    /// Identifiers of every still-registered connection
    pub async fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.connections.lock().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
