//! Session registry implementation
//!
//! Caches live automation handles by session identifier: creates them on
//! first use, health-checks them on reuse, heals recognized dead sessions
//! transparently, and disposes them explicitly.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::engine::{AutomationEngine, EngineHandle, SessionOptions};
use crate::Result;

/// Well-known identifier for the implicit default session
pub const DEFAULT_SESSION_ID: &str = "default";

/// One live, addressable automation session
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    handle: Arc<dyn EngineHandle>,
}

impl Session {
    /// Session identifier (the registry key, not the engine-side id)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The live engine handle
    pub fn handle(&self) -> Arc<dyn EngineHandle> {
        Arc::clone(&self.handle)
    }
}

/// Registry of live sessions owned by one connection
///
/// All mutation happens under a single async lock so that an identifier can
/// never map to two live handles, even when callers race.
#[derive(Debug)]
pub struct SessionRegistry {
    engine: Arc<dyn AutomationEngine>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// Create a new registry backed by the given engine
    pub fn new(engine: Arc<dyn AutomationEngine>) -> Self {
        Self {
            engine,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return a live, health-checked handle for `session_id`, creating it if
    /// absent.
    ///
    /// An existing handle is probed first; a probe failure carrying a
    /// recognized dead-session signature discards the handle and creates a
    /// replacement under the same identifier. Any other probe failure is
    /// returned to the caller unchanged.
    #[instrument(skip(self, options))]
    pub async fn acquire(&self, session_id: &str, options: SessionOptions) -> Result<Session> {
        let mut sessions = self.sessions.lock().await;

        if let Some(existing) = sessions.get(session_id) {
            match existing.handle.probe().await {
                Ok(()) => {
                    debug!(session_id = %session_id, "Reusing live session");
                    return Ok(existing.clone());
                }
                Err(e) if e.is_session_terminated() => {
                    warn!(
                        session_id = %session_id,
                        error = %e,
                        "Session died underneath its handle, recreating"
                    );
                    if let Some(dead) = sessions.remove(session_id) {
                        if let Err(close_err) = dead.handle.close().await {
                            debug!(
                                session_id = %session_id,
                                error = %close_err,
                                "Discarding dead handle failed"
                            );
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let handle = self.engine.create_handle(options).await?;
        let session = Session {
            id: session_id.to_string(),
            handle,
        };
        sessions.insert(session_id.to_string(), session.clone());

        info!(
            session_id = %session_id,
            engine_session = %session.handle.id(),
            "Session created"
        );

        Ok(session)
    }

    /// Return the handle for `session_id` without creating one
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    /// Dispose the session for `session_id`, if present
    ///
    /// Idempotent. Disposal failures are logged and swallowed so a wedged
    /// remote never blocks sibling cleanup. Returns whether a session existed.
    pub async fn release(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(session_id);

        match removed {
            Some(session) => {
                if let Err(e) = session.handle.close().await {
                    warn!(session_id = %session_id, error = %e, "Session disposal failed");
                }
                info!(session_id = %session_id, "Session released");
                true
            }
            None => false,
        }
    }

    /// Dispose every session, concurrently
    ///
    /// Each disposal is independent: one failure never prevents the others.
    pub async fn release_all(&self) {
        let sessions: Vec<Session> = {
            let mut map = self.sessions.lock().await;
            map.drain().map(|(_, session)| session).collect()
        };

        if sessions.is_empty() {
            return;
        }

        let disposals = sessions.into_iter().map(|session| async move {
            if let Err(e) = session.handle.close().await {
                warn!(session_id = %session.id, error = %e, "Session disposal failed");
            }
        });

        futures::future::join_all(disposals).await;
    }

    /// Identifiers of every live session
    pub async fn ids(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = SessionRegistry::new(Arc::new(MockEngine::new()));
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_acquire_creates_on_first_use() {
        let engine = Arc::new(MockEngine::new());
        let registry = SessionRegistry::new(Arc::clone(&engine) as _);

        let session = registry
            .acquire(DEFAULT_SESSION_ID, SessionOptions::default())
            .await
            .unwrap();

        assert_eq!(session.id(), DEFAULT_SESSION_ID);
        assert_eq!(engine.created_handles(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        let engine = Arc::new(MockEngine::new());
        let registry = SessionRegistry::new(Arc::clone(&engine) as _);

        assert!(registry.get(DEFAULT_SESSION_ID).await.is_none());
        assert_eq!(engine.created_handles(), 0);
    }

    #[tokio::test]
    async fn test_ids_lists_live_sessions() {
        let registry = SessionRegistry::new(Arc::new(MockEngine::new()));

        registry
            .acquire("a", SessionOptions::default())
            .await
            .unwrap();
        registry
            .acquire("b", SessionOptions::default())
            .await
            .unwrap();

        let mut ids = registry.ids().await;
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
