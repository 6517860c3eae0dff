//! Per-connection automation context
//!
//! One context exists per protocol connection. It owns that connection's
//! sessions, tracks which one is current, and is the single entry point the
//! transport uses to dispatch operations. Delegated-engine failures are
//! normalized into the uniform result envelope here; only protocol faults
//! (unknown operation, malformed arguments) escape as errors.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{AutomationEngine, BrowserHandle, PageHandle, SessionOptions};
use crate::ops::{self, ResultEnvelope};
use crate::resources::ScreenshotStore;
use crate::rpc::JsonRpcNotification;
use crate::session::{Session, SessionRegistry, DEFAULT_SESSION_ID};
use crate::{Error, Result};

pub struct AutomationContext {
    config: Config,
    sessions: SessionRegistry,
    current_session_id: RwLock<String>,
    screenshots: Arc<ScreenshotStore>,
    notifier: mpsc::UnboundedSender<JsonRpcNotification>,
}

impl AutomationContext {
    pub fn new(
        config: Config,
        engine: Arc<dyn AutomationEngine>,
        screenshots: Arc<ScreenshotStore>,
        notifier: mpsc::UnboundedSender<JsonRpcNotification>,
    ) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(engine),
            current_session_id: RwLock::new(DEFAULT_SESSION_ID.to_string()),
            screenshots,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn screenshots(&self) -> &ScreenshotStore {
        &self.screenshots
    }

    /// Identifier the next session-scoped operation will run against
    pub fn current_session_id(&self) -> Result<String> {
        Ok(self
            .current_session_id
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .clone())
    }

    fn set_current_session_id(&self, session_id: &str) -> Result<()> {
        *self
            .current_session_id
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))? =
            session_id.to_string();
        Ok(())
    }

    fn session_options(&self, resume_id: Option<String>) -> SessionOptions {
        SessionOptions {
            resume_id,
            model: self.config.model.clone(),
            settle_timeout_ms: self.config.settle_timeout_ms,
        }
    }

    /// Resolve the current session, creating it on demand
    ///
    /// Never fails: creation problems are logged and reported as `None` so
    /// callers treat a missing session as a request-level condition.
    pub async fn active_session(&self) -> Option<Session> {
        let session_id = match self.current_session_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Current session pointer unavailable");
                return None;
            }
        };

        match self
            .sessions
            .acquire(&session_id, self.session_options(None))
            .await
        {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to resolve active session");
                None
            }
        }
    }

    /// Page of the current session, creating the session on demand
    pub async fn active_page(&self) -> Option<Arc<dyn PageHandle>> {
        self.active_session()
            .await
            .map(|session| session.handle().page())
    }

    /// Page of the current session if one already exists; never creates
    pub async fn active_page_readonly(&self) -> Option<Arc<dyn PageHandle>> {
        let session_id = self.current_session_id().ok()?;
        self.sessions
            .get(&session_id)
            .await
            .map(|session| session.handle().page())
    }

    /// Browser of the current session if one already exists; never creates
    pub async fn active_browser_readonly(&self) -> Option<Arc<dyn BrowserHandle>> {
        let session_id = self.current_session_id().ok()?;
        self.sessions
            .get(&session_id)
            .await
            .map(|session| session.handle().browser())
    }

    /// Create (or resume) a session and make it current
    pub async fn create_session(&self, requested: Option<String>) -> Result<Session> {
        let session_id = requested
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let session = self
            .sessions
            .acquire(&session_id, self.session_options(requested))
            .await?;
        self.set_current_session_id(&session_id)?;

        Ok(session)
    }

    /// Close the named session, defaulting to the current one
    ///
    /// Idempotent. Returns the resolved identifier and whether a session was
    /// actually open. Closing the current session resets the pointer to the
    /// default identifier.
    pub async fn close_session(&self, requested: Option<String>) -> Result<(String, bool)> {
        let session_id = match requested {
            Some(id) => id,
            None => self.current_session_id()?,
        };

        let existed = self.sessions.release(&session_id).await;

        if self.current_session_id()? == session_id {
            self.set_current_session_id(DEFAULT_SESSION_ID)?;
        }

        Ok((session_id, existed))
    }

    /// Store a screenshot artifact and announce it on the notification
    /// channel
    pub fn store_screenshot(&self, data: Vec<u8>) -> Result<String> {
        let name = self.screenshots.insert(data, "image/png")?;
        self.notify_resources_changed();
        Ok(name)
    }

    fn notify_resources_changed(&self) {
        let notification = JsonRpcNotification::new("notifications/resources/list_changed");
        if self.notifier.send(notification).is_err() {
            debug!("Notification channel closed, dropping resource update");
        }
    }

    /// Dispatch one operation call
    ///
    /// `Err` is reserved for protocol faults. Engine and no-active-page
    /// failures come back as `Ok` envelopes with `isError: true`.
    pub async fn run(&self, name: &str, args: Value) -> Result<ResultEnvelope> {
        let Some(spec) = ops::lookup(name) else {
            warn!(operation = %name, "Rejecting unknown operation");
            return Err(Error::unknown_operation(name));
        };

        let session_id = self.current_session_id()?;
        info!(
            operation = %name,
            session_id = %session_id,
            kind = ?spec.kind,
            "Dispatching operation"
        );

        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args
        };

        match (spec.handler)(self, args).await {
            Ok(content) => {
                if spec.settle_after {
                    self.settle_active_page().await;
                }
                if spec.snapshot_after {
                    self.snapshot_active_page().await;
                }
                info!(operation = %name, "Operation succeeded");
                Ok(ResultEnvelope::success(content))
            }
            Err(e) if e.is_protocol_fault() => {
                warn!(operation = %name, error = %e, "Operation rejected");
                Err(e)
            }
            Err(e) => {
                warn!(operation = %name, error = %e, "Operation failed");
                Ok(ResultEnvelope::failure(e.to_string()))
            }
        }
    }

    /// Dispose every session this context owns
    pub async fn close(&self) {
        info!("Closing automation context");
        self.sessions.release_all().await;
    }

    async fn settle_active_page(&self) {
        let Some(page) = self.active_page_readonly().await else {
            return;
        };
        if let Err(e) = page.wait_for_settle().await {
            debug!(error = %e, "Post-action settle wait failed");
        }
    }

    async fn snapshot_active_page(&self) {
        let Some(page) = self.active_page_readonly().await else {
            return;
        };
        match page.screenshot(false).await {
            Ok(data) => {
                if let Err(e) = self.store_screenshot(data) {
                    debug!(error = %e, "Post-action snapshot could not be stored");
                }
            }
            Err(e) => debug!(error = %e, "Post-action snapshot failed"),
        }
    }
}

impl std::fmt::Debug for AutomationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationContext")
            .field("current_session_id", &self.current_session_id)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
