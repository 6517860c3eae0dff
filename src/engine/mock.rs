//! Mock engine implementation for testing
//!
//! Scriptable in-process stand-ins for the engine traits, used by unit and
//! integration tests to exercise lifecycle policies without a remote daemon.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::engine::traits::*;
use crate::Error;

/// Minimal 1x1 PNG header returned by mock screenshots
const MINIMAL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE,
];

/// Scriptable mock automation engine
#[derive(Debug, Default)]
pub struct MockEngine {
    created: AtomicUsize,
    fail_create: Mutex<Option<String>>,
    handles: Mutex<Vec<Arc<MockHandle>>>,
}

impl MockEngine {
    /// Create a new mock engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created so far
    pub fn created_handles(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Make the next create_handle call fail with the given message
    pub async fn fail_next_create<S: Into<String>>(&self, msg: S) {
        *self.fail_create.lock().await = Some(msg.into());
    }

    /// Every handle created so far, oldest first
    pub async fn handles(&self) -> Vec<Arc<MockHandle>> {
        self.handles.lock().await.clone()
    }

    /// The most recently created handle
    pub async fn last_handle(&self) -> Option<Arc<MockHandle>> {
        self.handles.lock().await.last().cloned()
    }
}

#[async_trait]
impl AutomationEngine for MockEngine {
    async fn create_handle(
        &self,
        options: SessionOptions,
    ) -> Result<Arc<dyn EngineHandle>, Error> {
        if let Some(msg) = self.fail_create.lock().await.take() {
            return Err(Error::engine(msg));
        }

        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        let id = options
            .resume_id
            .unwrap_or_else(|| format!("mock-session-{}", n));

        let handle = Arc::new(MockHandle::new(id));
        self.handles.lock().await.push(Arc::clone(&handle));

        Ok(handle)
    }
}

/// Scriptable mock engine session
#[derive(Debug)]
pub struct MockHandle {
    id: String,
    page: Arc<MockPage>,
    browser: Arc<MockBrowser>,
    probe_error: Mutex<Option<String>>,
    close_error: Mutex<Option<String>>,
    agent_error: Mutex<Option<String>>,
    close_hangs: AtomicBool,
    closed: Arc<AtomicBool>,
    probes: AtomicUsize,
}

impl MockHandle {
    fn new(id: String) -> Self {
        let closed = Arc::new(AtomicBool::new(false));

        Self {
            id,
            page: Arc::new(MockPage::new()),
            browser: Arc::new(MockBrowser {
                closed: Arc::clone(&closed),
            }),
            probe_error: Mutex::new(None),
            close_error: Mutex::new(None),
            agent_error: Mutex::new(None),
            close_hangs: AtomicBool::new(false),
            closed,
            probes: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent probe fail with the given message
    pub async fn set_probe_error<S: Into<String>>(&self, msg: S) {
        *self.probe_error.lock().await = Some(msg.into());
    }

    /// Make close fail with the given message
    pub async fn set_close_error<S: Into<String>>(&self, msg: S) {
        *self.close_error.lock().await = Some(msg.into());
    }

    /// Make agent execution fail with the given message
    pub async fn set_agent_error<S: Into<String>>(&self, msg: S) {
        *self.agent_error.lock().await = Some(msg.into());
    }

    /// Make close suspend forever
    pub fn set_close_hangs(&self) {
        self.close_hangs.store(true, Ordering::Relaxed);
    }

    /// Whether close completed on this handle
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Number of probes performed against this handle
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Typed page accessor for scripting page behavior
    pub fn mock_page(&self) -> Arc<MockPage> {
        Arc::clone(&self.page)
    }
}

#[async_trait]
impl EngineHandle for MockHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn debug_url(&self) -> Option<String> {
        Some(format!("https://engine.local/sessions/{}", self.id))
    }

    async fn probe(&self) -> Result<(), Error> {
        self.probes.fetch_add(1, Ordering::Relaxed);

        if let Some(msg) = self.probe_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }
        Ok(())
    }

    fn page(&self) -> Arc<dyn PageHandle> {
        Arc::clone(&self.page) as Arc<dyn PageHandle>
    }

    fn browser(&self) -> Arc<dyn BrowserHandle> {
        Arc::clone(&self.browser) as Arc<dyn BrowserHandle>
    }

    async fn execute_agent(
        &self,
        _options: AgentOptions,
        instruction: &str,
    ) -> Result<AgentOutcome, Error> {
        if let Some(msg) = self.agent_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }

        Ok(AgentOutcome {
            success: true,
            message: format!("completed: {}", instruction),
            actions: vec![json!({ "type": "act", "action": "click" })],
        })
    }

    async fn close(&self) -> Result<(), Error> {
        if self.close_hangs.load(Ordering::Relaxed) {
            std::future::pending::<()>().await;
        }

        if let Some(msg) = self.close_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }

        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Scriptable mock page
#[derive(Debug)]
pub struct MockPage {
    navigations: Mutex<Vec<String>>,
    actions: Mutex<Vec<String>>,
    evaluations: Mutex<Vec<String>>,
    goto_error: Mutex<Option<String>>,
    act_error: Mutex<Option<String>>,
    screenshot_error: Mutex<Option<String>>,
    evaluate_result: Mutex<Value>,
    extract_result: Mutex<Value>,
    observations: Mutex<Vec<Observation>>,
    settles: AtomicUsize,
}

impl MockPage {
    fn new() -> Self {
        Self {
            navigations: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            evaluations: Mutex::new(Vec::new()),
            goto_error: Mutex::new(None),
            act_error: Mutex::new(None),
            screenshot_error: Mutex::new(None),
            evaluate_result: Mutex::new(json!("Mock Title")),
            extract_result: Mutex::new(json!({})),
            observations: Mutex::new(vec![Observation {
                selector: "#main button".to_string(),
                description: "Primary action button".to_string(),
                method: Some("click".to_string()),
            }]),
            settles: AtomicUsize::new(0),
        }
    }

    /// URLs navigated to, oldest first
    pub async fn navigations(&self) -> Vec<String> {
        self.navigations.lock().await.clone()
    }

    /// Actions performed, oldest first
    pub async fn actions(&self) -> Vec<String> {
        self.actions.lock().await.clone()
    }

    /// Expressions evaluated, oldest first
    pub async fn evaluations(&self) -> Vec<String> {
        self.evaluations.lock().await.clone()
    }

    /// Number of settle waits performed
    pub fn settle_count(&self) -> usize {
        self.settles.load(Ordering::Relaxed)
    }

    /// Make every subsequent goto fail with the given message
    pub async fn set_goto_error<S: Into<String>>(&self, msg: S) {
        *self.goto_error.lock().await = Some(msg.into());
    }

    /// Make every subsequent act fail with the given message
    pub async fn set_act_error<S: Into<String>>(&self, msg: S) {
        *self.act_error.lock().await = Some(msg.into());
    }

    /// Make every subsequent screenshot fail with the given message
    pub async fn set_screenshot_error<S: Into<String>>(&self, msg: S) {
        *self.screenshot_error.lock().await = Some(msg.into());
    }

    /// Set the value returned by evaluate
    pub async fn set_evaluate_result(&self, value: Value) {
        *self.evaluate_result.lock().await = value;
    }

    /// Set the value returned by extract
    pub async fn set_extract_result(&self, value: Value) {
        *self.extract_result.lock().await = value;
    }

    /// Set the observations returned by observe
    pub async fn set_observations(&self, observations: Vec<Observation>) {
        *self.observations.lock().await = observations;
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageHandle for MockPage {
    async fn goto(&self, url: &str, _wait_until: LoadState) -> Result<(), Error> {
        if let Some(msg) = self.goto_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }

        self.navigations.lock().await.push(url.to_string());
        Ok(())
    }

    async fn act(&self, action: &str) -> Result<ActionOutcome, Error> {
        if let Some(msg) = self.act_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }

        self.actions.lock().await.push(action.to_string());
        Ok(ActionOutcome {
            message: format!("performed: {}", action),
        })
    }

    async fn observe(
        &self,
        _instruction: &str,
        _return_action: bool,
    ) -> Result<Vec<Observation>, Error> {
        Ok(self.observations.lock().await.clone())
    }

    async fn extract(&self, _instruction: &str, _schema: Option<Value>) -> Result<Value, Error> {
        Ok(self.extract_result.lock().await.clone())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, Error> {
        self.evaluations.lock().await.push(expression.to_string());
        Ok(self.evaluate_result.lock().await.clone())
    }

    async fn screenshot(&self, _full_page: bool) -> Result<Vec<u8>, Error> {
        if let Some(msg) = self.screenshot_error.lock().await.clone() {
            return Err(Error::engine(msg));
        }

        Ok(MINIMAL_PNG.to_vec())
    }

    async fn wait_for_settle(&self) -> Result<(), Error> {
        self.settles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Mock browser view
#[derive(Debug)]
pub struct MockBrowser {
    closed: Arc<AtomicBool>,
}

impl BrowserHandle for MockBrowser {
    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }
}
