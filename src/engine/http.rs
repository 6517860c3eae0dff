//! HTTP binding to the automation engine API
//!
//! The engine is a remote daemon speaking JSON over HTTP. Every session-scoped
//! call maps to `POST {base}/v1/sessions/{id}/{verb}`; non-2xx responses carry
//! a `{message}` body that is surfaced verbatim so dead-session signatures
//! pass through intact.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::engine::traits::*;
use crate::{Error, Result};

/// HTTP client for a remote automation engine daemon
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    project_id: String,
}

impl HttpEngine {
    /// Create a new engine client
    pub fn new(engine_url: &str, api_key: &str, project_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: engine_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            project_id: project_id.to_string(),
        })
    }

    /// Create a new engine client from gateway configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.engine_url, &config.api_key, &config.project_id)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("x-api-key", &self.api_key)
            .header("x-project-id", &self.project_id)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .delete(self.endpoint(path))
            .header("x-api-key", &self.api_key)
            .header("x-project-id", &self.project_id)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("engine returned HTTP {}", status.as_u16()));

        Err(Error::engine(message))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
    #[serde(default)]
    debug_url: Option<String>,
}

#[async_trait]
impl AutomationEngine for HttpEngine {
    async fn create_handle(
        &self,
        options: SessionOptions,
    ) -> Result<Arc<dyn EngineHandle>> {
        let mut body = json!({
            "model": options.model,
            "settle_timeout_ms": options.settle_timeout_ms,
        });
        if let Some(resume) = &options.resume_id {
            body["session_id"] = json!(resume);
        }

        let value = self.post_json("sessions", &body).await?;
        let created: CreatedSession = serde_json::from_value(value)?;

        debug!(session_id = %created.id, "Engine session created");

        Ok(Arc::new(HttpEngineHandle::new(
            self.clone(),
            created,
            options.settle_timeout_ms,
        )))
    }
}

/// One live engine session over HTTP
#[derive(Debug)]
pub struct HttpEngineHandle {
    engine: HttpEngine,
    id: String,
    debug_url: Option<String>,
    page: Arc<HttpPage>,
    browser: Arc<HttpBrowser>,
    closed: Arc<AtomicBool>,
}

impl HttpEngineHandle {
    fn new(engine: HttpEngine, created: CreatedSession, settle_timeout_ms: u64) -> Self {
        let closed = Arc::new(AtomicBool::new(false));

        Self {
            page: Arc::new(HttpPage {
                engine: engine.clone(),
                session_id: created.id.clone(),
                settle_timeout_ms,
            }),
            browser: Arc::new(HttpBrowser {
                closed: Arc::clone(&closed),
            }),
            engine,
            id: created.id,
            debug_url: created.debug_url,
            closed,
        }
    }
}

#[async_trait]
impl EngineHandle for HttpEngineHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn debug_url(&self) -> Option<String> {
        self.debug_url.clone()
    }

    async fn probe(&self) -> Result<()> {
        self.page.evaluate(PROBE_EXPRESSION).await.map(|_| ())
    }

    fn page(&self) -> Arc<dyn PageHandle> {
        Arc::clone(&self.page) as Arc<dyn PageHandle>
    }

    fn browser(&self) -> Arc<dyn BrowserHandle> {
        Arc::clone(&self.browser) as Arc<dyn BrowserHandle>
    }

    async fn execute_agent(
        &self,
        options: AgentOptions,
        instruction: &str,
    ) -> Result<AgentOutcome> {
        let body = json!({
            "instruction": instruction,
            "model": options.model,
            "max_steps": options.max_steps,
        });

        let value = self
            .engine
            .post_json(&format!("sessions/{}/agent", self.id), &body)
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    async fn close(&self) -> Result<()> {
        self.engine.delete(&format!("sessions/{}", self.id)).await?;
        self.closed.store(true, Ordering::Relaxed);

        debug!(session_id = %self.id, "Engine session closed");
        Ok(())
    }
}

/// Page operations for one HTTP engine session
#[derive(Debug)]
pub struct HttpPage {
    engine: HttpEngine,
    session_id: String,
    settle_timeout_ms: u64,
}

impl HttpPage {
    fn path(&self, verb: &str) -> String {
        format!("sessions/{}/{}", self.session_id, verb)
    }
}

#[derive(Debug, Deserialize)]
struct ActResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ObserveResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct ScreenshotResponse {
    data: String,
}

#[async_trait]
impl PageHandle for HttpPage {
    async fn goto(&self, url: &str, wait_until: LoadState) -> Result<()> {
        let body = json!({ "url": url, "wait_until": wait_until.as_str() });
        self.engine.post_json(&self.path("navigate"), &body).await?;
        Ok(())
    }

    async fn act(&self, action: &str) -> Result<ActionOutcome> {
        let body = json!({ "action": action });
        let value = self.engine.post_json(&self.path("act"), &body).await?;
        let parsed: ActResponse = serde_json::from_value(value)?;

        Ok(ActionOutcome {
            message: parsed.message,
        })
    }

    async fn observe(
        &self,
        instruction: &str,
        return_action: bool,
    ) -> Result<Vec<Observation>> {
        let body = json!({ "instruction": instruction, "return_action": return_action });
        let value = self.engine.post_json(&self.path("observe"), &body).await?;
        let parsed: ObserveResponse = serde_json::from_value(value)?;

        Ok(parsed.observations)
    }

    async fn extract(&self, instruction: &str, schema: Option<Value>) -> Result<Value> {
        let mut body = json!({ "instruction": instruction });
        if let Some(schema) = schema {
            body["schema"] = schema;
        }

        let mut value = self.engine.post_json(&self.path("extract"), &body).await?;
        Ok(value
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let body = json!({ "expression": expression });
        let mut value = self.engine.post_json(&self.path("evaluate"), &body).await?;

        Ok(value
            .get_mut("value")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>> {
        let body = json!({ "full_page": full_page });
        let value = self.engine.post_json(&self.path("screenshot"), &body).await?;
        let parsed: ScreenshotResponse = serde_json::from_value(value)?;

        BASE64
            .decode(parsed.data.as_bytes())
            .map_err(|e| Error::engine(format!("invalid screenshot payload: {}", e)))
    }

    async fn wait_for_settle(&self) -> Result<()> {
        let body = json!({ "timeout_ms": self.settle_timeout_ms });
        self.engine.post_json(&self.path("settle"), &body).await?;
        Ok(())
    }
}

/// Browser-level view of one HTTP engine session
#[derive(Debug)]
pub struct HttpBrowser {
    closed: Arc<AtomicBool>,
}

impl BrowserHandle for HttpBrowser {
    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }
}
