//! Configuration management for Drover

use crate::{Error, Result};
use serde::Deserialize;
use std::env;

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Serve a single connection over stdin/stdout instead of listening
    pub stdio: bool,

    /// Base URL of the automation engine API
    pub engine_url: String,

    /// API key forwarded to the engine
    pub api_key: String,

    /// Project identifier forwarded to the engine
    pub project_id: String,

    /// Model driving act/observe/extract
    pub model: String,

    /// Model driving autonomous agent tasks
    pub agent_model: String,

    /// DOM settle timeout in milliseconds
    pub settle_timeout_ms: u64,

    /// Grace ceiling for shutdown draining, in seconds
    pub shutdown_grace_secs: u64,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8931,
            stdio: false,
            engine_url: "http://127.0.0.1:7317".to_string(),
            api_key: String::new(),
            project_id: String::new(),
            model: "claude-4-sonnet-20250514".to_string(),
            agent_model: "computer-use-preview".to_string(),
            settle_timeout_ms: 30_000,
            shutdown_grace_secs: 15,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(host) = env::var("DROVER_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("DROVER_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::configuration("Invalid DROVER_PORT"))?;
        }

        if let Ok(stdio) = env::var("DROVER_STDIO") {
            config.stdio = stdio
                .parse()
                .map_err(|_| Error::configuration("Invalid DROVER_STDIO"))?;
        }

        if let Ok(engine_url) = env::var("DROVER_ENGINE_URL") {
            config.engine_url = engine_url;
        }

        if let Ok(api_key) = env::var("DROVER_API_KEY") {
            config.api_key = api_key;
        }

        if let Ok(project_id) = env::var("DROVER_PROJECT_ID") {
            config.project_id = project_id;
        }

        if let Ok(model) = env::var("DROVER_MODEL") {
            config.model = model;
        }

        if let Ok(agent_model) = env::var("DROVER_AGENT_MODEL") {
            config.agent_model = agent_model;
        }

        if let Ok(settle) = env::var("DROVER_SETTLE_TIMEOUT") {
            config.settle_timeout_ms = settle
                .parse()
                .map_err(|_| Error::configuration("Invalid DROVER_SETTLE_TIMEOUT"))?;
        }

        if let Ok(grace) = env::var("DROVER_GRACE_SECS") {
            config.shutdown_grace_secs = grace
                .parse()
                .map_err(|_| Error::configuration("Invalid DROVER_GRACE_SECS"))?;
        }

        if let Ok(log_level) = env::var("DROVER_LOG_LEVEL") {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Socket address for the TCP listener
    pub fn listen_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(Error::Net)
    }
}
