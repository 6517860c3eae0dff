//! In-memory store for screenshot resources
//!
//! Screenshots captured during a server run are kept here and exposed over
//! the resource surface under `screenshot://` URIs. The store lives for the
//! whole process and is shared by every connection.

use std::collections::HashMap;
use std::sync::RwLock;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result};

/// URI scheme prefix for stored screenshots
pub const SCREENSHOT_URI_SCHEME: &str = "screenshot://";

/// A listable resource entry
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// The payload of a single resource read
#[derive(Debug, Clone, Serialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded binary data
    pub blob: String,
}

#[derive(Debug, Clone)]
struct StoredScreenshot {
    data: Vec<u8>,
    mime_type: String,
    created_at: DateTime<Utc>,
}

/// Process-wide screenshot store
#[derive(Debug, Default)]
pub struct ScreenshotStore {
    shots: RwLock<HashMap<String, StoredScreenshot>>,
}

impl ScreenshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a screenshot and return the generated resource name
    ///
    /// Names are timestamp-derived; a counter suffix is appended if two
    /// captures land on the same instant.
    pub fn insert(&self, data: Vec<u8>, mime_type: &str) -> Result<String> {
        let now = Utc::now();
        let base = format!("screenshot-{}", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"));

        let mut shots = self
            .shots
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;

        let mut name = base.clone();
        let mut suffix = 1;
        while shots.contains_key(&name) {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        shots.insert(
            name.clone(),
            StoredScreenshot {
                data,
                mime_type: mime_type.to_string(),
                created_at: now,
            },
        );

        Ok(name)
    }

    /// List every stored screenshot, oldest first
    pub fn list(&self) -> Result<Vec<ResourceDescriptor>> {
        let shots = self
            .shots
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;

        let mut entries: Vec<(&String, &StoredScreenshot)> = shots.iter().collect();
        entries.sort_by(|a, b| {
            a.1.created_at
                .cmp(&b.1.created_at)
                .then_with(|| a.0.cmp(b.0))
        });

        Ok(entries
            .into_iter()
            .map(|(name, shot)| ResourceDescriptor {
                uri: format!("{}{}", SCREENSHOT_URI_SCHEME, name),
                name: name.clone(),
                mime_type: shot.mime_type.clone(),
            })
            .collect())
    }

    /// Read one screenshot by URI (or bare name)
    pub fn read(&self, uri: &str) -> Result<ResourceContents> {
        let name = uri.strip_prefix(SCREENSHOT_URI_SCHEME).unwrap_or(uri);

        let shots = self
            .shots
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;

        let shot = shots
            .get(name)
            .ok_or_else(|| Error::resource_not_found(uri))?;

        Ok(ResourceContents {
            uri: format!("{}{}", SCREENSHOT_URI_SCHEME, name),
            mime_type: shot.mime_type.clone(),
            blob: BASE64.encode(&shot.data),
        })
    }

    /// Number of stored screenshots
    pub fn len(&self) -> usize {
        self.shots.read().map(|shots| shots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
