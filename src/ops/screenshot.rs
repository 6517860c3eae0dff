//! Capture a viewport screenshot of the active page

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

use crate::ops::ContentBlock;
use crate::server::AutomationContext;
use crate::{Error, Result};

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

pub async fn run(context: &AutomationContext, _args: Value) -> Result<Vec<ContentBlock>> {
    let page = context
        .active_page()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    // Viewport only; full-page captures blow past content-size limits.
    let data = page.screenshot(false).await?;

    let encoded = BASE64.encode(&data);
    let name = context.store_screenshot(data)?;

    Ok(vec![
        ContentBlock::text(format!("Screenshot taken with name: {}", name)),
        ContentBlock::image(encoded, "image/png"),
    ])
}
