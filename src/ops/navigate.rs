//! Navigate the active page to a URL

use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::LoadState;
use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct NavigateArgs {
    url: String,
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "description": "The URL to navigate to"
            }
        },
        "required": ["url"]
    })
}

pub async fn run(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: NavigateArgs = parse_args(args)?;

    let session = context
        .active_session()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    session
        .handle()
        .page()
        .goto(&args.url, LoadState::DomContentLoaded)
        .await?;

    let mut blocks = vec![ContentBlock::text(format!("Navigated to: {}", args.url))];
    if let Some(debug_url) = session.handle().debug_url() {
        blocks.push(ContentBlock::text(format!("Live debug URL: {}", debug_url)));
    }

    Ok(blocks)
}
