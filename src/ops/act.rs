//! Perform a natural-language action on the active page

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct ActArgs {
    action: String,
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "description": "The action to perform, described in natural language"
            }
        },
        "required": ["action"]
    })
}

pub async fn run(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: ActArgs = parse_args(args)?;

    let page = context
        .active_page()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    page.act(&args.action).await?;

    Ok(vec![ContentBlock::text(format!(
        "Performed action: {}",
        args.action
    ))])
}
