//! Find candidate elements and actions on the active page

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObserveArgs {
    instruction: String,
    #[serde(default = "default_return_action")]
    return_action: bool,
}

fn default_return_action() -> bool {
    true
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "instruction": {
                "type": "string",
                "description": "What to look for on the page"
            },
            "returnAction": {
                "type": "boolean",
                "description": "Include a suggested action per element",
                "default": true
            }
        },
        "required": ["instruction"]
    })
}

pub async fn run(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: ObserveArgs = parse_args(args)?;

    let page = context
        .active_page()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    let observations = page.observe(&args.instruction, args.return_action).await?;

    Ok(vec![ContentBlock::text(serde_json::to_string(
        &observations,
    )?)])
}
