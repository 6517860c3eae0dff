//! Create and close browser sessions

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionArgs {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseSessionArgs {
    #[serde(default)]
    session_id: Option<String>,
}

pub(crate) fn create_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sessionId": {
                "type": "string",
                "description": "Identifier of an existing session to resume; omit to create a fresh one"
            }
        }
    })
}

pub(crate) fn close_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sessionId": {
                "type": "string",
                "description": "Identifier of the session to close; defaults to the current session"
            }
        }
    })
}

pub async fn create(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: CreateSessionArgs = parse_args(args)?;

    let session = context.create_session(args.session_id).await?;

    let mut blocks = vec![ContentBlock::text(format!(
        "Created session: {}",
        session.id()
    ))];
    if let Some(debug_url) = session.handle().debug_url() {
        blocks.push(ContentBlock::text(format!("Live debug URL: {}", debug_url)));
    }

    Ok(blocks)
}

pub async fn close(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: CloseSessionArgs = parse_args(args)?;

    let (session_id, existed) = context.close_session(args.session_id).await?;

    let text = if existed {
        format!("Closed session: {}", session_id)
    } else {
        format!("Session already closed: {}", session_id)
    };

    Ok(vec![ContentBlock::text(text)])
}
