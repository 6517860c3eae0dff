//! Run an autonomous multi-step agent task in the current session

use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::AgentOptions;
use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct AgentArgs {
    instruction: String,
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "instruction": {
                "type": "string",
                "description": "The task for the agent to carry out autonomously"
            }
        },
        "required": ["instruction"]
    })
}

pub async fn run(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: AgentArgs = parse_args(args)?;

    let session = context
        .active_session()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    let options = AgentOptions {
        model: context.config().agent_model.clone(),
        ..Default::default()
    };
    let outcome = session
        .handle()
        .execute_agent(options, &args.instruction)
        .await?;

    if !outcome.success {
        return Err(Error::engine(format!(
            "Agent task failed: {}",
            outcome.message
        )));
    }

    let mut blocks = vec![ContentBlock::text(outcome.message)];
    if !outcome.actions.is_empty() {
        blocks.push(ContentBlock::text(format!(
            "Actions taken:\n{}",
            serde_json::to_string_pretty(&outcome.actions)?
        )));
    }

    Ok(blocks)
}
