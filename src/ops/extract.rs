//! Extract structured data or readable text from the active page
//!
//! With an instruction the extraction is delegated to the engine. Without
//! one, the whole page text is pulled via script evaluation and cleaned up:
//! inlined stylesheet noise is dropped and `\uXXXX` escapes are decoded.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ops::{parse_args, ContentBlock};
use crate::server::AutomationContext;
use crate::{Error, Result};

const PAGE_TEXT_EXPRESSION: &str = "document.body.innerText";

#[derive(Debug, Default, Deserialize)]
struct ExtractArgs {
    #[serde(default)]
    instruction: Option<String>,
    #[serde(default)]
    schema: Option<Value>,
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "instruction": {
                "type": "string",
                "description": "What to extract; omit for the full page text"
            },
            "schema": {
                "type": "object",
                "description": "Optional JSON schema for structured extraction"
            }
        }
    })
}

pub async fn run(context: &AutomationContext, args: Value) -> Result<Vec<ContentBlock>> {
    let args: ExtractArgs = parse_args(args)?;

    let page = context
        .active_page()
        .await
        .ok_or_else(|| Error::no_active_page("session could not be resolved"))?;

    match args.instruction {
        Some(instruction) => {
            let data = page.extract(&instruction, args.schema).await?;
            Ok(vec![ContentBlock::text(serde_json::to_string(&data)?)])
        }
        None => {
            let value = page.evaluate(PAGE_TEXT_EXPRESSION).await?;
            let raw = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Ok(vec![ContentBlock::text(format!(
                "Extracted content:\n{}",
                clean_page_text(&raw)
            ))])
        }
    }
}

/// Strip stylesheet noise from page text and decode unicode escapes
pub(crate) fn clean_page_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_style_noise(line))
        .map(decode_unicode_escapes)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines that are inlined CSS rather than page content
fn is_style_noise(line: &str) -> bool {
    (line.contains('{') && line.contains('}'))
        || line.contains("@keyframes")
        || looks_like_selector_rule(line)
        || looks_like_css_declaration(line)
}

/// `.class-name {` openings
fn looks_like_selector_rule(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('.') else {
        return false;
    };
    let ident_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .count();
    if ident_len == 0 {
        return false;
    }
    rest[ident_len..].trim_start().starts_with('{')
}

/// `property: value;` lines
fn looks_like_css_declaration(line: &str) -> bool {
    let Some((property, rest)) = line.split_once(':') else {
        return false;
    };
    if property.is_empty()
        || !property
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-')
    {
        return false;
    }
    matches!(rest.find(';'), Some(i) if i >= 1)
}

/// Decode `\uXXXX` escape sequences left behind by serialized text
fn decode_unicode_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find("\\u") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];

        let hex: String = after.chars().take(4).collect();
        if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                out.push(ch);
                rest = &after[4..];
                continue;
            }
        }

        out.push_str("\\u");
        rest = after;
    }

    out.push_str(rest);
    out
}
