//! Payload parsing and schema validation for inference output.
//!
//! Models frequently wrap their JSON in Markdown code fences or lead with
//! prose; extraction tolerates that, but the JSON itself must satisfy the
//! step/verdict schema exactly. An unrecognized action is an `InvalidAction`
//! error, not a default.

use serde_json::Value;

use crate::domain::{Action, StepResult, Verdict};
use crate::error::{ArgusError, Result};

/// Pull the first JSON object out of a model reply.
///
/// Handles three shapes: a bare JSON object, a fenced ```json block, and
/// prose with an embedded object. Returns the candidate substring.
pub fn extract_json(text: &str) -> Result<&str> {
    let trimmed = text.trim();

    // Fenced block: take what's between the first fence pair
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if !inner.is_empty() {
                return Ok(inner);
            }
        }
    }

    // Bare or embedded object: slice from first '{' to last '}'
    let start = trimmed
        .find('{')
        .ok_or_else(|| ArgusError::MalformedResponse("no JSON object in payload".to_string()))?;
    let end = trimmed
        .rfind('}')
        .ok_or_else(|| ArgusError::MalformedResponse("unterminated JSON object".to_string()))?;
    if end < start {
        return Err(ArgusError::MalformedResponse(
            "unterminated JSON object".to_string(),
        ));
    }
    Ok(&trimmed[start..=end])
}

/// Parse a model reply into a StepResult, keeping the original payload for
/// audit.
pub fn parse_step(text: &str) -> Result<StepResult> {
    let json = extract_json(text)?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ArgusError::MalformedResponse(format!("step payload is not JSON: {}", e)))?;

    // Validate the action eagerly so an out-of-set value surfaces as
    // InvalidAction rather than a generic deserialization failure.
    let action_str = value
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ArgusError::MalformedResponse("step payload missing 'action'".to_string()))?;
    let _: Action = action_str.parse()?;

    let mut step: StepResult = serde_json::from_value(value)
        .map_err(|e| ArgusError::MalformedResponse(format!("step schema violation: {}", e)))?;
    step.raw_response = text.to_string();
    Ok(step)
}

/// Parse a model reply into a Verdict.
pub fn parse_verdict(text: &str) -> Result<Verdict> {
    let json = extract_json(text)?;
    let value: Value = serde_json::from_str(json).map_err(|e| {
        ArgusError::MalformedResponse(format!("verdict payload is not JSON: {}", e))
    })?;
    serde_json::from_value(value)
        .map_err(|e| ArgusError::MalformedResponse(format!("verdict schema violation: {}", e)))
}
