use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// What to do with a completion that is not a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy {
    /// Keep the item as a degraded record: raw text as reasoning, no answer, zero confidence.
    Fallback,
    /// Drop the item with a warning.
    Skip,
}

/// Strictly decodes `raw` as a JSON object.
///
/// Fields are not validated here; `confidence::aggregate` reads them. Returns
/// `None` only under [`ParseFailurePolicy::Skip`].
pub fn parse_response(raw: &str, idx: usize, policy: ParseFailurePolicy) -> Option<Map<String, Value>> {
    let err = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(obj)) => return Some(obj),
        Ok(other) => format!("expected a JSON object, got {}", kind(&other)),
        Err(e) => e.to_string(),
    };
    match policy {
        ParseFailurePolicy::Fallback => {
            debug!(idx, error = %err, "unparseable response, keeping degraded record");
            Some(fallback_object(raw, &err))
        }
        ParseFailurePolicy::Skip => {
            warn!(idx, error = %err, "failed to parse JSON, skipping");
            None
        }
    }
}

fn fallback_object(raw: &str, err: &str) -> Map<String, Value> {
    let v = json!({
        "reasoning": raw,
        "predicted_answer": null,
        "self_confidence": 0.0,
        "internal_confidence": 0.0,
        "confidence_distribution": {},
        "parse_error": err,
    });
    match v {
        Value::Object(obj) => obj,
        _ => unreachable!("json! object literal"),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
