//! Turns a parsed completion into the three stored confidence signals.
//!
//! `self_eval_confidence` and `internal_based_confidence` are read straight
//! from the object. `logit_based_confidence` is derived from the elicited
//! distribution, either as its maximum or as the mass on the predicted label.
//! The two differ whenever the model predicts something other than its own
//! most likely label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoercionError;
use crate::types::{Confidence, ModelResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogitDerivation {
    /// Highest probability in the distribution, whatever the prediction.
    MaxProbability,
    /// Probability assigned to the predicted label; 0.0 when missing.
    PredictedLabel,
}

/// The stored confidence signals, by their record field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceField {
    SelfEvalConfidence,
    LogitBasedConfidence,
    InternalBasedConfidence,
}

impl ConfidenceField {
    pub const ALL: [ConfidenceField; 3] = [
        ConfidenceField::SelfEvalConfidence,
        ConfidenceField::LogitBasedConfidence,
        ConfidenceField::InternalBasedConfidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceField::SelfEvalConfidence => "self_eval_confidence",
            ConfidenceField::LogitBasedConfidence => "logit_based_confidence",
            ConfidenceField::InternalBasedConfidence => "internal_based_confidence",
        }
    }

    pub fn read(&self, c: &Confidence) -> f64 {
        match self {
            ConfidenceField::SelfEvalConfidence => c.self_eval_confidence,
            ConfidenceField::LogitBasedConfidence => c.logit_based_confidence,
            ConfidenceField::InternalBasedConfidence => c.internal_based_confidence,
        }
    }
}

impl std::fmt::Display for ConfidenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Builds the stored response from a parsed completion object.
///
/// A confidence field that is present but not numeric fails the whole item.
pub fn aggregate(parsed: &Map<String, Value>, derivation: LogitDerivation) -> Result<ModelResponse, CoercionError> {
    let predicted_answer = match parsed.get("predicted_answer") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    let self_conf = float_field(parsed, "self_confidence")?;
    let internal_conf = float_field(parsed, "internal_confidence")?;
    let dist = distribution(parsed)?;

    let logit_based = match derivation {
        LogitDerivation::MaxProbability => dist.values().copied().reduce(f64::max).unwrap_or(0.0),
        LogitDerivation::PredictedLabel => predicted_answer
            .as_deref()
            .and_then(|label| dist.get(label).copied())
            .unwrap_or(0.0),
    };

    Ok(ModelResponse {
        reasoning: parsed.get("reasoning").and_then(Value::as_str).unwrap_or_default().to_string(),
        predicted_answer,
        confidence: Confidence {
            self_eval_confidence: round3(self_conf),
            logit_based_confidence: round3(logit_based),
            internal_based_confidence: round3(internal_conf),
        },
        confidence_distribution: dist,
        parse_error: parsed.get("parse_error").and_then(Value::as_str).map(str::to_string),
    })
}

fn float_field(parsed: &Map<String, Value>, field: &str) -> Result<f64, CoercionError> {
    match parsed.get(field) {
        None => Ok(0.0),
        Some(v) => coerce_f64(v).ok_or_else(|| CoercionError::NotNumeric { field: field.to_string(), value: v.to_string() }),
    }
}

/// Numbers as-is, numeric strings parsed, booleans as 1/0. Null is not a number,
/// and neither are NaN or infinities: they cannot be stored as JSON.
fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

fn distribution(parsed: &Map<String, Value>) -> Result<BTreeMap<String, f64>, CoercionError> {
    let obj = match parsed.get("confidence_distribution") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(obj)) => obj,
        Some(other) => return Err(CoercionError::DistributionShape(other.to_string())),
    };
    obj.iter()
        .map(|(label, v)| {
            coerce_f64(v).map(|p| (label.clone(), p)).ok_or_else(|| CoercionError::NotNumeric {
                field: format!("confidence_distribution.{label}"),
                value: v.to_string(),
            })
        })
        .collect()
}
