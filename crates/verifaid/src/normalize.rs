//! Normalize the model's free-form reply into a validated verdict.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;
use verifai_shared::{requires_human_review, Finding, Status, VerificationResult};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Keys the model must always provide
pub const REQUIRED_FIELDS: [&str; 5] = ["status", "title", "confidence", "summary", "details"];

/// Structural problems in an otherwise parseable reply
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Why a reply could not be turned into a verdict
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("reply is not valid JSON: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        /// Unparsed reply text, for server-side logs only
        raw: String,
    },

    #[error("reply has unexpected shape: {0}")]
    Shape(#[from] ShapeError),
}

/// Strip an optional ```` ```json ```` / ```` ``` ```` wrapper.
pub fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(inner) = text.strip_prefix(FENCE_OPEN) {
        text = inner.trim();
    }
    if let Some(inner) = text.strip_suffix(FENCE_CLOSE) {
        text = inner.trim();
    }
    text
}

/// Parse and validate a reply, attaching a fresh id and the review flag.
pub fn normalize(reply: &str) -> Result<VerificationResult, NormalizeError> {
    let body = strip_code_fence(reply);
    let value: Value = serde_json::from_str(body).map_err(|source| NormalizeError::Malformed {
        source,
        raw: reply.to_string(),
    })?;
    Ok(validate(&value, Uuid::new_v4().to_string())?)
}

/// Validate parsed JSON against the verdict schema.
pub fn validate(value: &Value, verification_id: String) -> Result<VerificationResult, ShapeError> {
    let obj = value.as_object().ok_or(ShapeError::NotAnObject)?;
    if let Some(missing) = REQUIRED_FIELDS.iter().copied().find(|k| !obj.contains_key(*k)) {
        return Err(ShapeError::MissingField(missing));
    }

    let status = required_str(obj, "status")?;
    let status = Status::parse(status).ok_or_else(|| ShapeError::InvalidField {
        field: "status",
        reason: format!("expected verified, warning or danger, got '{}'", status),
    })?;
    let title = required_str(obj, "title")?.to_string();
    let summary = required_str(obj, "summary")?.to_string();
    let confidence = bounded_number(obj.get("confidence"), "confidence", 100.0)?.ok_or_else(|| {
        ShapeError::InvalidField {
            field: "confidence",
            reason: "must not be null".to_string(),
        }
    })?;
    let details = findings(&obj["details"])?;
    let liveness_score = bounded_number(obj.get("liveness_score"), "liveness_score", 1.0)?;

    Ok(VerificationResult {
        verification_id,
        status,
        title,
        confidence,
        summary,
        details,
        explanation: optional_str(obj, "explanation")?,
        remediation: optional_str(obj, "remediation")?,
        liveness_score,
        spoof_detection_result: optional_str(obj, "spoof_detection_result")?,
        recommended_for_human_review: requires_human_review(status, confidence),
    })
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ShapeError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ShapeError::InvalidField {
            field,
            reason: "expected a string".to_string(),
        })
}

fn optional_str(obj: &Map<String, Value>, field: &'static str) -> Result<Option<String>, ShapeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ShapeError::InvalidField {
            field,
            reason: "expected a string or null".to_string(),
        }),
    }
}

/// Number in `0.0..=max`, or None for absent/null.
fn bounded_number(value: Option<&Value>, field: &'static str, max: f64) -> Result<Option<f64>, ShapeError> {
    let n = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v.as_f64().ok_or_else(|| ShapeError::InvalidField {
            field,
            reason: "expected a number".to_string(),
        })?,
    };
    if !n.is_finite() || !(0.0..=max).contains(&n) {
        return Err(ShapeError::InvalidField {
            field,
            reason: format!("{} is outside 0..={}", n, max),
        });
    }
    Ok(Some(n))
}

fn findings(value: &Value) -> Result<Vec<Finding>, ShapeError> {
    let entries = value.as_array().ok_or_else(|| ShapeError::InvalidField {
        field: "details",
        reason: "expected a list".to_string(),
    })?;
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Finding::deserialize(entry).map_err(|e| ShapeError::InvalidField {
                field: "details",
                reason: format!("entry {}: {}", i, e),
            })
        })
        .collect()
}
