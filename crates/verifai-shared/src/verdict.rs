//! Verification verdict returned to clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence below this value escalates a verdict to a human reviewer.
pub const HUMAN_REVIEW_CONFIDENCE_THRESHOLD: f64 = 70.0;

/// Overall verdict status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Verified,
    Warning,
    Danger,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Verified => "verified",
            Status::Warning => "warning",
            Status::Danger => "danger",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verified" => Some(Status::Verified),
            "warning" => Some(Status::Warning),
            "danger" => Some(Status::Danger),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single sub-agent check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Success,
    Fail,
}

/// One entry of the verdict's `details` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub agent: String,
    pub finding: String,
    pub status: FindingStatus,
}

/// Normalized verdict for one `/verify` call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verification_id: String,
    pub status: Status,
    pub title: String,
    /// 0.0..=100.0
    pub confidence: f64,
    pub summary: String,
    pub details: Vec<Finding>,
    pub explanation: Option<String>,
    pub remediation: Option<String>,
    /// 0.0..=1.0 when present
    pub liveness_score: Option<f64>,
    pub spoof_detection_result: Option<String>,
    pub recommended_for_human_review: bool,
}

/// True when the verdict should be escalated: any non-verified status, or
/// confidence strictly below [`HUMAN_REVIEW_CONFIDENCE_THRESHOLD`].
pub fn requires_human_review(status: Status, confidence: f64) -> bool {
    status != Status::Verified || confidence < HUMAN_REVIEW_CONFIDENCE_THRESHOLD
}
