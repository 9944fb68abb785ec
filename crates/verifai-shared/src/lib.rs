//! Shared wire types for VerifAI components.

pub mod agent;
pub mod request;
pub mod verdict;

pub use agent::AgentId;
pub use request::{FeedbackRequest, MessageResponse, VerificationRequest};
pub use verdict::{
    requires_human_review, Finding, FindingStatus, Status, VerificationResult,
    HUMAN_REVIEW_CONFIDENCE_THRESHOLD,
};
