//! Inbound request bodies and simple message replies.

use serde::{Deserialize, Serialize};

/// Body of `POST /verify`.
///
/// Exactly one payload field is expected, chosen by `file_type`. Image,
/// media, PDF, spreadsheet and CSV payloads are data URLs
/// (`<header>,<base64-body>`); text arrives inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub object_class: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub image_data_url: Option<String>,
    #[serde(default)]
    pub media_data_url: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    /// Free-form so unknown personas reach the general-purpose fallback.
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub verification_id: String,
    pub is_helpful: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `{"message": ...}` reply used by the info and feedback endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_optional_fields_default_to_none() {
        let req: VerificationRequest =
            serde_json::from_str(r#"{"object_class":"sneaker"}"#).unwrap();
        assert_eq!(req.object_class, "sneaker");
        assert!(req.file_type.is_none());
        assert!(req.image_data_url.is_none());
        assert!(req.media_data_url.is_none());
        assert!(req.text_content.is_none());
        assert!(req.agent_id.is_none());
    }

    #[test]
    fn test_request_requires_object_class() {
        let res: Result<VerificationRequest, _> = serde_json::from_str(r#"{"file_type":"text/plain"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_feedback_user_id_optional() {
        let fb: FeedbackRequest =
            serde_json::from_str(r#"{"verification_id":"abc","is_helpful":false}"#).unwrap();
        assert_eq!(fb.verification_id, "abc");
        assert!(!fb.is_helpful);
        assert!(fb.user_id.is_none());
    }
}
