//! Verification gateway: decode, prompt, call the model, normalize.

use crate::agents::AgentCatalog;
use crate::config::ModelConfig;
use crate::error::GatewayError;
use crate::input::{self, InputKind};
use crate::model_client::{ModelClient, ModelError, PromptPart};
use crate::normalize;
use crate::prompts;
use std::sync::Arc;
use tracing::{debug, info, warn};
use verifai_shared::{VerificationRequest, VerificationResult};

/// Stateless request processor shared by all handlers.
pub struct Gateway {
    catalog: Arc<AgentCatalog>,
    client: Arc<dyn ModelClient>,
    model: ModelConfig,
}

impl Gateway {
    pub fn new(catalog: Arc<AgentCatalog>, client: Arc<dyn ModelClient>, model: ModelConfig) -> Self {
        Self {
            catalog,
            client,
            model,
        }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Run one verification. All-or-nothing: either a validated verdict or
    /// a classified error.
    pub async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationResult, GatewayError> {
        info!(
            object_class = %request.object_class,
            file_type = ?request.file_type,
            agent_id = ?request.agent_id,
            "Received verification request"
        );

        let agent = self.catalog.resolve(request.agent_id.as_deref());
        let kind = InputKind::classify(&request);
        debug!("Input classified as {}", kind.name());
        let decoded = input::decode(kind)?;

        let instruction =
            prompts::render_instruction(agent, &request.object_class, &decoded.label);
        let payload = decoded
            .into_part()
            .map_err(|e| GatewayError::Internal(format!("failed to encode image: {}", e)))?;
        let reply = self.invoke(prompts::assemble(instruction, payload)).await?;

        let result = normalize::normalize(&reply)?;
        info!(
            status = %result.status,
            agent = %agent.id,
            verification_id = %result.verification_id,
            "Verification successful"
        );
        Ok(result)
    }

    /// Call the model with bounded retries. Retryable failures that survive
    /// the last attempt surface as `UpstreamUnavailable`.
    async fn invoke(&self, parts: Vec<PromptPart>) -> Result<String, GatewayError> {
        let parts = Arc::new(parts);
        let max_attempts = self.model.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(Arc::clone(&parts)).await? {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = self.model.backoff_for(attempt);
                    warn!(
                        "Model attempt {}/{} failed: {} (retrying in {:?})",
                        attempt, max_attempts, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => return Err(GatewayError::UpstreamUnavailable(e)),
                Err(e) => return Err(GatewayError::Upstream(e)),
            }
        }
    }

    /// One model call on the blocking pool, bounded by the configured timeout.
    /// The outer error is reserved for worker failures.
    async fn attempt(
        &self,
        parts: Arc<Vec<PromptPart>>,
    ) -> Result<Result<String, ModelError>, GatewayError> {
        let client = Arc::clone(&self.client);
        let call = tokio::task::spawn_blocking(move || client.generate(&parts));

        match tokio::time::timeout(self.model.timeout(), call).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(GatewayError::Internal(format!("model worker failed: {}", e))),
            Err(_) => Ok(Err(ModelError::Timeout(self.model.timeout_secs))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_client::FakeModelClient;
    use crate::prompts::RESPONSE_SCHEMA_INSTRUCTION;
    use verifai_shared::Status;

    const VERDICT: &str = r#"{"status":"verified","title":"Genuine","confidence":88.0,"summary":"Looks right","details":[]}"#;

    fn model_config() -> ModelConfig {
        ModelConfig {
            max_attempts: 3,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            ..ModelConfig::default()
        }
    }

    fn gateway(client: Arc<FakeModelClient>) -> Gateway {
        Gateway::new(Arc::new(AgentCatalog::builtin()), client, model_config())
    }

    fn text_request(agent_id: Option<&str>) -> VerificationRequest {
        VerificationRequest {
            object_class: "press release".to_string(),
            file_type: Some("text/plain".to_string()),
            text_content: Some("We are pleased to announce...".to_string()),
            agent_id: agent_id.map(str::to_string),
            ..Default::default()
        }
    }

    fn first_text(parts: &[PromptPart]) -> &str {
        match &parts[0] {
            PromptPart::Text(t) => t,
            other => panic!("unexpected part: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_text_builds_three_parts() {
        let client = Arc::new(FakeModelClient::always(VERDICT));
        let result = gateway(client.clone())
            .verify(text_request(Some("text_analyzer")))
            .await
            .unwrap();
        assert_eq!(result.status, Status::Verified);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let parts = &calls[0];
        assert_eq!(parts.len(), 3);
        assert!(first_text(parts).starts_with("Analyze this text content related to a press release."));
        assert_eq!(
            parts[1],
            PromptPart::Text("We are pleased to announce...".to_string())
        );
        assert_eq!(
            parts[2],
            PromptPart::Text(RESPONSE_SCHEMA_INSTRUCTION.to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_agent_uses_general_purpose() {
        let client = Arc::new(FakeModelClient::always(VERDICT));
        gateway(client.clone())
            .verify(text_request(Some("crystal_ball")))
            .await
            .unwrap();
        let calls = client.calls();
        assert!(first_text(&calls[0]).starts_with("Analyze this text content of a press release. "));
    }

    #[tokio::test]
    async fn test_unsupported_input_skips_model() {
        let client = Arc::new(FakeModelClient::always(VERDICT));
        let req = VerificationRequest {
            object_class: "archive".to_string(),
            file_type: Some("application/zip".to_string()),
            media_data_url: Some("data:application/zip;base64,UEsDBA==".to_string()),
            ..Default::default()
        };
        let err = gateway(client.clone()).verify(req).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let client = Arc::new(FakeModelClient::new(vec![
            Err(ModelError::Transport("connection reset".to_string())),
            Err(ModelError::Status {
                code: 503,
                body: String::new(),
            }),
            Ok(VERDICT.to_string()),
        ]));
        let result = gateway(client.clone()).verify(text_request(None)).await;
        assert!(result.is_ok());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_unavailable() {
        let client = Arc::new(FakeModelClient::always_error(ModelError::Timeout(60)));
        let err = gateway(client.clone())
            .verify(text_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_not_retried() {
        let client = Arc::new(FakeModelClient::always_error(ModelError::Status {
            code: 400,
            body: "bad request".to_string(),
        }));
        let err = gateway(client.clone())
            .verify(text_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let client = Arc::new(FakeModelClient::always("Sorry, I can't help with that."));
        let err = gateway(client).verify(text_request(None)).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse { .. }));
    }
}
