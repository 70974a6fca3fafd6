//! Model-backed field inference.

use std::sync::Arc;

use planroom_llm::{EngineAvailability, LlmBackend, LlmError, LlmRequest, Message};
use tracing::{info, instrument, warn};

use crate::config::ExtractionConfig;
use crate::fields::RawModelFields;
use crate::prompt::{build_prompt, extraction_text};
use crate::repair::repair;

pub struct InferenceEngine {
    backend: Arc<dyn LlmBackend>,
    availability: Arc<EngineAvailability>,
    config: ExtractionConfig,
}

impl InferenceEngine {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        availability: Arc<EngineAvailability>,
        config: ExtractionConfig,
    ) -> Self {
        Self { backend, availability, config }
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Raw model answer for the given text, or `None` when the engine is
    /// unavailable, the call fails, or it times out.
    #[instrument(skip_all, fields(model = %self.backend.model_id()))]
    pub async fn generate(&self, full_text: &str, title_block_text: &str) -> Option<String> {
        if !self.availability.ensure_checked(self.backend.as_ref()).await {
            warn!("Inference engine not available, skipping model call");
            return None;
        }

        let text = extraction_text(full_text, title_block_text, self.config.max_prompt_chars);
        let req = LlmRequest {
            messages: vec![Message::user(build_prompt(&text))],
            model: None,
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let result = tokio::time::timeout(self.config.inference_timeout(), self.backend.complete(req))
            .await
            .unwrap_or(Err(LlmError::Timeout));

        match result {
            Ok(resp) => {
                info!(
                    prompt_chars = text.len(),
                    response_chars = resp.content.len(),
                    completion_tokens = resp.completion_tokens,
                    "Model responded"
                );
                Some(resp.content)
            }
            Err(LlmError::Timeout) => {
                warn!(timeout_secs = self.config.inference_timeout_secs, "Model call timed out");
                None
            }
            Err(e) => {
                warn!(error = %e, "Model call failed");
                None
            }
        }
    }

    /// Model answer parsed into raw fields.
    pub async fn infer(&self, full_text: &str, title_block_text: &str) -> Option<RawModelFields> {
        let raw = self.generate(full_text, title_block_text).await?;
        repair(&raw)
    }
}
