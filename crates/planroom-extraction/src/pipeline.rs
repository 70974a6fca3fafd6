//! End-to-end metadata extraction for a single uploaded PDF.
//!
//! Orchestrates, in order:
//!   1. Input checks (file name, empty buffer)
//!   2. Text extraction (full text + title block)
//!   3. Minimum-length gate
//!   4. Model inference, repair and canonicalisation
//!   5. Label-pattern fallback whenever step 4 produces nothing usable

use std::sync::Arc;

use planroom_llm::{EngineAvailability, LlmBackend};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, Result};
use crate::fields::{canonicalize, CanonicalFields};
use crate::inference::InferenceEngine;
use crate::patterns::extract_by_pattern;
use crate::pdf::{extract_text, ExtractedText};

// ── Input / output ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExtractionInput {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }

    fn check(&self) -> Result<()> {
        if !self.file_name.to_lowercase().ends_with(".pdf") {
            return Err(ExtractionError::NotPdf);
        }
        if self.bytes.is_empty() {
            return Err(ExtractionError::EmptyFile);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Model,
    Patterns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub fields: CanonicalFields,
    pub source: ExtractionSource,
}

/// Diagnostic view of one extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub full_text_preview: String,
    pub title_block_text_preview: String,
    pub full_text_length: usize,
    pub title_block_length: usize,
    pub extracted_data: CanonicalFields,
    pub first_10_lines_full: Vec<String>,
    pub first_10_lines_title_block: Vec<String>,
    pub ollama_available: bool,
    pub ollama_model: Option<String>,
}

fn preview(text: &str, max_chars: usize, placeholder: &str) -> String {
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

fn first_lines(text: &str, n: usize) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').take(n).map(str::to_string).collect()
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct ExtractionPipeline {
    engine: InferenceEngine,
    availability: Arc<EngineAvailability>,
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        availability: Arc<EngineAvailability>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            engine: InferenceEngine::new(backend, availability.clone(), config.clone()),
            availability,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Text extraction runs on the blocking pool; it is CPU-bound.
    async fn read_text(&self, bytes: Vec<u8>) -> Result<ExtractedText> {
        let threshold = self.config.secondary_threshold_chars;
        tokio::task::spawn_blocking(move || extract_text(&bytes, threshold))
            .await
            .map_err(|e| ExtractionError::Internal(anyhow::anyhow!("text extraction task failed: {e}")))
    }

    /// Canonical fields from already-extracted text. Always yields a result.
    #[instrument(skip_all, fields(full_chars = full_text.len(), title_block_chars = title_block_text.len()))]
    pub async fn extract_details(&self, full_text: &str, title_block_text: &str) -> ExtractionOutcome {
        if let Some(raw) = self.engine.infer(full_text, title_block_text).await {
            let fields = canonicalize(&raw);
            if !fields.is_empty() {
                info!(filled = fields.filled(), keys = raw.len(), "Model extraction succeeded");
                return ExtractionOutcome { fields, source: ExtractionSource::Model };
            }
            warn!(keys = raw.len(), "Model answer mapped to no fields");
        }

        let fields = extract_by_pattern(full_text);
        info!(filled = fields.filled(), "Using pattern extraction");
        ExtractionOutcome { fields, source: ExtractionSource::Patterns }
    }

    /// Validate the upload, extract its text and return the canonical fields.
    #[instrument(skip_all, fields(file = %input.file_name, bytes = input.bytes.len()))]
    pub async fn process(&self, input: ExtractionInput) -> Result<CanonicalFields> {
        input.check()?;

        let text = self.read_text(input.bytes).await?;
        if text.full_text.trim().chars().count() < self.config.min_text_chars {
            warn!(chars = text.full_text.trim().len(), "Insufficient text extracted");
            return Err(ExtractionError::InsufficientText);
        }

        info!(
            full_chars = text.full_text.len(),
            title_block_chars = text.title_block_text.len(),
            "Extracted text"
        );
        let outcome = self.extract_details(&text.full_text, &text.title_block_text).await;
        Ok(outcome.fields)
    }

    /// Same input handling as [`process`](Self::process) without the
    /// minimum-length gate, returning previews of the intermediate text.
    pub async fn debug(&self, input: ExtractionInput) -> Result<DebugReport> {
        if !input.file_name.to_lowercase().ends_with(".pdf") {
            return Err(ExtractionError::NotPdf);
        }

        let text = self.read_text(input.bytes).await?;
        let outcome = self.extract_details(&text.full_text, &text.title_block_text).await;
        let available = self.availability.is_available().await;

        let max_chars = self.config.debug_preview_chars;
        let max_lines = self.config.debug_preview_lines;
        Ok(DebugReport {
            full_text_preview: preview(&text.full_text, max_chars, "No text extracted"),
            title_block_text_preview: preview(&text.title_block_text, max_chars, "No title block text"),
            full_text_length: text.full_text.chars().count(),
            title_block_length: text.title_block_text.chars().count(),
            extracted_data: outcome.fields,
            first_10_lines_full: first_lines(&text.full_text, max_lines),
            first_10_lines_title_block: first_lines(&text.title_block_text, max_lines),
            ollama_available: available,
            ollama_model: available.then(|| self.engine.model_id().to_string()),
        })
    }
}
