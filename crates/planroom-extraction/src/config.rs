//! Tunables for the extraction pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Characters of title-block (or full) text sent to the model.
    #[serde(default = "default_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Minimum trimmed full-text length accepted for extraction.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    /// Below this trimmed length the secondary extractor runs.
    #[serde(default = "default_secondary_threshold")]
    pub secondary_threshold_chars: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
    #[serde(default = "default_preview_chars")]
    pub debug_preview_chars: usize,
    #[serde(default = "default_preview_lines")]
    pub debug_preview_lines: usize,
}

fn default_prompt_chars() -> usize { 8000 }
fn default_min_text_chars() -> usize { 50 }
fn default_secondary_threshold() -> usize { 100 }
fn default_temperature() -> f32 { 0.05 }
fn default_max_tokens() -> u32 { 2000 }
fn default_inference_timeout_secs() -> u64 { 120 }
fn default_preview_chars() -> usize { 2000 }
fn default_preview_lines() -> usize { 10 }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_prompt_chars(),
            min_text_chars: default_min_text_chars(),
            secondary_threshold_chars: default_secondary_threshold(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            inference_timeout_secs: default_inference_timeout_secs(),
            debug_preview_chars: default_preview_chars(),
            debug_preview_lines: default_preview_lines(),
        }
    }
}

impl ExtractionConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ExtractionConfig::default();
        assert_eq!(cfg.max_prompt_chars, 8000);
        assert_eq!(cfg.min_text_chars, 50);
        assert_eq!(cfg.secondary_threshold_chars, 100);
        assert_eq!(cfg.max_tokens, 2000);
        assert!((cfg.temperature - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: ExtractionConfig = serde_json::from_str(r#"{"max_prompt_chars": 4000}"#).unwrap();
        assert_eq!(cfg.max_prompt_chars, 4000);
        assert_eq!(cfg.min_text_chars, 50);
        assert_eq!(cfg.inference_timeout(), Duration::from_secs(120));
    }
}
