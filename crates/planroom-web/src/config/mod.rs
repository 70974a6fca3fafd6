//! Configuration loading for the Planroom server.
//! Reads planroom.toml from the current directory or the path in PLANROOM_CONFIG,
//! then applies environment overrides.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use planroom_extraction::ExtractionConfig;
use planroom_llm::{LlmBackend, OllamaBackend, OpenAiCompatibleBackend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Front-end origin used in invitation links.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

fn default_bind()    -> String { "0.0.0.0:8000".to_string() }
fn default_app_url() -> String { "http://localhost:5173".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), app_url: default_app_url() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Ollama,
    OpenaiCompatible,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "openai_compatible" | "openai-compatible" => Ok(BackendKind::OpenaiCompatible),
            other => anyhow::bail!("Unknown LLM backend: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer key for OpenAI-compatible servers that require one.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_backend()  -> BackendKind { BackendKind::Ollama }
fn default_base_url() -> String { "http://localhost:11434".to_string() }
fn default_model()    -> String { "mistral:latest".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

fn default_upload_dir() -> String { "./uploads".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { upload_dir: default_upload_dir() }
    }
}


impl Config {
    /// Load configuration from planroom.toml (or PLANROOM_CONFIG) and the
    /// process environment. A missing file means defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PLANROOM_CONFIG")
            .unwrap_or_else(|_| "planroom.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            Self::from_toml(&content).with_context(|| format!("Invalid config file {path}"))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment-style overrides; `lookup` returns the value of a
    /// variable when set.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("PLANROOM_LLM_BACKEND") {
            self.llm.backend = v.parse()?;
        }
        if let Some(v) = lookup("PLANROOM_LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = lookup("PLANROOM_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = lookup("PLANROOM_APP_URL") {
            self.server.app_url = v;
        }
        if let Some(v) = lookup("PLANROOM_UPLOAD_DIR") {
            self.storage.upload_dir = v;
        }
        if let Some(v) = lookup("PLANROOM_INFERENCE_TIMEOUT_SECS") {
            self.extraction.inference_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("PLANROOM_INFERENCE_TIMEOUT_SECS is not a number: {v}"))?;
        }
        Ok(())
    }

    /// The configured inference backend, with the inference timeout applied
    /// to its HTTP client.
    pub fn build_backend(&self) -> anyhow::Result<Arc<dyn LlmBackend>> {
        let timeout = Duration::from_secs(self.extraction.inference_timeout_secs);
        let backend: Arc<dyn LlmBackend> = match self.llm.backend {
            BackendKind::Ollama => Arc::new(
                OllamaBackend::new(&self.llm.base_url, &self.llm.model).with_timeout(timeout)?,
            ),
            BackendKind::OpenaiCompatible => Arc::new(
                OpenAiCompatibleBackend::new(&self.llm.base_url, &self.llm.model, self.llm.api_key.clone())
                    .with_timeout(timeout)?,
            ),
        };
        Ok(backend)
    }
}
