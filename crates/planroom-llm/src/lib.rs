//! planroom-llm: Inference-service backends and the shared availability flag.
//! Implements the LlmBackend trait for local Ollama and OpenAI-compatible servers.

pub mod availability;
pub mod backend;

pub use availability::{AvailabilitySnapshot, EngineAvailability, EngineState};
pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OllamaBackend, OpenAiCompatibleBackend};
