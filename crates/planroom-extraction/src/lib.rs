//! planroom-extraction: Title-block metadata extraction from PDF drawing sheets.
//! Covers the whole pipeline:
//! - Region-focused text extraction (lopdf, with pdf-extract as secondary pass)
//! - Prompt construction and model inference
//! - Repair of truncated / fenced model output
//! - Canonical field mapping
//! - Label-pattern fallback

pub mod config;
pub mod error;
pub mod fields;
pub mod inference;
pub mod patterns;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod repair;

pub use config::ExtractionConfig;
pub use error::ExtractionError;
pub use fields::{canonicalize, CanonicalField, CanonicalFields, KeyShape, RawModelFields, RawValue};
pub use pipeline::{DebugReport, ExtractionInput, ExtractionOutcome, ExtractionPipeline, ExtractionSource};
