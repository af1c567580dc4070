//! Character extraction
//!
//! Turns a chosen search candidate into a normalized, confidence-scored
//! `CharacterDraft`. Candidates with enough structured metadata are mapped
//! directly; everything else goes through the Generation Service, degrading to
//! a minimal fallback draft when generation fails.

pub mod confidence;
pub mod extractor;
pub mod generation;
pub mod traits;
pub mod validator;

pub use extractor::CharacterExtractor;
pub use generation::{GenerationError, GenerationOptions, GenerationOutput, GenerationService};
pub use validator::{DraftValidator, Severity, ValidationIssue, ValidationReport};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized character profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(default)]
    pub alternate_name: Option<String>,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub appearance: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub quirks: Vec<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub catchphrases: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub fears: Vec<String>,

    /// Fields changed by the user during customization
    #[serde(default)]
    pub user_edited_fields: Vec<String>,
    /// Fields filled in by the Generation Service
    #[serde(default)]
    pub ai_generated_fields: Vec<String>,

    #[serde(default)]
    pub metadata: DraftMetadata,
}

/// Provenance and quality of a draft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMetadata {
    /// Source id of the candidate
    pub source: String,
    /// Source URL, or the candidate id when no URL is known
    pub extracted_from: String,
    pub confidence: f32,
    pub has_structured_data: bool,
}

/// Extraction failure
///
/// Only `MissingName` escapes `CharacterExtractor::extract`; generation
/// problems are absorbed into the fallback draft.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Candidate {0} has no name")]
    MissingName(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Generation output did not contain the expected JSON object
    #[error("Unparseable generation output: {0}")]
    Unparseable(String),
}

/// Leading decimal digits of `raw` as an age (`"17 years"` -> 17)
pub(crate) fn parse_age(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
