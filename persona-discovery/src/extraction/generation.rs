//! Generation Service contract and prompt/response handling
//!
//! The Generation Service is an opaque text generator. This module owns the
//! prompts that ask it for a JSON character profile and the tolerant parser
//! that digs that JSON back out of whatever the service returns (code fences,
//! leading prose, trailing commentary).

use crate::extraction::{CharacterDraft, ExtractionError};
use crate::types::SearchResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Sampling options passed through to the Generation Service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationOptions {
    /// Low temperature, for pulling facts out of existing text
    pub fn extraction() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1500,
        }
    }

    /// Higher temperature, for inventing or filling in a character
    pub fn creative() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Generated text and its token cost
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub text: String,
    pub tokens_used: u32,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    #[error("Generation request failed: {0}")]
    Failed(String),

    #[error("Generation timed out")]
    Timeout,
}

/// AI text generation collaborator
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError>;
}

/// Character profile as emitted by the Generation Service
///
/// Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratedProfile {
    pub name: Option<String>,
    #[serde(deserialize_with = "de_string_or_list")]
    pub personality: Vec<String>,
    #[serde(alias = "backstory")]
    pub background: Option<String>,
    #[serde(alias = "physicalAppearance")]
    pub appearance: Option<String>,
    #[serde(deserialize_with = "de_opt_string_or_number")]
    pub age: Option<String>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub relationships: Vec<String>,
    pub goals: Vec<String>,
    pub quirks: Vec<String>,
    #[serde(alias = "communicationStyle")]
    pub communication_style: Option<String>,
    pub catchphrases: Vec<String>,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub skills: Vec<String>,
    pub fears: Vec<String>,
    /// Self-reported confidence, if the model provides one
    pub confidence: Option<f32>,
}

fn de_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Some(serde_json::Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn de_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse the first JSON object embedded in generated text
///
/// Accepts bare JSON, fenced blocks (```json ... ```) and objects surrounded
/// by prose. The first fenced block is tried before the full text; within
/// each, brace-balanced spans are tried in order of appearance.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, ExtractionError> {
    let mut last_error = None;

    for candidate in fenced_block(text).into_iter().chain(std::iter::once(text)) {
        for object in balanced_objects(candidate) {
            match serde_json::from_str(object) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
    }

    Err(ExtractionError::Unparseable(
        last_error.unwrap_or_else(|| "no JSON object found".to_string()),
    ))
}

/// Every brace-balanced `{...}` span, by start position
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{').filter_map(move |(start, _)| {
        let len = object_len(&text[start..])?;
        Some(&text[start..start + len])
    })
}

/// Byte length of the object opening at the start of `text`, string-aware
fn object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Body of the first ``` fenced block, if any
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string (e.g. `json`) up to the end of the line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

const PROFILE_SHAPE: &str = r#"{
  "personality": ["trait", "..."],
  "background": "string",
  "appearance": "string",
  "age": "string",
  "gender": "string",
  "occupation": "string",
  "relationships": ["string"],
  "goals": ["string"],
  "quirks": ["string"],
  "communication_style": "string",
  "catchphrases": ["string"],
  "likes": ["string"],
  "dislikes": ["string"],
  "skills": ["string"],
  "fears": ["string"],
  "confidence": 0.0
}"#;

/// Prompt asking for a profile of an existing, unstructured candidate
pub fn extraction_prompt(result: &SearchResult, genre_context: Option<&str>) -> String {
    let metadata = serde_json::to_string(&result.metadata).unwrap_or_default();
    let mut prompt = format!(
        "Extract a character profile from the following source data.\n\n\
         Name: {}\n",
        result.name
    );
    if let Some(alt) = result.alternate_name.as_deref() {
        prompt.push_str(&format!("Also known as: {}\n", alt));
    }
    prompt.push_str(&format!(
        "Source: {}\nDescription: {}\nMetadata: {}\n",
        result.source,
        result.description_text(),
        metadata
    ));
    if let Some(genre) = genre_context {
        prompt.push_str(&format!("Genre context: {}\n", genre));
    }
    prompt.push_str(&format!(
        "\nUse only facts supported by the source data. Give 3 to 7 personality \
         traits. Set confidence between 0 and 1 to reflect how well the data \
         supports the profile.\n\nRespond with a single JSON object of this shape:\n{}",
        PROFILE_SHAPE
    ));
    prompt
}

/// Prompt asking to fill the gaps of an existing draft
pub fn enhancement_prompt(draft: &CharacterDraft) -> String {
    let existing = serde_json::to_string(draft).unwrap_or_default();
    format!(
        "Complete the character profile for {}. Keep every existing fact and \
         fill in missing or thin fields so the character feels consistent.\n\n\
         Existing data: {}\n\nRespond with a single JSON object of this shape:\n{}",
        draft.name, existing, PROFILE_SHAPE
    )
}

/// Prompt asking for a new character from session context
pub fn creation_prompt(
    name: &str,
    genre: &str,
    archetype: &str,
    additional_context: Option<&str>,
    reference: Option<&CharacterDraft>,
) -> String {
    let mut prompt = format!(
        "Create an original character named {}.\nGenre: {}\nArchetype: {}\n",
        name, genre, archetype
    );
    if let Some(context) = additional_context {
        prompt.push_str(&format!("Additional context: {}\n", context));
    }
    if let Some(reference) = reference {
        let existing = serde_json::to_string(reference).unwrap_or_default();
        prompt.push_str(&format!("Reference data: {}\n", existing));
    }
    prompt.push_str(&format!(
        "\nRespond with a single JSON object of this shape:\n{}",
        PROFILE_SHAPE
    ));
    prompt
}

/// Prompt asking to correct a draft that failed validation
pub fn fix_prompt(draft: &CharacterDraft, errors: &[String]) -> String {
    let existing = serde_json::to_string(draft).unwrap_or_default();
    format!(
        "The following character has validation errors. Please fix them.\n\n\
         Character: {}\n\nErrors: {}\n\nReturn the corrected character as a single JSON object \
         including a \"name\" field.",
        existing,
        errors.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_json() {
        let profile: GeneratedProfile =
            parse_json_object(r#"{"personality": ["brave", "loyal"], "age": 17}"#).unwrap();
        assert_eq!(profile.personality, vec!["brave", "loyal"]);
        assert_eq!(profile.age.as_deref(), Some("17"));
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let text = "Sure! Here is the profile:\n```json\n{\"background\": \"A ninja.\", \
                    \"personality\": \"brave, loyal ,\"}\n```\nLet me know if you need more.";
        let profile: GeneratedProfile = parse_json_object(text).unwrap();
        assert_eq!(profile.background.as_deref(), Some("A ninja."));
        assert_eq!(profile.personality, vec!["brave", "loyal"]);
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let text = "Profile follows {\"backstory\": \"Raised alone.\"} end.";
        let profile: GeneratedProfile = parse_json_object(text).unwrap();
        assert_eq!(profile.background.as_deref(), Some("Raised alone."));
    }

    #[test]
    fn test_unparseable_output() {
        let result: Result<GeneratedProfile, _> = parse_json_object("I cannot help with that.");
        assert!(matches!(result, Err(ExtractionError::Unparseable(_))));

        let result: Result<GeneratedProfile, _> = parse_json_object("{\"personality\": [");
        assert!(matches!(result, Err(ExtractionError::Unparseable(_))));
    }

    #[test]
    fn test_parse_skips_fence_without_json() {
        let text = "Run this first:\n```sh\necho ready\n```\nThen the profile: \
                    {\"background\": \"A ninja.\"}";
        let profile: GeneratedProfile = parse_json_object(text).unwrap();
        assert_eq!(profile.background.as_deref(), Some("A ninja."));
    }

    #[test]
    fn test_parse_stops_at_the_matching_brace() {
        let text = "{\"background\": \"Wears a {scarf}.\"} and later {\"background\": \"other\"} \
                    (braces in prose } too)";
        let profile: GeneratedProfile = parse_json_object(text).unwrap();
        assert_eq!(profile.background.as_deref(), Some("Wears a {scarf}."));

        let text = "Use {placeholders} like this. {\"occupation\": \"ninja\"}";
        let profile: GeneratedProfile = parse_json_object(text).unwrap();
        assert_eq!(profile.occupation.as_deref(), Some("ninja"));
    }

    #[test]
    fn test_extraction_prompt_embeds_candidate() {
        let result = SearchResult::new("wikipedia", "42", "Ada Lovelace")
            .with_description("English mathematician.");
        let prompt = extraction_prompt(&result, Some("professional"));
        assert!(prompt.contains("Ada Lovelace"));
        assert!(prompt.contains("English mathematician."));
        assert!(prompt.contains("Genre context: professional"));
    }
}
