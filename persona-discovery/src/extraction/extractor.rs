//! Character Extractor
//!
//! Decision policy for a candidate:
//! - **Structured**: name + description + at least one character field in the
//!   metadata (personality, age, occupation, gender, appearance). Fields are
//!   mapped directly; traits come from the metadata or a description scan.
//! - **Unstructured**: the Generation Service is asked for a JSON profile.
//!   Any generation or parse failure degrades to a minimal fallback draft.

use crate::extraction::confidence::ConfidenceFactors;
use crate::extraction::generation::{
    enhancement_prompt, extraction_prompt, parse_json_object, GeneratedProfile,
    GenerationError, GenerationOptions, GenerationService,
};
use crate::extraction::traits::{infer_traits, pad_traits, MIN_TRAITS};
use crate::extraction::{parse_age, CharacterDraft, DraftMetadata, ExtractionError};
use crate::types::{is_present, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest background built from a description
const MAX_BACKGROUND_CHARS: usize = 500;

/// Keywords marking a description sentence as physical appearance
const APPEARANCE_KEYWORDS: [&str; 8] = [
    "hair",
    "eyes",
    "tall",
    "short",
    "wears",
    "appearance",
    "looks",
    "features",
];

/// Traits of the minimal fallback draft
const BASIC_TRAITS: [&str; 3] = ["mysterious", "interesting", "unique"];

const BASIC_BACKGROUND: &str = "A fascinating character with an intriguing story.";

/// Confidence of the minimal fallback draft
const BASIC_CONFIDENCE: f32 = 0.3;

/// Confidence of AI extraction when the candidate carries no match score
const DEFAULT_AI_CONFIDENCE: f32 = 0.5;

/// Confidence added by a successful enhancement
const ENHANCEMENT_BOOST: f32 = 0.2;

/// Default deadline for Generation Service calls
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts search candidates into character drafts
pub struct CharacterExtractor {
    generation: Arc<dyn GenerationService>,
    generation_timeout: Duration,
}

impl CharacterExtractor {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self {
            generation,
            generation_timeout: GENERATION_TIMEOUT,
        }
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Generation Service shared with callers that prompt it directly
    pub fn generation(&self) -> &Arc<dyn GenerationService> {
        &self.generation
    }

    /// Extract a draft from one candidate
    ///
    /// # Errors
    /// `MissingName` if the candidate has a blank name. Generation failures
    /// never surface; they produce the fallback draft instead.
    pub async fn extract(
        &self,
        result: &SearchResult,
        genre_context: Option<&str>,
    ) -> Result<CharacterDraft, ExtractionError> {
        if result.name.trim().is_empty() {
            return Err(ExtractionError::MissingName(result.id.clone()));
        }

        let draft = if has_structured_data(result) {
            debug!(result_id = %result.id, "Mapping structured candidate");
            map_structured(result)
        } else {
            debug!(result_id = %result.id, "Candidate lacks structured data, using generation");
            self.extract_with_generation(result, genre_context).await
        };

        info!(
            result_id = %result.id,
            source = %result.source,
            confidence = draft.metadata.confidence,
            structured = draft.metadata.has_structured_data,
            traits = draft.personality.len(),
            "Character extracted"
        );
        Ok(draft)
    }

    /// Extract every candidate, dropping the ones that fail
    pub async fn extract_batch(
        &self,
        results: &[SearchResult],
        genre_context: Option<&str>,
    ) -> Vec<CharacterDraft> {
        let mut drafts = Vec::with_capacity(results.len());
        for result in results {
            match self.extract(result, genre_context).await {
                Ok(draft) => drafts.push(draft),
                Err(e) => {
                    warn!(result_id = %result.id, name = %result.name, error = %e, "Batch extraction skipped candidate")
                }
            }
        }
        drafts
    }

    /// Ask the Generation Service to fill gaps in a thin draft
    ///
    /// Drafts with structured data, five or more traits and a background over
    /// 100 characters are returned as-is. On success non-empty generated
    /// fields replace the existing ones and confidence rises by 0.2 (capped at
    /// 1.0). Any failure returns the draft unchanged.
    pub async fn enhance(&self, draft: CharacterDraft) -> CharacterDraft {
        if draft.metadata.has_structured_data
            && draft.personality.len() >= 5
            && draft.background.chars().count() > 100
        {
            debug!(name = %draft.name, "Draft already complete, skipping enhancement");
            return draft;
        }

        let prompt = enhancement_prompt(&draft);
        let profile = match self.generate_profile(&prompt, GenerationOptions::creative()).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(name = %draft.name, error = %e, "Enhancement failed, keeping draft");
                return draft;
            }
        };

        let mut enhanced = draft;
        let filled = merge_profile(&mut enhanced, profile);
        enhanced.metadata.confidence = (enhanced.metadata.confidence + ENHANCEMENT_BOOST).min(1.0);
        debug!(name = %enhanced.name, fields = ?filled, "Draft enhanced");
        enhanced
    }

    /// Generate and parse a JSON profile
    pub(crate) async fn generate_profile(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<GeneratedProfile, ExtractionError> {
        let output = tokio::time::timeout(
            self.generation_timeout,
            self.generation.generate(prompt, &options),
        )
        .await
        .map_err(|_| GenerationError::Timeout)??;

        debug!(tokens_used = output.tokens_used, "Generation completed");
        parse_json_object(&output.text)
    }

    async fn extract_with_generation(
        &self,
        result: &SearchResult,
        genre_context: Option<&str>,
    ) -> CharacterDraft {
        let prompt = extraction_prompt(result, genre_context);
        match self.generate_profile(&prompt, GenerationOptions::extraction()).await {
            Ok(profile) => draft_from_profile(result, profile),
            Err(e) => {
                warn!(result_id = %result.id, error = %e, "Generation extraction failed, using basic draft");
                basic_draft(result)
            }
        }
    }
}

/// Name, description and at least one character field
fn has_structured_data(result: &SearchResult) -> bool {
    !result.name.trim().is_empty()
        && is_present(&result.description)
        && result.metadata.has_character_fields()
}

fn map_structured(result: &SearchResult) -> CharacterDraft {
    let metadata = &result.metadata;
    let description = result.description_text();

    let explicit: Vec<String> = metadata
        .personality
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let personality = if explicit.is_empty() {
        infer_traits(description)
    } else {
        pad_traits(explicit, MIN_TRAITS)
    };

    let background = match non_blank(&metadata.background) {
        Some(background) => background,
        None => build_background(result),
    };
    let appearance = non_blank(&metadata.appearance).or_else(|| appearance_from(description));

    let confidence = ConfidenceFactors {
        has_name: true,
        has_appearance: appearance.is_some(),
        has_age: is_present(&metadata.age),
        has_gender: is_present(&metadata.gender),
        has_occupation: is_present(&metadata.occupation),
        has_relationships: !metadata.relationships.is_empty(),
        has_goals: !metadata.goals.is_empty(),
        has_quirks: !metadata.quirks.is_empty(),
        has_skills: !metadata.skills.is_empty(),
        description_len: description.chars().count(),
        background_len: background.chars().count(),
        trait_count: personality.len(),
    }
    .score();

    CharacterDraft {
        name: result.name.clone(),
        alternate_name: result.alternate_name.clone(),
        personality,
        background,
        appearance,
        age: metadata.age.as_deref().and_then(parse_age),
        gender: non_blank(&metadata.gender),
        occupation: non_blank(&metadata.occupation),
        relationships: metadata.relationships.clone(),
        goals: metadata.goals.clone(),
        quirks: metadata.quirks.clone(),
        communication_style: non_blank(&metadata.communication_style),
        catchphrases: metadata.catchphrases.clone(),
        likes: metadata.likes.clone(),
        dislikes: metadata.dislikes.clone(),
        skills: metadata.skills.clone(),
        fears: metadata.fears.clone(),
        user_edited_fields: Vec::new(),
        ai_generated_fields: Vec::new(),
        metadata: provenance(result, confidence, true),
    }
}

/// Description plus birth, occupation and franchise sentences, truncated
fn build_background(result: &SearchResult) -> String {
    let metadata = &result.metadata;
    let mut background = result.description_text().to_string();

    if let Some(born) = non_blank(&metadata.birthday) {
        background.push_str(&format!(" Born {}.", born));
    }
    if let Some(occupation) = non_blank(&metadata.occupation) {
        background.push_str(&format!(" Works as {}.", occupation));
    }
    if let Some(franchise) = non_blank(&metadata.franchise) {
        background.push_str(&format!(" From {}.", franchise));
    }

    background
        .chars()
        .take(MAX_BACKGROUND_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

/// First description sentence mentioning an appearance keyword
pub(crate) fn appearance_from(description: &str) -> Option<String> {
    description
        .split(['.', '!', '?'])
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            APPEARANCE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|sentence| sentence.trim().to_string())
        .filter(|sentence| !sentence.is_empty())
}

fn draft_from_profile(result: &SearchResult, profile: GeneratedProfile) -> CharacterDraft {
    let confidence = if result.confidence > 0.0 {
        result.confidence
    } else {
        DEFAULT_AI_CONFIDENCE
    };

    let mut draft = CharacterDraft {
        name: result.name.clone(),
        alternate_name: result.alternate_name.clone(),
        background: result.description_text().trim().to_string(),
        metadata: provenance(result, confidence.clamp(0.0, 1.0), false),
        ..Default::default()
    };
    merge_profile(&mut draft, profile);

    if draft.personality.len() < MIN_TRAITS {
        draft.personality = pad_traits(std::mem::take(&mut draft.personality), MIN_TRAITS);
    }
    if draft.background.is_empty() {
        draft.background = BASIC_BACKGROUND.to_string();
    }
    if draft.appearance.is_none() {
        draft.appearance = appearance_from(result.description_text());
    }
    draft
}

fn basic_draft(result: &SearchResult) -> CharacterDraft {
    let description = result.description_text().trim();
    CharacterDraft {
        name: result.name.clone(),
        alternate_name: result.alternate_name.clone(),
        personality: BASIC_TRAITS.iter().map(|t| t.to_string()).collect(),
        background: if description.is_empty() {
            BASIC_BACKGROUND.to_string()
        } else {
            description.to_string()
        },
        appearance: appearance_from(description),
        metadata: provenance(result, BASIC_CONFIDENCE, false),
        ..Default::default()
    }
}

/// Overwrite draft fields with every non-empty generated field
///
/// Returns the names of the fields that were filled; they are also recorded
/// in `ai_generated_fields`.
pub(crate) fn merge_profile(draft: &mut CharacterDraft, profile: GeneratedProfile) -> Vec<&'static str> {
    let mut filled = Vec::new();

    macro_rules! take_list {
        ($field:ident) => {
            if !profile.$field.is_empty() {
                draft.$field = profile.$field;
                filled.push(stringify!($field));
            }
        };
    }
    macro_rules! take_text {
        ($field:ident) => {
            if let Some(value) = non_blank(&profile.$field) {
                draft.$field = Some(value);
                filled.push(stringify!($field));
            }
        };
    }

    take_list!(personality);
    if let Some(background) = non_blank(&profile.background) {
        draft.background = background;
        filled.push("background");
    }
    take_text!(appearance);
    if let Some(age) = profile.age.as_deref().and_then(parse_age) {
        draft.age = Some(age);
        filled.push("age");
    }
    take_text!(gender);
    take_text!(occupation);
    take_list!(relationships);
    take_list!(goals);
    take_list!(quirks);
    take_text!(communication_style);
    take_list!(catchphrases);
    take_list!(likes);
    take_list!(dislikes);
    take_list!(skills);
    take_list!(fears);

    for field in &filled {
        if !draft.ai_generated_fields.iter().any(|f| f == field) {
            draft.ai_generated_fields.push(field.to_string());
        }
    }
    filled
}

fn provenance(result: &SearchResult, confidence: f32, structured: bool) -> DraftMetadata {
    DraftMetadata {
        source: result.source.clone(),
        extracted_from: result.extracted_from().to_string(),
        confidence,
        has_structured_data: structured,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
