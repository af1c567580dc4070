//! Core Types and Trait Definitions for persona discovery
//!
//! Defines the value types that flow between the search router, the match
//! scorer and the character extractor, plus the Source Adapter contract that
//! every external data provider satisfies.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Genres
// ============================================================================

/// Genre identifier used to pick the source priority list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenreId {
    Romance,
    Friendship,
    Gaming,
    Professional,
    Roleplay,
    Wellness,
}

impl GenreId {
    /// All genres, in display order
    pub const ALL: [GenreId; 6] = [
        GenreId::Romance,
        GenreId::Friendship,
        GenreId::Gaming,
        GenreId::Professional,
        GenreId::Roleplay,
        GenreId::Wellness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenreId::Romance => "romance",
            GenreId::Friendship => "friendship",
            GenreId::Gaming => "gaming",
            GenreId::Professional => "professional",
            GenreId::Roleplay => "roleplay",
            GenreId::Wellness => "wellness",
        }
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenreId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        GenreId::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| format!("Unknown genre: {}", s))
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// Per-call search options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum results requested from each source
    #[serde(default)]
    pub limit: Option<usize>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            page: None,
        }
    }
}

/// Typed metadata carried by a search candidate
///
/// Fields the extractor knows how to use are typed; anything else a source
/// reports lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Name in the original script (e.g. Japanese)
    #[serde(default, alias = "nameNative")]
    pub native_name: Option<String>,
    #[serde(default)]
    pub nicknames: Vec<String>,

    /// Explicit personality traits
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "profession")]
    pub occupation: Option<String>,
    #[serde(default)]
    pub appearance: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(
        default,
        alias = "birthYear",
        alias = "birth_year",
        deserialize_with = "de_opt_string_or_number"
    )]
    pub birthday: Option<String>,
    #[serde(default, alias = "series")]
    pub franchise: Option<String>,
    #[serde(default, alias = "communicationStyle")]
    pub communication_style: Option<String>,

    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub quirks: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub catchphrases: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub fears: Vec<String>,

    /// Source-specific fields without a typed home (popularity, ids, ...)
    #[serde(default, flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SourceMetadata {
    /// True if at least one character-describing field is present
    pub fn has_character_fields(&self) -> bool {
        !self.personality.is_empty()
            || is_present(&self.age)
            || is_present(&self.occupation)
            || is_present(&self.gender)
            || is_present(&self.appearance)
    }
}

pub(crate) fn is_present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
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

/// A candidate entity returned by a source adapter
///
/// `confidence` is overwritten with the match score by the router before
/// results are returned or cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub alternate_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Source id of the adapter that produced this result
    pub source: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub metadata: SourceMetadata,
    #[serde(default)]
    pub confidence: f32,
}

impl SearchResult {
    /// Create a bare result; `id` is derived as `source:external_id`
    pub fn new(
        source: impl Into<String>,
        external_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let external_id = external_id.into();
        Self {
            id: format!("{}:{}", source, external_id),
            external_id,
            name: name.into(),
            alternate_name: None,
            description: None,
            image_url: None,
            thumbnail_url: None,
            source,
            source_url: None,
            metadata: SourceMetadata::default(),
            confidence: 0.0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alternate_name(mut self, alternate_name: impl Into<String>) -> Self {
        self.alternate_name = Some(alternate_name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Alternate names considered by the match scorer
    pub fn alternate_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(alt) = self.alternate_name.as_deref() {
            names.push(alt);
        }
        if let Some(native) = self.metadata.native_name.as_deref() {
            names.push(native);
        }
        names.extend(self.metadata.nicknames.iter().map(String::as_str));
        names
    }

    /// Provenance reference: the source URL when known, else the result id
    pub fn extracted_from(&self) -> &str {
        self.source_url.as_deref().unwrap_or(&self.id)
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Source Adapter Contract
// ============================================================================

/// Provider request quota: at most `requests` calls every `per`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u32,
    pub per: Duration,
}

impl RateLimit {
    pub const fn new(requests: u32, per: Duration) -> Self {
        Self { requests, per }
    }

    /// No admission control
    pub const fn unlimited() -> Self {
        Self {
            requests: 0,
            per: Duration::ZERO,
        }
    }
}

/// External data provider contract
///
/// Implemented by one adapter per provider (anime, movie/TV, game and
/// encyclopedic databases). The router only depends on this trait.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable source identifier (`anilist`, `tmdb`, ...)
    fn source_id(&self) -> &str;

    /// Genres this source is suitable for
    fn supported_genres(&self) -> &[GenreId];

    /// Provider quota applied by the router before each call
    fn rate_limit(&self) -> RateLimit;

    /// Search the provider
    ///
    /// # Errors
    /// Returns `SourceError` on any provider failure; the router treats it
    /// as recoverable and moves on to the next source.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SourceError>;

    /// Fetch a single entity by provider id
    async fn get_details(&self, external_id: &str) -> Result<Option<SearchResult>, SourceError>;

    /// Cheap connectivity check
    async fn test_connection(&self) -> bool;
}

/// Source adapter failure
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned an error response
    #[error("API error: {0}")]
    Api(String),

    /// Failed to parse provider response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source not configured or temporarily unavailable
    #[error("Source not available: {0}")]
    Unavailable(String),

    /// Internal adapter error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_round_trip_through_str() {
        assert_eq!("Roleplay".parse::<GenreId>().unwrap(), GenreId::Roleplay);
        assert_eq!(GenreId::Wellness.to_string(), "wellness");
        assert!("horror".parse::<GenreId>().is_err());
    }

    #[test]
    fn test_metadata_accepts_numeric_age_and_aliases() {
        let metadata: SourceMetadata = serde_json::from_value(serde_json::json!({
            "age": 17,
            "profession": "ninja",
            "nameNative": "うずまきナルト",
            "birthYear": 1999,
            "popularity": 42
        }))
        .unwrap();

        assert_eq!(metadata.age.as_deref(), Some("17"));
        assert_eq!(metadata.occupation.as_deref(), Some("ninja"));
        assert_eq!(metadata.native_name.as_deref(), Some("うずまきナルト"));
        assert_eq!(metadata.birthday.as_deref(), Some("1999"));
        assert_eq!(metadata.extra.get("popularity"), Some(&serde_json::json!(42)));
        assert!(metadata.has_character_fields());
    }

    #[test]
    fn test_blank_fields_are_not_character_fields() {
        let metadata = SourceMetadata {
            gender: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!metadata.has_character_fields());
    }

    #[test]
    fn test_alternate_names_collects_all_variants() {
        let mut result = SearchResult::new("anilist", "17", "Naruto Uzumaki")
            .with_alternate_name("Naruto");
        result.metadata.native_name = Some("うずまきナルト".to_string());
        result.metadata.nicknames = vec!["Hokage".to_string()];

        assert_eq!(
            result.alternate_names(),
            vec!["Naruto", "うずまきナルト", "Hokage"]
        );
        assert_eq!(result.id, "anilist:17");
        assert_eq!(result.extracted_from(), "anilist:17");
    }
}
