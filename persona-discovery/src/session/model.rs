//! Discovery session model
//!
//! Steps progress `type -> search -> customize -> review`. Completion and
//! abandonment are timestamps on a session parked at `review`, not steps of
//! their own; either one finishes the session.

use crate::error::DiscoveryError;
use crate::extraction::CharacterDraft;
use crate::types::{GenreId, SearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Session step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStep {
    /// Choose between an existing and an original character
    Type,
    /// Searching external sources
    Search,
    /// Editing the draft
    Customize,
    /// Reviewing the final draft
    Review,
}

impl SessionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStep::Type => "type",
            SessionStep::Search => "search",
            SessionStep::Customize => "customize",
            SessionStep::Review => "review",
        }
    }
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    /// Based on a character found through search
    Existing,
    /// Created from scratch
    Original,
}

/// Entry of the append-only interaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Action identifier
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    /// Action payload as submitted
    #[serde(default)]
    pub data: serde_json::Value,
}

/// User edits to a draft; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftModifications {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quirks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchphrases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fears: Option<Vec<String>>,
    /// Free-text guidance for generation; not a draft field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl DraftModifications {
    /// Overlay `newer` on these modifications, newer fields winning
    pub fn merge(&mut self, newer: DraftModifications) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if newer.$field.is_some() {
                    self.$field = newer.$field;
                })*
            };
        }
        overlay!(
            name,
            alternate_name,
            personality,
            background,
            appearance,
            age,
            gender,
            occupation,
            relationships,
            goals,
            quirks,
            communication_style,
            catchphrases,
            likes,
            dislikes,
            skills,
            fears,
            additional_context
        );
    }

    /// Apply the present fields to `draft`, returning their names
    pub fn apply_to(&self, draft: &mut CharacterDraft) -> Vec<&'static str> {
        let mut edited = Vec::new();

        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    draft.$field = value.clone();
                    edited.push(stringify!($field));
                }
            };
        }
        macro_rules! set_opt {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    draft.$field = Some(value.clone());
                    edited.push(stringify!($field));
                }
            };
        }

        set!(name);
        set_opt!(alternate_name);
        set!(personality);
        set!(background);
        set_opt!(appearance);
        set_opt!(age);
        set_opt!(gender);
        set_opt!(occupation);
        set!(relationships);
        set!(goals);
        set!(quirks);
        set_opt!(communication_style);
        set!(catchphrases);
        set!(likes);
        set!(dislikes);
        set!(skills);
        set!(fears);

        edited
    }
}

/// Action driving the session state machine
///
/// Wire form: `{"type": "<action>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionAction {
    SelectGenre {
        genre: GenreId,
        #[serde(default)]
        subgenre: Option<String>,
        #[serde(default)]
        archetype: Option<String>,
    },
    SelectType {
        #[serde(rename = "type")]
        kind: CharacterType,
    },
    Search {
        query: String,
        #[serde(default)]
        results: Vec<SearchResult>,
    },
    SelectResult {
        result: SearchResult,
        draft: CharacterDraft,
    },
    Customize {
        modifications: DraftModifications,
    },
    Generate {
        generated_fields: CharacterDraft,
    },
    Complete {
        character_id: String,
    },
    Abandon,
}

impl SessionAction {
    /// Every action identifier accepted on the wire
    pub const TYPES: [&'static str; 8] = [
        "select_genre",
        "select_type",
        "search",
        "select_result",
        "customize",
        "generate",
        "complete",
        "abandon",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SelectGenre { .. } => "select_genre",
            SessionAction::SelectType { .. } => "select_type",
            SessionAction::Search { .. } => "search",
            SessionAction::SelectResult { .. } => "select_result",
            SessionAction::Customize { .. } => "customize",
            SessionAction::Generate { .. } => "generate",
            SessionAction::Complete { .. } => "complete",
            SessionAction::Abandon => "abandon",
        }
    }

    /// Decode a raw action
    ///
    /// # Errors
    /// `UnknownAction` for an action type outside the state machine,
    /// `MalformedAction` for a missing type or a payload that does not fit.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DiscoveryError> {
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DiscoveryError::MalformedAction("missing action type".to_string()))?
            .to_string();

        if !Self::TYPES.contains(&kind.as_str()) {
            return Err(DiscoveryError::UnknownAction(kind));
        }

        let mut value = value;
        if kind == "abandon" {
            // Payload-free action; tolerate `"data": {}` from clients
            if let Some(object) = value.as_object_mut() {
                object.remove("data");
            }
        }

        serde_json::from_value(value)
            .map_err(|e| DiscoveryError::MalformedAction(format!("{}: {}", kind, e)))
    }

    /// Payload recorded in the interaction log
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self)
            .ok()
            .and_then(|mut v| v.get_mut("data").map(serde_json::Value::take))
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

/// Discovery session document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub current_step: SessionStep,

    #[serde(default)]
    pub selected_genre: Option<GenreId>,
    #[serde(default)]
    pub selected_subgenre: Option<String>,
    #[serde(default)]
    pub selected_archetype: Option<String>,
    #[serde(default)]
    pub character_type: Option<CharacterType>,

    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub selected_result: Option<SearchResult>,
    #[serde(default)]
    pub extracted_character: Option<CharacterDraft>,
    #[serde(default)]
    pub user_modifications: Option<DraftModifications>,
    #[serde(default)]
    pub ai_generated_fields: Option<CharacterDraft>,

    /// Milliseconds spent per step
    #[serde(default)]
    pub time_spent_per_step: BTreeMap<SessionStep, u64>,
    #[serde(default)]
    pub interaction_events: Vec<InteractionEvent>,

    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub abandoned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_character_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session at the `type` step
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            current_step: SessionStep::Type,
            selected_genre: None,
            selected_subgenre: None,
            selected_archetype: None,
            character_type: None,
            search_query: None,
            search_results: Vec::new(),
            selected_result: None,
            extracted_character: None,
            user_modifications: None,
            ai_generated_fields: None,
            time_spent_per_step: BTreeMap::new(),
            interaction_events: Vec::new(),
            started_at: now,
            completed_at: None,
            abandoned_at: None,
            result_character_id: None,
            updated_at: now,
        }
    }

    /// Completed or abandoned
    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some() || self.abandoned_at.is_some()
    }

    /// Draft the user is working on
    ///
    /// The generated draft if any, else the extracted one, with the
    /// recorded user modifications applied on top.
    pub fn working_draft(&self) -> Option<CharacterDraft> {
        let mut draft = self
            .ai_generated_fields
            .as_ref()
            .or(self.extracted_character.as_ref())
            .cloned()?;
        if let Some(modifications) = &self.user_modifications {
            modifications.apply_to(&mut draft);
        }
        Some(draft)
    }

    pub fn total_time_ms(&self) -> u64 {
        self.time_spent_per_step.values().sum()
    }

    /// [`apply`](Self::apply) for a session that still accepts actions
    ///
    /// Stores call this while holding their write lock, so a session that
    /// finished after the caller read it is never written again.
    ///
    /// # Errors
    /// `Error::Conflict` once the session is completed or abandoned.
    pub fn apply_active(&mut self, update: SessionUpdate) -> persona_common::Result<()> {
        if self.is_finished() {
            return Err(persona_common::Error::Conflict(format!(
                "session {} is finished",
                self.id
            )));
        }
        self.apply(update);
        Ok(())
    }

    /// Merge a partial update
    ///
    /// Present fields overwrite, time is accumulated and the event appended.
    pub fn apply(&mut self, update: SessionUpdate) {
        if let Some((step, ms)) = update.time_spent {
            *self.time_spent_per_step.entry(step).or_insert(0) += ms;
        }
        if let Some(event) = update.event {
            self.interaction_events.push(event);
        }

        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if let Some(genre) = update.selected_genre {
            self.selected_genre = Some(genre);
        }
        if update.selected_subgenre.is_some() {
            self.selected_subgenre = update.selected_subgenre;
        }
        if update.selected_archetype.is_some() {
            self.selected_archetype = update.selected_archetype;
        }
        if update.character_type.is_some() {
            self.character_type = update.character_type;
        }
        if update.search_query.is_some() {
            self.search_query = update.search_query;
        }
        if let Some(results) = update.search_results {
            self.search_results = results;
        }
        if update.selected_result.is_some() {
            self.selected_result = update.selected_result;
        }
        if update.extracted_character.is_some() {
            self.extracted_character = update.extracted_character;
        }
        if update.user_modifications.is_some() {
            self.user_modifications = update.user_modifications;
        }
        if update.ai_generated_fields.is_some() {
            self.ai_generated_fields = update.ai_generated_fields;
        }
        if update.completed_at.is_some() {
            self.completed_at = update.completed_at;
        }
        if update.abandoned_at.is_some() {
            self.abandoned_at = update.abandoned_at;
        }
        if update.result_character_id.is_some() {
            self.result_character_id = update.result_character_id;
        }
        if let Some(at) = update.updated_at {
            self.updated_at = at;
        }
    }
}

/// Partial session update produced by one `progress` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub current_step: Option<SessionStep>,
    pub selected_genre: Option<GenreId>,
    pub selected_subgenre: Option<String>,
    pub selected_archetype: Option<String>,
    pub character_type: Option<CharacterType>,
    pub search_query: Option<String>,
    pub search_results: Option<Vec<SearchResult>>,
    pub selected_result: Option<SearchResult>,
    pub extracted_character: Option<CharacterDraft>,
    pub user_modifications: Option<DraftModifications>,
    pub ai_generated_fields: Option<CharacterDraft>,
    pub completed_at: Option<DateTime<Utc>>,
    pub abandoned_at: Option<DateTime<Utc>>,
    pub result_character_id: Option<String>,
    /// Milliseconds to add to a step's total
    pub time_spent: Option<(SessionStep, u64)>,
    /// Interaction log entry to append
    pub event: Option<InteractionEvent>,
    pub updated_at: Option<DateTime<Utc>>,
}
