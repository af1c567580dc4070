//! Discovery orchestrator
//!
//! Drives a session through the state machine and coordinates the router,
//! the extractor and the Session Store. Every action goes through
//! [`DiscoveryOrchestrator::progress`], which accounts time, logs the
//! interaction, persists the update and emits an analytics event.

use crate::error::DiscoveryError;
use crate::extraction::extractor::merge_profile;
use crate::extraction::generation::{creation_prompt, fix_prompt, GenerationOptions};
use crate::extraction::{CharacterDraft, CharacterExtractor, DraftMetadata, DraftValidator};
use crate::search::{SearchOutcome, SearchRouter};
use crate::session::machine::progress_update;
use crate::session::model::{DraftModifications, Session, SessionAction, SessionStep};
use crate::session::store::SessionStore;
use crate::taxonomy;
use crate::types::{SearchOptions, SearchResult};
use chrono::Utc;
use persona_common::{DiscoveryEvent, EventBus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_CHARACTER_NAME: &str = "New Character";
const DEFAULT_GENRE_NAME: &str = "General";
const DEFAULT_ARCHETYPE_NAME: &str = "Balanced";
const GENERATED_SOURCE: &str = "generation";

/// Confidence of a generated draft when the service reports none
const DEFAULT_GENERATED_CONFIDENCE: f32 = 0.5;

/// Character id recorded when finalizing without one
pub const PENDING_CHARACTER_ID: &str = "pending";

/// Per-session analytics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAnalytics {
    pub session_id: Uuid,
    pub total_time_ms: u64,
    pub time_spent_per_step: BTreeMap<SessionStep, u64>,
    /// Number of distinct steps time was spent on
    pub steps_visited: usize,
    pub interaction_count: usize,
    pub current_step: SessionStep,
    pub completed: bool,
    pub abandoned: bool,
}

impl From<&Session> for SessionAnalytics {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            total_time_ms: session.total_time_ms(),
            time_spent_per_step: session.time_spent_per_step.clone(),
            steps_visited: session.time_spent_per_step.len(),
            interaction_count: session.interaction_events.len(),
            current_step: session.current_step,
            completed: session.completed_at.is_some(),
            abandoned: session.abandoned_at.is_some(),
        }
    }
}

/// Session-level coordinator of the discovery flow
pub struct DiscoveryOrchestrator {
    router: Arc<SearchRouter>,
    extractor: Arc<CharacterExtractor>,
    store: Arc<dyn SessionStore>,
    validator: DraftValidator,
    events: Option<EventBus>,
}

impl DiscoveryOrchestrator {
    pub fn new(
        router: Arc<SearchRouter>,
        extractor: Arc<CharacterExtractor>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            router,
            extractor,
            store,
            validator: DraftValidator::new(),
            events: None,
        }
    }

    /// Emit analytics events on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn router(&self) -> &Arc<SearchRouter> {
        &self.router
    }

    pub fn extractor(&self) -> &Arc<CharacterExtractor> {
        &self.extractor
    }

    pub fn validator(&self) -> &DraftValidator {
        &self.validator
    }

    pub async fn start_session(&self, user_id: &str) -> Result<Session, DiscoveryError> {
        let session = self.store.create(user_id).await?;
        info!(session_id = %session.id, user_id = %user_id, "Discovery session started");

        self.emit(DiscoveryEvent::SessionStarted {
            session_id: session.id,
            user_id: session.user_id.clone(),
            timestamp: session.started_at,
        });
        Ok(session)
    }

    /// Apply one action to a session
    ///
    /// # Errors
    /// `SessionNotFound` for an unknown id, `SessionFinished` once the
    /// session is completed or abandoned.
    pub async fn progress(
        &self,
        session_id: Uuid,
        action: SessionAction,
    ) -> Result<Session, DiscoveryError> {
        let session = self.session(session_id).await?;
        let old_step = session.current_step;

        let update = progress_update(&session, &action, Utc::now())?;
        let updated = self.store.update(session_id, update).await.map_err(|e| match e {
            persona_common::Error::NotFound(_) => DiscoveryError::SessionNotFound(session_id),
            persona_common::Error::Conflict(_) => DiscoveryError::SessionFinished(session_id),
            other => DiscoveryError::Common(other),
        })?;

        debug!(
            session_id = %session_id,
            action = action.name(),
            old_step = %old_step,
            new_step = %updated.current_step,
            "Session progressed"
        );
        self.emit(DiscoveryEvent::SessionProgressed {
            session_id,
            user_id: updated.user_id.clone(),
            action: action.name().to_string(),
            old_step: old_step.to_string(),
            new_step: updated.current_step.to_string(),
            timestamp: updated.updated_at,
        });
        Ok(updated)
    }

    /// Decode a raw `{type, data}` action and apply it
    ///
    /// # Errors
    /// `UnknownAction` or `MalformedAction` before the session is touched,
    /// then as [`progress`](Self::progress).
    pub async fn progress_json(
        &self,
        session_id: Uuid,
        action: serde_json::Value,
    ) -> Result<Session, DiscoveryError> {
        let action = SessionAction::from_json(action)?;
        self.progress(session_id, action).await
    }

    /// Search within a session, recording the query and results
    ///
    /// # Errors
    /// `GenreNotSelected` if no genre was picked yet.
    pub async fn perform_search(
        &self,
        session_id: Uuid,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, DiscoveryError> {
        let session = self.active_session(session_id).await?;
        let genre = session
            .selected_genre
            .ok_or(DiscoveryError::GenreNotSelected(session_id))?;

        let outcome = self.router.search(query, genre, options).await;
        self.progress(
            session_id,
            SessionAction::Search {
                query: query.to_string(),
                results: outcome.results.clone(),
            },
        )
        .await?;
        Ok(outcome)
    }

    /// Extract a draft from a chosen candidate and move to customization
    pub async fn select_search_result(
        &self,
        session_id: Uuid,
        result: SearchResult,
    ) -> Result<CharacterDraft, DiscoveryError> {
        let session = self.active_session(session_id).await?;
        let genre_context = session.selected_genre.map(|g| g.as_str());

        let draft = self.extractor.extract(&result, genre_context).await?;
        self.emit(DiscoveryEvent::CharacterExtracted {
            session_id: Some(session_id),
            source: draft.metadata.source.clone(),
            confidence: draft.metadata.confidence,
            structured: draft.metadata.has_structured_data,
            timestamp: Utc::now(),
        });

        self.progress(
            session_id,
            SessionAction::SelectResult {
                result,
                draft: draft.clone(),
            },
        )
        .await?;
        Ok(draft)
    }

    /// [`select_search_result`](Self::select_search_result) for a result of
    /// the session's last search
    pub async fn select_search_result_by_id(
        &self,
        session_id: Uuid,
        result_id: &str,
    ) -> Result<CharacterDraft, DiscoveryError> {
        let session = self.session(session_id).await?;
        let result = session
            .search_results
            .into_iter()
            .find(|r| r.id == result_id)
            .ok_or_else(|| {
                persona_common::Error::NotFound(format!("search result {}", result_id))
            })?;
        self.select_search_result(session_id, result).await
    }

    /// Apply user edits to a draft
    ///
    /// Edited fields move from `ai_generated_fields` to `user_edited_fields`.
    /// The modifications are merged into the ones already recorded on the
    /// session.
    pub async fn apply_customizations(
        &self,
        session_id: Uuid,
        draft: CharacterDraft,
        modifications: DraftModifications,
    ) -> Result<CharacterDraft, DiscoveryError> {
        let session = self.active_session(session_id).await?;

        let mut updated = draft;
        let edited = modifications.apply_to(&mut updated);
        for field in &edited {
            if !updated.user_edited_fields.iter().any(|f| f == field) {
                updated.user_edited_fields.push(field.to_string());
            }
        }
        updated
            .ai_generated_fields
            .retain(|f| !edited.iter().any(|e| *e == f.as_str()));

        let mut recorded = session.user_modifications.unwrap_or_default();
        recorded.merge(modifications);
        self.progress(
            session_id,
            SessionAction::Customize {
                modifications: recorded,
            },
        )
        .await?;

        debug!(session_id = %session_id, fields = ?edited, "Customizations applied");
        Ok(updated)
    }

    /// Generate a character from the session context
    ///
    /// The draft is validated; an invalid draft gets one fix-up round
    /// through the Generation Service and is validated again.
    ///
    /// # Errors
    /// `Generation` if the service fails, `ValidationFailed` if the draft is
    /// still invalid after the fix-up.
    pub async fn generate_character(
        &self,
        session_id: Uuid,
    ) -> Result<CharacterDraft, DiscoveryError> {
        let session = self.active_session(session_id).await?;
        let modifications = session.user_modifications.clone().unwrap_or_default();

        let name = modifications
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHARACTER_NAME.to_string());
        let definition = session.selected_genre.map(taxonomy::genre);
        let genre = definition.map_or(DEFAULT_GENRE_NAME, |d| d.name);
        let archetype = definition
            .zip(session.selected_archetype.as_deref())
            .and_then(|(d, id)| d.archetype(session.selected_subgenre.as_deref(), id))
            .map_or(DEFAULT_ARCHETYPE_NAME, |a| a.name);

        let prompt = creation_prompt(
            &name,
            genre,
            archetype,
            modifications.additional_context.as_deref(),
            session.extracted_character.as_ref(),
        );
        let profile = self
            .extractor
            .generate_profile(&prompt, GenerationOptions::creative())
            .await
            .map_err(|e| DiscoveryError::Generation(e.to_string()))?;

        let confidence = profile
            .confidence
            .unwrap_or(DEFAULT_GENERATED_CONFIDENCE)
            .clamp(0.0, 1.0);
        let mut draft = CharacterDraft {
            name: if modifications.name.is_some() {
                name
            } else {
                non_blank(profile.name.clone()).unwrap_or(name)
            },
            metadata: DraftMetadata {
                source: GENERATED_SOURCE.to_string(),
                extracted_from: session
                    .extracted_character
                    .as_ref()
                    .map(|c| c.metadata.extracted_from.clone())
                    .unwrap_or_default(),
                confidence,
                has_structured_data: false,
            },
            ..Default::default()
        };
        merge_profile(&mut draft, profile);

        let report = self.validator.validate(&draft);
        if !report.valid {
            let errors = report.error_messages();
            warn!(session_id = %session_id, errors = ?errors, "Generated character invalid, attempting fix");
            draft = self.fix_draft(draft, &errors).await?;
        }

        self.progress(
            session_id,
            SessionAction::Generate {
                generated_fields: draft.clone(),
            },
        )
        .await?;
        info!(session_id = %session_id, name = %draft.name, "Character generated");
        Ok(draft)
    }

    /// One fix-up round for an invalid draft
    async fn fix_draft(
        &self,
        draft: CharacterDraft,
        errors: &[String],
    ) -> Result<CharacterDraft, DiscoveryError> {
        let fixed = match self
            .extractor
            .generate_profile(&fix_prompt(&draft, errors), GenerationOptions::creative())
            .await
        {
            Ok(profile) => {
                let mut fixed = draft;
                if let Some(name) = non_blank(profile.name.clone()) {
                    fixed.name = name;
                }
                merge_profile(&mut fixed, profile);
                fixed
            }
            Err(e) => {
                warn!(error = %e, "Fix-up generation failed");
                return Err(DiscoveryError::ValidationFailed(errors.to_vec()));
            }
        };

        let report = self.validator.validate(&fixed);
        if report.valid {
            Ok(fixed)
        } else {
            Err(DiscoveryError::ValidationFailed(report.error_messages()))
        }
    }

    /// Validate the final draft and complete the session
    ///
    /// # Errors
    /// `ValidationFailed` if the draft has validation errors; the session is
    /// left untouched.
    pub async fn finalize(
        &self,
        session_id: Uuid,
        draft: &CharacterDraft,
        character_id: Option<String>,
    ) -> Result<Session, DiscoveryError> {
        self.active_session(session_id).await?;

        let report = self.validator.validate(draft);
        if !report.valid {
            return Err(DiscoveryError::ValidationFailed(report.error_messages()));
        }

        let session = self
            .progress(
                session_id,
                SessionAction::Complete {
                    character_id: character_id
                        .unwrap_or_else(|| PENDING_CHARACTER_ID.to_string()),
                },
            )
            .await?;
        info!(session_id = %session_id, score = report.score, "Session completed");
        Ok(session)
    }

    pub async fn abandon(&self, session_id: Uuid) -> Result<Session, DiscoveryError> {
        let session = self.progress(session_id, SessionAction::Abandon).await?;
        info!(session_id = %session_id, "Session abandoned");
        self.emit(DiscoveryEvent::SessionAbandoned {
            session_id,
            timestamp: Utc::now(),
        });
        Ok(session)
    }

    /// # Errors
    /// `SessionNotFound` for an unknown id.
    pub async fn session(&self, session_id: Uuid) -> Result<Session, DiscoveryError> {
        self.store
            .find_by_id(session_id)
            .await?
            .ok_or(DiscoveryError::SessionNotFound(session_id))
    }

    /// Most recent sessions of a user, newest first
    pub async fn user_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>, DiscoveryError> {
        Ok(self.store.list_by_user(user_id, limit).await?)
    }

    pub async fn session_analytics(
        &self,
        session_id: Uuid,
    ) -> Result<SessionAnalytics, DiscoveryError> {
        let session = self.session(session_id).await?;
        Ok(SessionAnalytics::from(&session))
    }

    /// Existing session that still accepts actions
    async fn active_session(&self, session_id: Uuid) -> Result<Session, DiscoveryError> {
        let session = self.session(session_id).await?;
        if session.is_finished() {
            return Err(DiscoveryError::SessionFinished(session_id));
        }
        Ok(session)
    }

    fn emit(&self, event: DiscoveryEvent) {
        if let Some(events) = &self.events {
            events.emit_lossy(event);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
