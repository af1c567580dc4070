//! Session state machine
//!
//! `transition` is a pure function from a session and an action to the
//! partial update the action implies. `progress_update` wraps it with time
//! accounting and the interaction log entry; the orchestrator persists the
//! result.

use crate::error::DiscoveryError;
use crate::session::model::{
    CharacterType, InteractionEvent, Session, SessionAction, SessionStep, SessionUpdate,
};
use crate::taxonomy;
use chrono::{DateTime, Utc};

/// Compute the update an action applies to a session
///
/// # Errors
/// `SessionFinished` if the session is already completed or abandoned,
/// `MalformedAction` for a subgenre or archetype outside the genre catalogue.
pub fn transition(
    session: &Session,
    action: &SessionAction,
    now: DateTime<Utc>,
) -> Result<SessionUpdate, DiscoveryError> {
    if session.is_finished() {
        return Err(DiscoveryError::SessionFinished(session.id));
    }

    let update = match action {
        SessionAction::SelectGenre {
            genre,
            subgenre,
            archetype,
        } => {
            taxonomy::check_selection(*genre, subgenre.as_deref(), archetype.as_deref())
                .map_err(DiscoveryError::MalformedAction)?;
            SessionUpdate {
                selected_genre: Some(*genre),
                selected_subgenre: subgenre.clone(),
                selected_archetype: archetype.clone(),
                current_step: Some(SessionStep::Type),
                ..Default::default()
            }
        }

        SessionAction::SelectType { kind } => SessionUpdate {
            character_type: Some(*kind),
            current_step: Some(match kind {
                CharacterType::Existing => SessionStep::Search,
                CharacterType::Original => SessionStep::Customize,
            }),
            ..Default::default()
        },

        SessionAction::Search { query, results } => SessionUpdate {
            search_query: Some(query.clone()),
            search_results: Some(results.clone()),
            current_step: Some(SessionStep::Search),
            ..Default::default()
        },

        SessionAction::SelectResult { result, draft } => SessionUpdate {
            selected_result: Some(result.clone()),
            extracted_character: Some(draft.clone()),
            current_step: Some(SessionStep::Customize),
            ..Default::default()
        },

        SessionAction::Customize { modifications } => SessionUpdate {
            user_modifications: Some(modifications.clone()),
            current_step: Some(SessionStep::Review),
            ..Default::default()
        },

        SessionAction::Generate { generated_fields } => SessionUpdate {
            ai_generated_fields: Some(generated_fields.clone()),
            current_step: Some(SessionStep::Review),
            ..Default::default()
        },

        SessionAction::Complete { character_id } => SessionUpdate {
            completed_at: Some(now),
            result_character_id: Some(character_id.clone()),
            current_step: Some(SessionStep::Review),
            ..Default::default()
        },

        SessionAction::Abandon => SessionUpdate {
            abandoned_at: Some(now),
            current_step: Some(SessionStep::Review),
            ..Default::default()
        },
    };

    Ok(update)
}

/// Milliseconds since the last logged event, `None` before the first one
pub fn elapsed_ms(session: &Session, now: DateTime<Utc>) -> Option<u64> {
    let last = session.interaction_events.last()?;
    Some((now - last.timestamp).num_milliseconds().max(0) as u64)
}

/// Full update for one `progress` call
///
/// Elapsed time is charged to the step the session was on before the
/// action, then the transition is applied and the action logged. The first
/// action of a session charges nothing.
pub fn progress_update(
    session: &Session,
    action: &SessionAction,
    now: DateTime<Utc>,
) -> Result<SessionUpdate, DiscoveryError> {
    let time_spent = elapsed_ms(session, now).map(|ms| (session.current_step, ms));

    let mut update = transition(session, action, now)?;
    update.time_spent = time_spent;
    update.event = Some(InteractionEvent {
        kind: action.name().to_string(),
        timestamp: now,
        data: action.payload(),
    });
    update.updated_at = Some(now);
    Ok(update)
}
