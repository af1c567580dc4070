//! persona-discovery library interface
//!
//! Character discovery: genre-aware search across external sources,
//! extraction of character drafts from the candidates, and the session
//! state machine that walks a user from genre pick to a finished character.
//!
//! Source adapters, the Generation Service and the Session Store are
//! injected collaborators; [`assemble`] wires them together from a
//! [`DiscoveryConfig`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod search;
pub mod session;
pub mod taxonomy;
pub mod types;

pub use crate::config::DiscoveryConfig;
pub use crate::error::{ApiError, ApiResult, DiscoveryError};
pub use crate::extraction::{CharacterDraft, CharacterExtractor, GenerationService};
pub use crate::search::{MemoryResultCache, ResultCache, SearchOutcome, SearchRouter};
pub use crate::session::{DiscoveryOrchestrator, Session, SessionAction, SessionStore};
pub use crate::types::{GenreId, SearchOptions, SearchResult, SourceAdapter};

use axum::Router;
use chrono::{DateTime, Utc};
use persona_common::EventBus;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DiscoveryOrchestrator>,
    /// Analytics event bus
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<DiscoveryOrchestrator>, event_bus: EventBus) -> Self {
        Self {
            orchestrator,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build the orchestrator and its router from configuration
///
/// The router and orchestrator both emit on `events`.
pub fn assemble(
    config: &DiscoveryConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<dyn ResultCache>,
    generation: Arc<dyn GenerationService>,
    store: Arc<dyn SessionStore>,
    events: EventBus,
) -> DiscoveryOrchestrator {
    let router = SearchRouter::new(
        adapters,
        config.genre_priorities(),
        cache,
        config.router_settings(),
    )
    .with_events(events.clone());
    let extractor = CharacterExtractor::new(generation);

    DiscoveryOrchestrator::new(Arc::new(router), Arc::new(extractor), store).with_events(events)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::search_routes())
        .merge(api::genre_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP API until the listener fails
///
/// Sessions persist in the SQLite store at `config.database.url`; the
/// service listens on `config.server.bind`.
pub async fn serve(
    config: DiscoveryConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    generation: Arc<dyn GenerationService>,
) -> anyhow::Result<()> {
    let pool = db::init_database_pool(&config.database.url).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(config.events.capacity);
    let orchestrator = assemble(
        &config,
        adapters,
        Arc::new(MemoryResultCache::new()),
        generation,
        Arc::new(db::SqliteSessionStore::new(pool)),
        event_bus.clone(),
    );
    let app = build_router(AppState::new(Arc::new(orchestrator), event_bus));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Listening on http://{}", config.server.bind);
    info!("Health check: http://{}/health", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
