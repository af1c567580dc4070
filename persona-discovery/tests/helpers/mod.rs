//! Test Helper Utilities
//!
//! Shared utilities for testing persona-discovery

#![allow(dead_code, unused_imports)]

pub mod log_capture;
pub mod stub_generation;
pub mod stub_sources;

pub use log_capture::{capture_logs, LogCapture};
pub use stub_generation::ScriptedGeneration;
pub use stub_sources::{naruto_candidate, StubAdapter};

use persona_discovery::config::{GenrePriorities, RouterSettings, SourcePriority};
use persona_discovery::types::GenreId;
use std::time::Duration;

/// Router settings with short deadlines and no fallback unless given
pub fn fast_settings(fallback: Option<&str>) -> RouterSettings {
    RouterSettings {
        search_timeout: Duration::from_millis(200),
        details_timeout: Duration::from_millis(200),
        fallback_source: fallback.map(str::to_string),
        ..RouterSettings::default()
    }
}

/// Priority table with one genre listing `sources` in descending priority
pub fn priorities(genre: GenreId, sources: &[&str]) -> GenrePriorities {
    let count = sources.len() as u32;
    let list = sources
        .iter()
        .enumerate()
        .map(|(i, id)| SourcePriority::new(*id, count - i as u32))
        .collect();
    GenrePriorities::empty().with(genre, list)
}

use persona_common::EventBus;
use persona_discovery::extraction::{CharacterExtractor, GenerationService};
use persona_discovery::search::{MemoryResultCache, SearchRouter};
use persona_discovery::session::{DiscoveryOrchestrator, MemorySessionStore, SessionStore};
use persona_discovery::types::SourceAdapter;
use std::sync::Arc;

/// Orchestrator over in-memory collaborators, routing `genre` to `adapters`
/// in the given order
pub fn orchestrator(
    genre: GenreId,
    adapters: Vec<Arc<StubAdapter>>,
    generation: Arc<dyn GenerationService>,
    store: Arc<dyn SessionStore>,
) -> (DiscoveryOrchestrator, EventBus) {
    let order: Vec<String> = adapters.iter().map(|a| a.source_id().to_string()).collect();
    let order: Vec<&str> = order.iter().map(String::as_str).collect();
    let adapters: Vec<Arc<dyn SourceAdapter>> = adapters
        .into_iter()
        .map(|a| a as Arc<dyn SourceAdapter>)
        .collect();

    let events = EventBus::new(64);
    let router = SearchRouter::new(
        adapters,
        priorities(genre, &order),
        Arc::new(MemoryResultCache::new()),
        fast_settings(None),
    )
    .with_events(events.clone());
    let orchestrator = DiscoveryOrchestrator::new(
        Arc::new(router),
        Arc::new(CharacterExtractor::new(generation)),
        store,
    )
    .with_events(events.clone());

    (orchestrator, events)
}

pub fn memory_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new())
}
