//! Search Router
//!
//! Routes a query to the source adapters configured for its genre.
//!
//! Sequential `search`:
//! 1. Result Cache lookup; a non-empty hit is re-scored against the current
//!    query and returned with `cached = true`
//! 2. Adapters in descending priority, one at a time, each behind the rate
//!    limiter and the Timeout Guard. The first adapter with at least one
//!    result wins; later adapters are never called
//! 3. The generic fallback source, with a reduced limit, if no adapter in the
//!    priority list produced anything
//!
//! `search_parallel` / `search_aggregated` query every adapter of the genre
//! concurrently and join them all. Per-source failures never fail the call.

use crate::config::{GenrePriorities, RouterSettings};
use crate::error::DiscoveryError;
use crate::search::cache::ResultCache;
use crate::search::rate_limiter::SourceRateLimiter;
use crate::search::scorer;
use crate::search::timeout::{CallOutcome, TimeoutGuard};
use crate::types::{GenreId, SearchOptions, SearchResult, SourceAdapter};
use chrono::Utc;
use futures::future::join_all;
use persona_common::events::{DiscoveryEvent, EventBus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result of a routed search
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// True if served from the Result Cache
    pub cached: bool,
}

/// Genre-aware search orchestrator
pub struct SearchRouter {
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    priorities: GenrePriorities,
    cache: Arc<dyn ResultCache>,
    limiter: SourceRateLimiter,
    settings: RouterSettings,
    events: Option<EventBus>,
}

impl SearchRouter {
    /// Build a router over `adapters`
    ///
    /// Each adapter's quota is registered with the rate limiter. An adapter id
    /// registered twice keeps the last instance.
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        priorities: GenrePriorities,
        cache: Arc<dyn ResultCache>,
        settings: RouterSettings,
    ) -> Self {
        let mut limiter = SourceRateLimiter::new();
        let mut by_id = HashMap::new();

        for adapter in adapters {
            let source_id = adapter.source_id().to_string();
            limiter.register(&source_id, adapter.rate_limit());
            by_id.insert(source_id, adapter);
        }

        info!(
            sources = by_id.len(),
            fallback = settings.fallback_source.as_deref().unwrap_or("none"),
            "Search router initialised"
        );

        Self {
            adapters: by_id,
            priorities,
            cache,
            limiter,
            settings,
            events: None,
        }
    }

    /// Emit `SearchCompleted` analytics on this bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Sequential first-success-wins search
    ///
    /// Never fails: unavailable data yields an empty, uncached outcome.
    pub async fn search(
        &self,
        query: &str,
        genre: GenreId,
        options: &SearchOptions,
    ) -> SearchOutcome {
        if let Some(cached) = self.cache.get(query, genre).await {
            if !cached.is_empty() {
                debug!(query = %query, genre = %genre, count = cached.len(), "Cache hit");
                let results = scorer::rank(query, cached);
                return self.completed(query, genre, results, true);
            }
        }

        let sources = self.sources_for_genre(genre);
        info!(
            query = %query,
            genre = %genre,
            sources = sources.len(),
            "Routing search"
        );

        let mut attempted: HashSet<&str> = HashSet::new();
        for adapter in &sources {
            attempted.insert(adapter.source_id());
            if let Some(results) = self.try_source(adapter.as_ref(), query, options).await {
                return self.store(query, genre, results).await;
            }
        }

        if let Some(fallback_id) = self.settings.fallback_source.as_deref() {
            if attempted.contains(fallback_id) {
                debug!(source_id = %fallback_id, "Fallback source already tried");
            } else if let Some(adapter) = self.adapters.get(fallback_id) {
                info!(source_id = %fallback_id, query = %query, "All sources exhausted, trying fallback");
                let fallback_options = SearchOptions {
                    limit: Some(self.settings.fallback_limit),
                    page: None,
                };
                if let Some(results) = self
                    .try_source(adapter.as_ref(), query, &fallback_options)
                    .await
                {
                    return self.store(query, genre, results).await;
                }
            } else {
                debug!(source_id = %fallback_id, "Fallback source not registered");
            }
        }

        warn!(query = %query, genre = %genre, "No results from any source");
        self.completed(query, genre, Vec::new(), false)
    }

    /// Query every adapter of the genre concurrently
    ///
    /// Returns raw (unscored) results per source. Sources that fail or time
    /// out map to an empty list.
    pub async fn search_parallel(
        &self,
        query: &str,
        genre: GenreId,
        options: &SearchOptions,
    ) -> HashMap<String, Vec<SearchResult>> {
        self.gather(query, genre, options).await.into_iter().collect()
    }

    /// Concurrent search merged into one ranked, de-duplicated list
    ///
    /// Duplicates are detected by case-insensitive name; the first
    /// occurrence (in priority order) wins. Truncated to `options.limit`,
    /// or the configured aggregate limit.
    pub async fn search_aggregated(
        &self,
        query: &str,
        genre: GenreId,
        options: &SearchOptions,
    ) -> Vec<SearchResult> {
        let per_source = self.gather(query, genre, options).await;
        let flattened = per_source.into_iter().flat_map(|(_, results)| results);

        let mut ranked = scorer::rank(query, dedupe_by_name(flattened));
        ranked.truncate(options.limit.unwrap_or(self.settings.aggregate_limit));

        debug!(query = %query, genre = %genre, count = ranked.len(), "Aggregated search finished");
        ranked
    }

    /// Fetch one entity from a named source
    ///
    /// # Errors
    /// `UnknownSource` if no adapter is registered under `source_id`. Adapter
    /// failures and timeouts are logged and yield `Ok(None)`.
    pub async fn get_details(
        &self,
        source_id: &str,
        external_id: &str,
    ) -> Result<Option<SearchResult>, DiscoveryError> {
        let adapter = self
            .adapters
            .get(source_id)
            .ok_or_else(|| DiscoveryError::UnknownSource(source_id.to_string()))?;

        self.limiter.acquire(source_id).await;
        let guard = TimeoutGuard::new(self.settings.details_timeout);
        let started = Instant::now();

        match guard.run(adapter.get_details(external_id)).await {
            CallOutcome::Completed(details) => {
                debug!(
                    source_id = %source_id,
                    external_id = %external_id,
                    found = details.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Details fetched"
                );
                Ok(details)
            }
            CallOutcome::Failed(e) => {
                warn!(source_id = %source_id, external_id = %external_id, error = %e, "Details fetch failed");
                Ok(None)
            }
            CallOutcome::TimedOut(elapsed) => {
                warn!(
                    source_id = %source_id,
                    external_id = %external_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Details fetch timed out"
                );
                Ok(None)
            }
        }
    }

    /// Check every registered source
    ///
    /// A check that exceeds the details deadline counts as disconnected.
    pub async fn test_all_sources(&self) -> BTreeMap<String, bool> {
        let guard = TimeoutGuard::new(self.settings.details_timeout);
        let checks = self.adapters.iter().map(|(id, adapter)| async move {
            let connected = guard
                .run(async { Ok(adapter.test_connection().await) })
                .await
                .completed()
                .unwrap_or(false);
            if !connected {
                warn!(source_id = %id, "Source connectivity check failed");
            }
            (id.clone(), connected)
        });

        join_all(checks).await.into_iter().collect()
    }

    /// Registered adapters of `genre`, highest priority first
    ///
    /// Configured ids without a registered adapter are skipped.
    pub fn sources_for_genre(&self, genre: GenreId) -> Vec<Arc<dyn SourceAdapter>> {
        self.priorities
            .ordered_sources(genre)
            .into_iter()
            .filter_map(|id| {
                let adapter = self.adapters.get(id);
                if adapter.is_none() {
                    debug!(source_id = %id, genre = %genre, "Configured source not registered");
                }
                adapter.cloned()
            })
            .collect()
    }

    pub fn source(&self, source_id: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(source_id).cloned()
    }

    /// Ids of all registered sources, sorted
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// One rate-limited, deadline-guarded adapter search
    ///
    /// `Some` only for a non-empty result list.
    async fn try_source(
        &self,
        adapter: &dyn SourceAdapter,
        query: &str,
        options: &SearchOptions,
    ) -> Option<Vec<SearchResult>> {
        let source_id = adapter.source_id();
        self.limiter.acquire(source_id).await;

        debug!(source_id = %source_id, query = %query, "Trying source");
        let guard = TimeoutGuard::new(self.settings.search_timeout);
        let started = Instant::now();

        match guard.run(adapter.search(query, options)).await {
            CallOutcome::Completed(results) if !results.is_empty() => {
                info!(
                    source_id = %source_id,
                    count = results.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Source returned results"
                );
                Some(results)
            }
            CallOutcome::Completed(_) => {
                debug!(source_id = %source_id, "No results from source");
                None
            }
            CallOutcome::Failed(e) => {
                warn!(source_id = %source_id, error = %e, "Source search failed");
                None
            }
            CallOutcome::TimedOut(elapsed) => {
                warn!(
                    source_id = %source_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Source search timed out"
                );
                None
            }
        }
    }

    /// Concurrent per-source search in priority order
    async fn gather(
        &self,
        query: &str,
        genre: GenreId,
        options: &SearchOptions,
    ) -> Vec<(String, Vec<SearchResult>)> {
        let sources = self.sources_for_genre(genre);
        debug!(query = %query, genre = %genre, sources = sources.len(), "Parallel search");

        let calls = sources.iter().map(|adapter| async move {
            let source_id = adapter.source_id().to_string();
            let results = self
                .try_source(adapter.as_ref(), query, options)
                .await
                .unwrap_or_default();
            (source_id, results)
        });

        join_all(calls).await
    }

    /// Score, cache and return fresh results
    async fn store(&self, query: &str, genre: GenreId, results: Vec<SearchResult>) -> SearchOutcome {
        let ranked = scorer::rank(query, results);
        self.cache
            .set(query, genre, &ranked, self.settings.cache_ttl)
            .await;
        self.completed(query, genre, ranked, false)
    }

    fn completed(
        &self,
        query: &str,
        genre: GenreId,
        results: Vec<SearchResult>,
        cached: bool,
    ) -> SearchOutcome {
        if let Some(events) = &self.events {
            events.emit_lossy(DiscoveryEvent::SearchCompleted {
                query: query.to_string(),
                genre: genre.to_string(),
                result_count: results.len(),
                cached,
                timestamp: Utc::now(),
            });
        }
        SearchOutcome { results, cached }
    }
}

/// Keep the first result for each case-insensitive name
fn dedupe_by_name(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.name.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let results = vec![
            SearchResult::new("anilist", "1", "Naruto Uzumaki"),
            SearchResult::new("mal", "9", "naruto uzumaki "),
            SearchResult::new("mal", "10", "Sasuke Uchiha"),
        ];

        let unique = dedupe_by_name(results);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source, "anilist");
        assert_eq!(unique[1].name, "Sasuke Uchiha");
    }
}
