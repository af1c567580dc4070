//! Result Cache
//!
//! TTL key-value store for routed search results. Keys are built from the
//! genre and the normalised query (`lowercase(trim(query))`), so cosmetic
//! differences in the query hit the same entry. Entries are only ever
//! invalidated by expiry; the memory cache drops expired entries on write.

use crate::types::{GenreId, SearchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default time-to-live for cached search results
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache key for a `(query, genre)` pair
pub fn cache_key(query: &str, genre: GenreId) -> String {
    format!("{}:{}", genre.as_str(), query.trim().to_lowercase())
}

/// Search result cache contract
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Cached results, or `None` on miss or expiry
    async fn get(&self, query: &str, genre: GenreId) -> Option<Vec<SearchResult>>;

    /// Store results under `(query, genre)` for `ttl`
    async fn set(&self, query: &str, genre: GenreId, results: &[SearchResult], ttl: Duration);
}

struct CacheEntry {
    results: Vec<SearchResult>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local cache
///
/// Concurrent writers on the same key simply replace each other; the value
/// is always a complete result list.
#[derive(Default)]
pub struct MemoryResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries
    pub async fn purge_expired(&self) -> usize {
        purge(&mut *self.entries.write().await, Instant::now())
    }
}

fn purge(entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_live(now));
    before - entries.len()
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, query: &str, genre: GenreId) -> Option<Vec<SearchResult>> {
        let key = cache_key(query, genre);
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.results.clone())
    }

    async fn set(&self, query: &str, genre: GenreId, results: &[SearchResult], ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            results: results.to_vec(),
            expires_at: now.checked_add(ttl),
        };

        let mut entries = self.entries.write().await;
        let purged = purge(&mut entries, now);
        if purged > 0 {
            tracing::debug!(purged, "Expired search results dropped");
        }
        entries.insert(cache_key(query, genre), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SearchResult> {
        vec![SearchResult::new("anilist", "17", "Naruto Uzumaki")]
    }

    #[test]
    fn test_key_normalisation() {
        assert_eq!(cache_key("  NaRuTo ", GenreId::Roleplay), "roleplay:naruto");
        assert_ne!(
            cache_key("naruto", GenreId::Roleplay),
            cache_key("naruto", GenreId::Romance)
        );
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryResultCache::new();
        assert!(cache.get("naruto", GenreId::Roleplay).await.is_none());

        cache
            .set("Naruto", GenreId::Roleplay, &sample(), DEFAULT_TTL)
            .await;

        let hit = cache.get("naruto ", GenreId::Roleplay).await.unwrap();
        assert_eq!(hit[0].name, "Naruto Uzumaki");
        assert!(cache.get("naruto", GenreId::Gaming).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryResultCache::new();
        cache
            .set("naruto", GenreId::Roleplay, &sample(), Duration::from_secs(60))
            .await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("naruto", GenreId::Roleplay).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("naruto", GenreId::Roleplay).await.is_none());
        assert_eq!(cache.purge_expired().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_drop_expired_entries() {
        let cache = MemoryResultCache::new();
        for query in ["naruto", "sasuke", "sakura"] {
            cache
                .set(query, GenreId::Roleplay, &sample(), Duration::from_secs(60))
                .await;
        }
        assert_eq!(cache.len().await, 3);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache
            .set("kakashi", GenreId::Roleplay, &sample(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("kakashi", GenreId::Roleplay).await.is_some());
    }

    #[tokio::test]
    async fn test_unbounded_ttl_never_expires() {
        let cache = MemoryResultCache::new();
        cache
            .set("naruto", GenreId::Roleplay, &sample(), Duration::MAX)
            .await;

        assert!(cache.get("naruto", GenreId::Roleplay).await.is_some());
        assert_eq!(cache.purge_expired().await, 0);
    }
}
