//! Programmable source adapters

use async_trait::async_trait;
use persona_discovery::types::{
    GenreId, RateLimit, SearchOptions, SearchResult, SourceAdapter, SourceError, SourceMetadata,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Adapter returning canned results, with call counting
pub struct StubAdapter {
    id: String,
    genres: Vec<GenreId>,
    results: Vec<SearchResult>,
    fail: bool,
    delay: Option<Duration>,
    rate_limit: RateLimit,
    connected: bool,
    calls: AtomicUsize,
    last_limit: Mutex<Option<usize>>,
}

impl StubAdapter {
    pub fn new(id: &str, genres: &[GenreId]) -> Self {
        Self {
            id: id.to_string(),
            genres: genres.to_vec(),
            results: Vec::new(),
            fail: false,
            delay: None,
            rate_limit: RateLimit::unlimited(),
            connected: true,
            calls: AtomicUsize::new(0),
            last_limit: Mutex::new(None),
        }
    }

    /// Return results named `names`
    pub fn returning(mut self, names: &[&str]) -> Self {
        self.results = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                SearchResult::new(self.id.clone(), (i + 1).to_string(), *name)
                    .with_description(format!("{} from {}", name, self.id))
            })
            .collect();
        self
    }

    pub fn returning_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.rate_limit = limit;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `limit` of the most recent search call
    pub fn last_limit(&self) -> Option<usize> {
        *self.last_limit.lock().unwrap()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SourceAdapter for StubAdapter {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn supported_genres(&self) -> &[GenreId] {
        &self.genres
    }

    fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    async fn search(
        &self,
        _query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = options.limit;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Network(format!("{} unreachable", self.id)));
        }
        Ok(self.results.clone())
    }

    async fn get_details(&self, external_id: &str) -> Result<Option<SearchResult>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Api(format!("{} returned 500", self.id)));
        }
        Ok(self
            .results
            .iter()
            .find(|r| r.external_id == external_id)
            .cloned())
    }

    async fn test_connection(&self) -> bool {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.connected
    }
}

/// Structured anime candidate: 300-char description, age and gender
pub fn naruto_candidate(source: &str) -> SearchResult {
    let mut description = String::from(
        "Naruto Uzumaki is a loyal and energetic young ninja from the Hidden Leaf Village \
         who dreams of becoming Hokage. Despite a lonely childhood he stays cheerful, \
         determined and brave, protecting his friends at any cost.",
    );
    while description.chars().count() < 300 {
        description.push_str(" He never gives up.");
    }
    let description: String = description.chars().take(300).collect();

    SearchResult::new(source, "17", "Naruto Uzumaki")
        .with_description(description)
        .with_metadata(SourceMetadata {
            age: Some("17".to_string()),
            gender: Some("male".to_string()),
            franchise: Some("Naruto".to_string()),
            ..Default::default()
        })
}
