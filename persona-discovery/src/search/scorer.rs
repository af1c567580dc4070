//! Match Scorer
//!
//! Computes how well a candidate's name (or any of its alternate names)
//! matches the user's query. Scores are in `[0.0, 1.0]`:
//!
//! - Exact match of the query to any name: `1.0`. Both sides are trimmed and
//!   lowercased first, so the comparison ignores case and surrounding
//!   whitespace
//! - Otherwise Jaro similarity with a Winkler boost for a shared prefix of up
//!   to 4 characters: `jaro + min(prefix, 4) * 0.1 * (1 - jaro)`
//! - If the name contains the query, a containment score
//!   `0.7 + (len(query) / len(name)) * 0.3` competes with Jaro-Winkler
//! - The best score over the primary and all alternate names wins
//!
//! The scorer is pure and deterministic.

use crate::types::SearchResult;

/// Winkler prefix scaling factor
const PREFIX_SCALE: f64 = 0.1;

/// Longest prefix rewarded by the Winkler boost
const MAX_PREFIX: usize = 4;

/// Floor of the containment score
const CONTAINMENT_BASE: f64 = 0.7;

/// Share of the containment score driven by query/name length ratio
const CONTAINMENT_SPAN: f64 = 0.3;

/// Score a query against a candidate name and its alternate names
pub fn score(query: &str, name: &str, alternate_names: &[&str]) -> f32 {
    let query = normalize(query);

    let names: Vec<String> = std::iter::once(name)
        .chain(alternate_names.iter().copied())
        .map(normalize)
        .collect();

    if names.iter().any(|n| *n == query) {
        return 1.0;
    }

    let best = names
        .iter()
        .map(|n| score_name(&query, n))
        .fold(0.0_f64, f64::max);

    best.clamp(0.0, 1.0) as f32
}

/// Score every result against the query and sort best-first
///
/// The computed score replaces each result's `confidence`. Ties keep their
/// incoming order.
pub fn rank(query: &str, results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut ranked: Vec<SearchResult> = results
        .into_iter()
        .map(|mut result| {
            result.confidence = score(query, &result.name, &result.alternate_names());
            result
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

/// Jaro-Winkler similarity with the prefix capped at 4 characters
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let jaro = strsim::jaro(a, b);
    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .take(MAX_PREFIX)
        .count();

    jaro + prefix as f64 * PREFIX_SCALE * (1.0 - jaro)
}

/// Score one normalized query against one normalized name
fn score_name(query: &str, name: &str) -> f64 {
    let mut best = jaro_winkler(query, name);

    if name.contains(query) {
        let name_len = name.chars().count();
        if name_len > 0 {
            let ratio = query.chars().count() as f64 / name_len as f64;
            best = best.max(CONTAINMENT_BASE + ratio * CONTAINMENT_SPAN);
        }
    }

    best
}

/// Lowercase with surrounding whitespace removed
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
