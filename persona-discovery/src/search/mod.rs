//! Multi-source search
//!
//! - `router`: genre-aware routing with fallback, parallel and aggregated modes
//! - `scorer`: query to candidate-name similarity
//! - `cache`: TTL result cache
//! - `timeout`: deadline guard for adapter calls
//! - `rate_limiter`: per-source admission control

pub mod cache;
pub mod rate_limiter;
pub mod router;
pub mod scorer;
pub mod timeout;

pub use cache::{MemoryResultCache, ResultCache};
pub use router::{SearchOutcome, SearchRouter};
pub use timeout::{CallOutcome, TimeoutGuard};
