//! HTTP API handlers for persona-discovery

pub mod genres;
pub mod health;
pub mod search;
pub mod sessions;

pub use genres::genre_routes;
pub use health::health_routes;
pub use search::search_routes;
pub use sessions::session_routes;
