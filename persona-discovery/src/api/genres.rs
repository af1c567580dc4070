//! Genre catalogue API
//!
//! GET /genres, GET /genres/:genre

use axum::{extract::Path, routing::get, Json, Router};

use crate::taxonomy::{self, GenreDefinition};
use crate::types::GenreId;
use crate::AppState;

/// GET /genres
pub async fn list_genres() -> Json<Vec<&'static GenreDefinition>> {
    Json(taxonomy::all().collect())
}

/// GET /genres/:genre
pub async fn get_genre(Path(genre): Path<GenreId>) -> Json<&'static GenreDefinition> {
    Json(taxonomy::genre(genre))
}

pub fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/genres", get(list_genres))
        .route("/genres/:genre", get(get_genre))
}
