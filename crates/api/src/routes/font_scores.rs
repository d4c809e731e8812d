//! Route definitions for font score events.
//!
//! Mounted at `/font-scores` by `api_routes()` on the PostgreSQL backend.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::font_scores;
use crate::state::AppState;

/// ```text
/// POST   /                  -> save_font_score
/// GET    /                  -> list_font_scores
/// GET    /stats             -> font_score_stats
/// GET    /prompt/{prompt}   -> list_font_scores_by_prompt
/// DELETE /{id}              -> delete_font_score
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(font_scores::list_font_scores).post(font_scores::save_font_score),
        )
        .route("/stats", get(font_scores::font_score_stats))
        .route("/prompt/{prompt}", get(font_scores::list_font_scores_by_prompt))
        .route("/{id}", delete(font_scores::delete_font_score))
}
