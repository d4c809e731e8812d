//! Route definitions for rating feedback.
//!
//! Mounted at `/feedback` by `api_routes()`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::feedback;
use crate::state::AppState;

/// ```text
/// GET    /                  -> list_feedback
/// POST   /                  -> save_feedback
/// DELETE /{prompt_name}     -> delete_feedback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(feedback::list_feedback).post(feedback::save_feedback),
        )
        .route("/{prompt_name}", delete(feedback::delete_feedback))
}
