pub mod auth;
pub mod feedback;
pub mod font_scores;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /login                                  login (POST)
///
/// /feedback                               list (?username=), upsert (POST)
/// /feedback/{prompt_name}                 reset prompt (DELETE, ?username=)
///
/// /font-scores                            save (POST), list (?username=)
/// /font-scores/stats                      aggregate statistics
/// /font-scores/prompt/{prompt}            list for one prompt
/// /font-scores/{id}                       delete (DELETE, ?username=)
/// ```
///
/// The `/font-scores` tree is only mounted when `include_font_scores` is
/// set, i.e. on the PostgreSQL backend.
pub fn api_routes(include_font_scores: bool) -> Router<AppState> {
    let router = Router::new()
        .merge(auth::router())
        .nest("/feedback", feedback::router());

    if include_font_scores {
        router.nest("/font-scores", font_scores::router())
    } else {
        router
    }
}
