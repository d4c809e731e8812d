//! Handlers for the `/font-scores` resource.
//!
//! Rich per-event score rows with client metadata and per-user analytics.
//! Only mounted on the PostgreSQL backend.

use axum::extract::{Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use fonteval_core::error::CoreError;
use fonteval_core::types::DbId;
use fonteval_db::models::font_score::{ClientMetadata, CreateFontScore};
use fonteval_db::repositories::FontScoreRepo;
use fonteval_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::query::UsernameParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn pool(state: &AppState) -> AppResult<&DbPool> {
    state
        .pool
        .as_ref()
        .ok_or_else(|| AppError::InternalError("font score routes need a database pool".into()))
}

/// Client address and agent as seen through the proxy headers.
fn client_metadata(headers: &HeaderMap) -> ClientMetadata {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .or_else(|| header("x-real-ip"));
    let user_agent = header(USER_AGENT.as_str());

    ClientMetadata {
        ip_address,
        user_agent,
    }
}

// ---------------------------------------------------------------------------
// POST /font-scores
// ---------------------------------------------------------------------------

/// Save a score event. Re-scoring the same font for the same prompt
/// updates the existing row.
pub async fn save_font_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateFontScore>,
) -> AppResult<impl IntoResponse> {
    let (input, score) = input.normalized()?;
    let meta = client_metadata(&headers);

    let (row, inserted) = FontScoreRepo::upsert(pool(&state)?, &input, &meta).await?;
    tracing::info!(
        id = row.id,
        username = %row.username,
        prompt = %row.prompt,
        font_key = %row.font_md5,
        score = %score,
        inserted,
        "Font score saved",
    );

    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: row })))
}

// ---------------------------------------------------------------------------
// GET /font-scores?username=U
// ---------------------------------------------------------------------------

/// All of one user's score events, newest first.
pub async fn list_font_scores(
    State(state): State<AppState>,
    Query(params): Query<UsernameParams>,
) -> AppResult<impl IntoResponse> {
    let username = params.require()?;
    let scores = FontScoreRepo::list_for_user(pool(&state)?, username).await?;
    Ok(Json(DataResponse { data: scores }))
}

// ---------------------------------------------------------------------------
// GET /font-scores/stats?username=U
// ---------------------------------------------------------------------------

pub async fn font_score_stats(
    State(state): State<AppState>,
    Query(params): Query<UsernameParams>,
) -> AppResult<impl IntoResponse> {
    let username = params.require()?;
    let stats = FontScoreRepo::stats(pool(&state)?, username).await?;
    Ok(Json(DataResponse { data: stats }))
}

// ---------------------------------------------------------------------------
// GET /font-scores/prompt/{prompt}?username=U
// ---------------------------------------------------------------------------

pub async fn list_font_scores_by_prompt(
    State(state): State<AppState>,
    Path(prompt): Path<String>,
    Query(params): Query<UsernameParams>,
) -> AppResult<impl IntoResponse> {
    let username = params.require()?;
    let scores = FontScoreRepo::list_by_prompt(pool(&state)?, username, &prompt).await?;
    Ok(Json(DataResponse { data: scores }))
}

// ---------------------------------------------------------------------------
// DELETE /font-scores/{id}?username=U
// ---------------------------------------------------------------------------

/// Delete one score event. Another user's row is reported as not found.
pub async fn delete_font_score(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<UsernameParams>,
) -> AppResult<StatusCode> {
    let username = params.require()?;
    if !FontScoreRepo::delete_by_id(pool(&state)?, username, id).await? {
        return Err(CoreError::NotFound {
            entity: "FontScore",
            key: id.to_string(),
        }
        .into());
    }
    tracing::info!(id, username = %username, "Font score deleted");
    Ok(StatusCode::NO_CONTENT)
}
