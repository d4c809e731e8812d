//! Handlers for the `/feedback` resource.
//!
//! These sit on the abstract [`FeedbackStore`](fonteval_db::FeedbackStore),
//! so they behave the same on either backend.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fonteval_core::rating::{validate_rating, RatingRecord, UserFeedback};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::query::UsernameParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /feedback`.
///
/// `feedback_data` stays untyped until the envelope prompt has been merged
/// in, so a malformed record is a 400 rather than an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFeedbackRequest {
    #[serde(default)]
    pub prompt_name: String,
    pub feedback_data: Value,
}

#[derive(Debug, Serialize)]
pub struct DeleteFeedbackResponse {
    pub prompt_name: String,
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// GET /feedback?username=U
// ---------------------------------------------------------------------------

/// All of one user's ratings, grouped by prompt.
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(params): Query<UsernameParams>,
) -> AppResult<Json<DataResponse<UserFeedback>>> {
    let username = params.require()?;
    let feedback = state.store.list_for_user(username).await?;
    Ok(Json(DataResponse { data: feedback }))
}

// ---------------------------------------------------------------------------
// POST /feedback
// ---------------------------------------------------------------------------

/// Insert or replace one rating. 201 when the slot was new, 200 otherwise.
pub async fn save_feedback(
    State(state): State<AppState>,
    Json(input): Json<SaveFeedbackRequest>,
) -> AppResult<impl IntoResponse> {
    let mut record = merge_record(&input.prompt_name, input.feedback_data)?;
    if record.prompt_id.is_none() {
        record.prompt_id = state.catalog.prompt_id(&record.prompt_name);
    }
    validate_rating(&record)?;

    let outcome = state.store.upsert(&record).await?;
    tracing::info!(
        username = %record.username,
        prompt = %record.prompt_name,
        font_key = %record.font_key,
        score = %record.score,
        is_new = outcome.is_new,
        "Rating saved",
    );

    let status = if outcome.is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: outcome })))
}

/// Decode `feedback_data`, taking its prompt from the envelope when the
/// record leaves it out. The stored prompt name is always the trimmed one.
fn merge_record(prompt_name: &str, mut data: Value) -> AppResult<RatingRecord> {
    let prompt_name = prompt_name.trim();
    if prompt_name.is_empty() {
        return Err(AppError::BadRequest("promptName is required".into()));
    }

    let Some(fields) = data.as_object_mut() else {
        return Err(AppError::BadRequest("feedbackData must be an object".into()));
    };
    let record_prompt = fields
        .get("promptName")
        .and_then(Value::as_str)
        .map(|p| p.trim().to_string())
        .unwrap_or_default();
    if !record_prompt.is_empty() && record_prompt != prompt_name {
        return Err(AppError::BadRequest(format!(
            "feedbackData.promptName '{record_prompt}' does not match promptName '{prompt_name}'"
        )));
    }
    fields.insert("promptName".into(), Value::String(prompt_name.to_string()));

    serde_json::from_value(data)
        .map_err(|e| AppError::BadRequest(format!("Invalid feedbackData: {e}")))
}

// ---------------------------------------------------------------------------
// DELETE /feedback/{prompt_name}?username=U
// ---------------------------------------------------------------------------

/// Remove all of one user's ratings for one prompt.
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(prompt_name): Path<String>,
    Query(params): Query<UsernameParams>,
) -> AppResult<Json<DataResponse<DeleteFeedbackResponse>>> {
    let username = params.require()?;
    let removed = state.store.delete_prompt(username, &prompt_name).await?;
    tracing::info!(username = %username, prompt = %prompt_name, removed, "Prompt feedback reset");
    Ok(Json(DataResponse {
        data: DeleteFeedbackResponse {
            prompt_name,
            removed,
        },
    }))
}
