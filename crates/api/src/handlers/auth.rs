//! Handler for `POST /login`.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::UserProfile;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /login`. Missing fields are treated as blank.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Check credentials against the user directory.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    let user = match state.users.authenticate(&input.username, &input.password) {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(username = %input.username.trim(), error = %e, "Login rejected");
            return Err(e.into());
        }
    };

    tracing::info!(username = %user.username, "User logged in");
    Ok(Json(DataResponse { data: user }))
}
