//! Shared query parameter types for API handlers.

use serde::Deserialize;

use crate::error::AppError;

/// `?username=` on every per-user read and delete.
#[derive(Debug, Deserialize)]
pub struct UsernameParams {
    pub username: Option<String>,
}

impl UsernameParams {
    /// The trimmed username, or 400 when it is missing or blank.
    pub fn require(&self) -> Result<&str, AppError> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::BadRequest("username is required".into()))
    }
}
