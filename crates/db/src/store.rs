//! The abstract feedback store.

use async_trait::async_trait;
use fonteval_core::error::CoreError;
use fonteval_core::rating::{RatingRecord, UserFeedback};
use serde::Serialize;

/// Errors from any feedback store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid feedback JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The remote feedback service answered with an error status.
    #[error("Feedback service error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The remote feedback service could not be reached.
    #[error("Feedback service unreachable: {0}")]
    Unreachable(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// `true` when no record existed for the (user, prompt, font) slot.
    pub is_new: bool,
}

/// Durable rating storage, partitioned by username.
///
/// Implementations must never return or touch another user's records.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// All of `username`'s ratings, grouped by prompt text.
    async fn list_for_user(&self, username: &str) -> Result<UserFeedback, StoreError>;

    /// Insert `record`, or replace the record with the same font key under
    /// the same user and prompt.
    async fn upsert(&self, record: &RatingRecord) -> Result<UpsertOutcome, StoreError>;

    /// Remove every rating `username` made for `prompt`. Returns how many
    /// were removed; removing nothing is not an error.
    async fn delete_prompt(&self, username: &str, prompt: &str) -> Result<usize, StoreError>;
}

/// Reject a blank username before any store access.
pub fn require_username(username: &str) -> Result<&str, StoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::Validation("username is required".into()).into());
    }
    Ok(username)
}

