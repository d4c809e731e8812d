//! Rating records and their validation.
//!
//! A [`RatingRecord`] is one evaluator's judgment of one font for one
//! prompt. Its JSON shape is the wire shape submitted to the feedback
//! service and stored verbatim by the file store.

use serde::{Deserialize, Serialize};

use crate::candidate::RecommendationCandidate;
use crate::error::CoreError;
use crate::prompts::PromptCatalog;
use crate::score::Score;
use crate::types::{Evaluator, Timestamp};

/// Upper bound on a free-text reason.
pub const MAX_REASON_LEN: usize = 2000;

/// A user's durable ratings: prompt text to records, in insertion order.
pub type UserFeedback = indexmap::IndexMap<String, Vec<RatingRecord>>;

/// One evaluator's rating of one font for one prompt.
///
/// At most one record exists per (`username`, `prompt_name`, `font_key`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// Display-only catalog position; never used as a lookup key.
    #[serde(rename = "promptID", default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<u32>,
    #[serde(rename = "promptName", default)]
    pub prompt_name: String,
    #[serde(rename = "md5", alias = "fontKey")]
    pub font_key: String,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    pub score: Score,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: Timestamp,
}

impl RatingRecord {
    /// Build and validate a rating of `candidate` for `prompt`.
    pub fn new(
        evaluator: &Evaluator,
        prompt: &str,
        candidate: &RecommendationCandidate,
        score: Score,
        reason: &str,
        catalog: &PromptCatalog,
    ) -> Result<Self, CoreError> {
        let record = Self {
            prompt_id: catalog.prompt_id(prompt),
            prompt_name: prompt.to_string(),
            font_key: candidate.font_key(),
            family_name: candidate.family_name.clone(),
            score,
            reason: normalize_reason(score, reason),
            username: evaluator.username.clone(),
            email: evaluator.email.clone(),
            timestamp: chrono::Utc::now(),
        };
        validate_rating(&record)?;
        Ok(record)
    }

    /// Whether `self` and `other` address the same (user, prompt, font).
    pub fn same_slot(&self, other: &RatingRecord) -> bool {
        self.username == other.username
            && self.prompt_name == other.prompt_name
            && self.font_key == other.font_key
    }
}

/// Trim the reason; good ratings carry none.
pub fn normalize_reason(score: Score, reason: &str) -> String {
    if score.requires_reason() {
        reason.trim().to_string()
    } else {
        String::new()
    }
}

/// Validate a record before it is stored or submitted.
pub fn validate_rating(record: &RatingRecord) -> Result<(), CoreError> {
    if record.username.trim().is_empty() {
        return Err(CoreError::Validation("username is required".into()));
    }
    if record.prompt_name.trim().is_empty() {
        return Err(CoreError::Validation("promptName is required".into()));
    }
    if record.font_key.trim().is_empty() {
        return Err(CoreError::Validation("md5 (font key) is required".into()));
    }
    if record.score.requires_reason() && record.reason.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "A reason is required for '{}'",
            record.score
        )));
    }
    if record.reason.chars().count() > MAX_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "reason exceeds {MAX_REASON_LEN} characters"
        )));
    }
    Ok(())
}
