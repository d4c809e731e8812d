//! Font score entity model and DTOs.

use fonteval_core::error::CoreError;
use fonteval_core::prompts::PromptCatalog;
use fonteval_core::rating::{normalize_reason, RatingRecord};
use fonteval_core::score::Score;
use fonteval_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `font_scores` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FontScore {
    pub id: DbId,
    pub prompt: String,
    pub font_family: String,
    pub font_style: Option<String>,
    pub font_md5: String,
    pub foundry: Option<String>,
    /// Short form: `good`, `average` or `bad`.
    pub score: String,
    pub reason: Option<String>,
    pub username: String,
    /// The full candidate object as the client saw it.
    pub font_data: Option<serde_json::Value>,
    pub user_session: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FontScore {
    /// View this row as a rating record.
    pub fn to_rating_record(&self, catalog: &PromptCatalog) -> Result<RatingRecord, CoreError> {
        let score = Score::parse(&self.score)?;
        Ok(RatingRecord {
            prompt_id: catalog.prompt_id(&self.prompt),
            prompt_name: self.prompt.clone(),
            font_key: self.font_md5.clone(),
            family_name: self.font_family.clone(),
            score,
            reason: self.reason.clone().unwrap_or_default(),
            username: self.username.clone(),
            email: String::new(),
            timestamp: self.updated_at,
        })
    }
}

/// DTO for saving a score event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFontScore {
    pub prompt: String,
    pub font_family: String,
    pub font_style: Option<String>,
    pub font_md5: String,
    pub foundry: Option<String>,
    /// Any accepted score label; stored in short form.
    pub score: String,
    pub reason: Option<String>,
    pub username: String,
    pub font_data: Option<serde_json::Value>,
    pub user_session: Option<String>,
    pub screen_resolution: Option<String>,
    pub timezone: Option<String>,
}

impl CreateFontScore {
    /// Build from a rating record; the record itself is kept as `font_data`.
    pub fn from_record(record: &RatingRecord) -> Self {
        Self {
            prompt: record.prompt_name.clone(),
            font_family: record.family_name.clone(),
            font_style: None,
            font_md5: record.font_key.clone(),
            foundry: None,
            score: record.score.short_form().to_string(),
            reason: Some(record.reason.clone()).filter(|r| !r.is_empty()),
            username: record.username.clone(),
            font_data: serde_json::to_value(record).ok(),
            user_session: None,
            screen_resolution: None,
            timezone: None,
        }
    }

    /// Validate and canonicalize: trims text fields, normalizes the score
    /// label, and enforces the reason rule.
    pub fn normalized(mut self) -> Result<(Self, Score), CoreError> {
        let score = Score::parse(&self.score)?;
        for (field, value) in [
            ("prompt", &mut self.prompt),
            ("font_md5", &mut self.font_md5),
            ("username", &mut self.username),
        ] {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(CoreError::Validation(format!("{field} is required")));
            }
        }
        let reason = normalize_reason(score, self.reason.as_deref().unwrap_or_default());
        if score.requires_reason() && reason.is_empty() {
            return Err(CoreError::Validation(format!(
                "A reason is required for '{score}'"
            )));
        }
        self.reason = Some(reason).filter(|r| !r.is_empty());
        self.score = score.short_form().to_string();
        Ok((self, score))
    }
}

/// Request metadata captured by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Per-score bucket in [`ScoreStats`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScoreBucket {
    pub score: String,
    pub count: i64,
    pub fonts: Vec<String>,
}

/// Aggregate statistics over one user's score events.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreStats {
    pub total_scores: i64,
    pub unique_prompts: i64,
    pub unique_fonts: i64,
    pub score_distribution: Vec<ScoreBucket>,
    pub recent_scores: Vec<FontScore>,
}
