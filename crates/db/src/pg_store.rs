//! PostgreSQL-backed [`FeedbackStore`] over the `font_scores` table.

use async_trait::async_trait;
use fonteval_core::prompts::PromptCatalog;
use fonteval_core::rating::{validate_rating, RatingRecord, UserFeedback};

use crate::models::font_score::{ClientMetadata, CreateFontScore};
use crate::repositories::FontScoreRepo;
use crate::store::{require_username, FeedbackStore, StoreError, UpsertOutcome};
use crate::DbPool;

pub struct PgFeedbackStore {
    pool: DbPool,
    catalog: PromptCatalog,
}

impl PgFeedbackStore {
    pub fn new(pool: DbPool, catalog: PromptCatalog) -> Self {
        Self { pool, catalog }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn list_for_user(&self, username: &str) -> Result<UserFeedback, StoreError> {
        let username = require_username(username)?;
        let rows = FontScoreRepo::list_for_user(&self.pool, username).await?;

        // Rows come newest first; group them oldest first.
        let mut feedback = UserFeedback::new();
        for row in rows.iter().rev() {
            match row.to_rating_record(&self.catalog) {
                Ok(record) => feedback.entry(row.prompt.clone()).or_default().push(record),
                Err(e) => {
                    tracing::warn!(id = row.id, error = %e, "Skipping font score with invalid score label");
                }
            }
        }
        Ok(feedback)
    }

    async fn upsert(&self, record: &RatingRecord) -> Result<UpsertOutcome, StoreError> {
        validate_rating(record)?;
        require_username(&record.username)?;

        let (input, _) = CreateFontScore::from_record(record).normalized()?;
        let (row, is_new) =
            FontScoreRepo::upsert(&self.pool, &input, &ClientMetadata::default()).await?;
        tracing::debug!(
            id = row.id,
            username = %row.username,
            prompt = %row.prompt,
            font_key = %row.font_md5,
            is_new,
            "Font score saved",
        );
        Ok(UpsertOutcome { is_new })
    }

    async fn delete_prompt(&self, username: &str, prompt: &str) -> Result<usize, StoreError> {
        let username = require_username(username)?;
        let removed = FontScoreRepo::delete_for_prompt(&self.pool, username, prompt).await?;
        tracing::info!(username = %username, prompt = %prompt, removed, "Prompt scores deleted");
        Ok(removed as usize)
    }
}
