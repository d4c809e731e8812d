//! Repository for the `font_scores` table.
//!
//! Every query is scoped by `username`.

use fonteval_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::models::font_score::{
    ClientMetadata, CreateFontScore, FontScore, ScoreBucket, ScoreStats,
};

/// Column list for `font_scores` queries.
const COLUMNS: &str = "\
    id, prompt, font_family, font_style, font_md5, foundry, score, reason, \
    username, font_data, user_session, ip_address, user_agent, \
    screen_resolution, timezone, created_at, updated_at";

/// Number of rows returned as `recent_scores` in the stats.
const RECENT_LIMIT: i64 = 10;

#[derive(FromRow)]
struct UpsertedRow {
    #[sqlx(flatten)]
    score: FontScore,
    inserted: bool,
}

/// Provides upsert, query, and aggregate operations for font scores.
pub struct FontScoreRepo;

impl FontScoreRepo {
    /// Insert a score event, or update the existing row for the same
    /// (username, prompt, font_md5). Returns the row and whether it was
    /// newly inserted.
    ///
    /// `input` is expected to be normalized already.
    pub async fn upsert(
        pool: &PgPool,
        input: &CreateFontScore,
        meta: &ClientMetadata,
    ) -> Result<(FontScore, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO font_scores \
                (prompt, font_family, font_style, font_md5, foundry, score, reason, \
                 username, font_data, user_session, ip_address, user_agent, \
                 screen_resolution, timezone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (username, prompt, font_md5) DO UPDATE SET \
                font_family = EXCLUDED.font_family, \
                font_style = EXCLUDED.font_style, \
                foundry = EXCLUDED.foundry, \
                score = EXCLUDED.score, \
                reason = EXCLUDED.reason, \
                font_data = EXCLUDED.font_data, \
                user_session = EXCLUDED.user_session, \
                ip_address = EXCLUDED.ip_address, \
                user_agent = EXCLUDED.user_agent, \
                screen_resolution = EXCLUDED.screen_resolution, \
                timezone = EXCLUDED.timezone, \
                updated_at = NOW() \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query_as::<_, UpsertedRow>(&query)
            .bind(&input.prompt)
            .bind(&input.font_family)
            .bind(&input.font_style)
            .bind(&input.font_md5)
            .bind(&input.foundry)
            .bind(&input.score)
            .bind(&input.reason)
            .bind(&input.username)
            .bind(&input.font_data)
            .bind(&input.user_session)
            .bind(&meta.ip_address)
            .bind(&meta.user_agent)
            .bind(&input.screen_resolution)
            .bind(&input.timezone)
            .fetch_one(pool)
            .await?;
        Ok((row.score, row.inserted))
    }

    /// All of a user's score events, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        username: &str,
    ) -> Result<Vec<FontScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM font_scores WHERE username = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, FontScore>(&query)
            .bind(username)
            .fetch_all(pool)
            .await
    }

    /// A user's score events for one prompt, newest first.
    pub async fn list_by_prompt(
        pool: &PgPool,
        username: &str,
        prompt: &str,
    ) -> Result<Vec<FontScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM font_scores WHERE username = $1 AND prompt = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, FontScore>(&query)
            .bind(username)
            .bind(prompt)
            .fetch_all(pool)
            .await
    }

    /// Delete one score event owned by `username`. Returns `true` if a row
    /// was removed.
    pub async fn delete_by_id(
        pool: &PgPool,
        username: &str,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM font_scores WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every score event `username` recorded for `prompt`.
    pub async fn delete_for_prompt(
        pool: &PgPool,
        username: &str,
        prompt: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM font_scores WHERE username = $1 AND prompt = $2")
            .bind(username)
            .bind(prompt)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Aggregate statistics for one user.
    pub async fn stats(pool: &PgPool, username: &str) -> Result<ScoreStats, sqlx::Error> {
        let (total_scores, unique_prompts, unique_fonts): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT prompt), COUNT(DISTINCT font_md5) \
             FROM font_scores WHERE username = $1",
        )
        .bind(username)
        .fetch_one(pool)
        .await?;

        let score_distribution = sqlx::query_as::<_, ScoreBucket>(
            "SELECT score, COUNT(*) AS count, \
                    ARRAY_AGG(font_family ORDER BY font_family) AS fonts \
             FROM font_scores WHERE username = $1 \
             GROUP BY score ORDER BY score",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM font_scores WHERE username = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let recent_scores = sqlx::query_as::<_, FontScore>(&query)
            .bind(username)
            .bind(RECENT_LIMIT)
            .fetch_all(pool)
            .await?;

        Ok(ScoreStats {
            total_scores,
            unique_prompts,
            unique_fonts,
            score_distribution,
            recent_scores,
        })
    }
}
