//! The evaluation session controller.
//!
//! One [`EvaluationSession`] per evaluator. Identity is fixed at
//! construction and passed explicitly to every store call.

use std::sync::Arc;

use fonteval_core::candidate::RecommendationCandidate;
use fonteval_core::prompts::PromptCatalog;
use fonteval_core::rating::RatingRecord;
use fonteval_core::reconcile::{reconcile, DurableSnapshot, ScoreSummary};
use fonteval_core::score::Score;
use fonteval_core::session::{Confirmation, SessionScoreSet};
use fonteval_core::types::Evaluator;
use fonteval_db::FeedbackStore;
use fonteval_recommend::client::RecommendationClient;
use fonteval_recommend::error::RecommendError;
use fonteval_recommend::events::RecommendationEvent;
use fonteval_recommend::loader::RecommendationLoader;
use tokio::sync::{broadcast, Mutex};

use crate::error::SessionError;
use crate::submission::{SubmissionQueue, SubmitOutcome};

#[derive(Default)]
struct SessionState {
    scores: SessionScoreSet,
    candidates: Vec<RecommendationCandidate>,
    durable: DurableSnapshot,
}

/// Outcome of [`EvaluationSession::retry_failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
    pub retried: usize,
    pub still_failed: usize,
}

pub struct EvaluationSession {
    evaluator: Evaluator,
    catalog: PromptCatalog,
    loader: RecommendationLoader,
    store: Arc<dyn FeedbackStore>,
    submissions: SubmissionQueue,
    state: Mutex<SessionState>,
}

impl EvaluationSession {
    pub fn new(
        evaluator: Evaluator,
        catalog: PromptCatalog,
        client: RecommendationClient,
        store: Arc<dyn FeedbackStore>,
    ) -> Self {
        Self {
            evaluator,
            catalog,
            loader: RecommendationLoader::new(client),
            submissions: SubmissionQueue::new(Arc::clone(&store)),
            store,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    /// Recommendation progress and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecommendationEvent> {
        self.loader.subscribe()
    }

    pub async fn active_prompt(&self) -> Option<String> {
        self.state.lock().await.scores.active_prompt().map(str::to_string)
    }

    pub async fn candidates(&self) -> Vec<RecommendationCandidate> {
        self.state.lock().await.candidates.clone()
    }

    /// Make `prompt` active and load its recommendations.
    ///
    /// Any load in flight is superseded and the session set is cleared.
    /// A failure to refresh the durable history is logged, not fatal.
    pub async fn select_prompt(
        &self,
        prompt: &str,
    ) -> Result<Vec<RecommendationCandidate>, SessionError> {
        // The request id is reserved together with the prompt switch, so
        // selections are ordered by when they were made.
        let ticket = {
            let mut state = self.state.lock().await;
            state.scores.begin_prompt(prompt);
            state.candidates.clear();
            self.loader.begin(prompt).await
        };

        if let Err(e) = self.refresh_durable().await {
            tracing::warn!(username = %self.evaluator.username, error = %e, "Could not load stored ratings");
        }

        let loaded = self.loader.run(ticket).await?;

        let mut state = self.state.lock().await;
        if !self.loader.is_current(loaded.request_id) || state.scores.active_prompt() != Some(prompt) {
            return Err(RecommendError::Superseded(loaded.request_id).into());
        }
        state.candidates = loaded.candidates;
        Ok(state.candidates.clone())
    }

    /// Rate one of the current candidates.
    ///
    /// The rating is visible in [`summary`](Self::summary) immediately as
    /// pending. A failed submission leaves it in place marked failed and
    /// returns the store error. A rating removed by a concurrent
    /// [`reset_prompt`](Self::reset_prompt) reports
    /// [`SessionError::ClearedByReset`].
    pub async fn rate(
        &self,
        font_key: &str,
        score: Score,
        reason: &str,
    ) -> Result<Confirmation, SessionError> {
        let (record, sequence) = {
            let mut state = self.state.lock().await;
            let prompt = state
                .scores
                .active_prompt()
                .ok_or(SessionError::NoActivePrompt)?
                .to_string();
            let candidate = state
                .candidates
                .iter()
                .find(|c| c.font_key() == font_key)
                .ok_or_else(|| SessionError::UnknownFont(font_key.to_string()))?;
            let record = RatingRecord::new(
                &self.evaluator,
                &prompt,
                candidate,
                score,
                reason,
                &self.catalog,
            )?;
            let sequence = state.scores.record(record.clone())?;
            (record, sequence)
        };

        self.submit(record, sequence).await
    }

    /// Resubmit every rating whose last submission failed.
    pub async fn retry_failed(&self) -> Result<RetryReport, SessionError> {
        let pending: Vec<(RatingRecord, u64)> = {
            let mut state = self.state.lock().await;
            let keys: Vec<String> = state
                .scores
                .failed()
                .iter()
                .map(|e| e.record.font_key.clone())
                .collect();
            keys.iter()
                .filter_map(|key| {
                    let sequence = state.scores.resubmit(key)?;
                    let record = state.scores.get(key)?.record.clone();
                    Some((record, sequence))
                })
                .collect()
        };

        let retried = pending.len();
        let mut still_failed = 0;
        for (record, sequence) in pending {
            match self.submit(record, sequence).await {
                Ok(_) | Err(SessionError::ClearedByReset(_)) => {}
                Err(_) => still_failed += 1,
            }
        }
        tracing::info!(retried, still_failed, "Retried failed ratings");
        Ok(RetryReport {
            retried,
            still_failed,
        })
    }

    /// Delete all of this evaluator's ratings for the active prompt.
    ///
    /// Rating writes already in flight for the prompt finish first and are
    /// deleted with the rest; writes still queued are dropped. Ratings made
    /// while the delete runs are kept. On failure nothing changes.
    pub async fn reset_prompt(&self) -> Result<usize, SessionError> {
        let prompt = self
            .active_prompt()
            .await
            .ok_or(SessionError::NoActivePrompt)?;

        let lock = self
            .submissions
            .lock_prompt(&self.evaluator.username, &prompt)
            .await;
        let through = self.state.lock().await.scores.last_sequence();

        let removed = self
            .store
            .delete_prompt(&self.evaluator.username, &prompt)
            .await?;
        lock.discard_through(through);
        self.state.lock().await.scores.mark_reset(&prompt, through);
        drop(lock);
        tracing::info!(username = %self.evaluator.username, prompt = %prompt, removed, "Prompt reset");

        if let Err(e) = self.refresh_durable().await {
            tracing::warn!(error = %e, "Could not refresh stored ratings after reset");
        }
        Ok(removed)
    }

    /// Re-fetch the durable history, tagged with the reset marker current
    /// when the fetch started.
    pub async fn refresh_durable(&self) -> Result<(), SessionError> {
        let marker = self.state.lock().await.scores.reset_marker();
        let feedback = self.store.list_for_user(&self.evaluator.username).await?;

        let mut state = self.state.lock().await;
        if marker >= state.durable.reset_marker {
            state.durable = DurableSnapshot::new(feedback, marker);
        }
        Ok(())
    }

    /// Reconciled view of the active prompt.
    pub async fn summary(&self) -> Result<ScoreSummary, SessionError> {
        let state = self.state.lock().await;
        let prompt = state
            .scores
            .active_prompt()
            .ok_or(SessionError::NoActivePrompt)?;
        Ok(reconcile(
            prompt,
            &state.durable,
            &state.scores,
            state.candidates.len(),
        ))
    }

    async fn submit(&self, record: RatingRecord, sequence: u64) -> Result<Confirmation, SessionError> {
        let font_key = record.font_key.clone();
        let result = self.submissions.submit(&record, sequence).await;

        let mut state = self.state.lock().await;
        if state.scores.cleared_by_reset(&record.prompt_name, sequence) {
            return Err(SessionError::ClearedByReset(font_key));
        }
        match result {
            Ok(SubmitOutcome::Stored(_)) => {
                state.scores.confirm(&font_key, sequence);
            }
            Ok(SubmitOutcome::Superseded | SubmitOutcome::Discarded) => {}
            Err(e) => {
                tracing::warn!(
                    username = %record.username,
                    prompt = %record.prompt_name,
                    font_key = %font_key,
                    error = %e,
                    "Rating submission failed",
                );
                state.scores.fail(&font_key, sequence, e.to_string());
                return Err(e.into());
            }
        }

        Ok(state
            .scores
            .get(&font_key)
            .map(|e| e.confirmation.clone())
            .unwrap_or(Confirmation::Pending))
    }
}
