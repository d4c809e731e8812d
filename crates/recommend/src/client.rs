//! Bounded recommendation request: open, consume, truncate, rank.

use std::sync::Arc;
use std::time::Duration;

use fonteval_core::candidate::{rank_candidates, RecommendationCandidate};

use crate::api::RecommendationApi;
use crate::error::RecommendError;
use crate::source::RecommendationSource;
use crate::stream::consume_stream;

/// Tunable limits for one recommendation request.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for the whole request, from send to `complete` frame.
    pub timeout: Duration,
    /// Candidates kept after the stream completes.
    pub max_results: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_results: 10,
        }
    }
}

/// Issues recommendation requests against a [`RecommendationSource`].
#[derive(Clone)]
pub struct RecommendationClient {
    source: Arc<dyn RecommendationSource>,
    config: ClientConfig,
}

impl RecommendationClient {
    pub fn new(source: Arc<dyn RecommendationSource>, config: ClientConfig) -> Self {
        Self { source, config }
    }

    /// Client for the HTTP endpoint at `endpoint`.
    pub fn http(endpoint: String, config: ClientConfig) -> Self {
        Self::new(Arc::new(RecommendationApi::new(endpoint)), config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch ranked candidates for `prompt`.
    ///
    /// Fails with [`RecommendError::Timeout`] if the stream has not
    /// completed within the configured bound.
    pub async fn recommend<F>(
        &self,
        prompt: &str,
        on_progress: F,
    ) -> Result<Vec<RecommendationCandidate>, RecommendError>
    where
        F: FnMut(f64) + Send,
    {
        let request = async {
            let chunks = self.source.open(prompt).await?;
            consume_stream(chunks, on_progress).await
        };

        let payload = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| RecommendError::Timeout(self.config.timeout))??;

        let total = payload.candidates.len();
        let ranked = rank_candidates(payload.candidates, self.config.max_results);
        tracing::info!(
            prompt = %prompt,
            received = total,
            kept = ranked.len(),
            "Recommendations received",
        );
        Ok(ranked)
    }
}
