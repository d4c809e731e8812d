//! HTTP client for the streaming recommendation endpoint.
//!
//! Wraps `POST <endpoint>` using [`reqwest`] and exposes the response
//! body as a stream of raw byte chunks for [`crate::stream`] to decode.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;

use crate::source::{ChunkStream, RecommendationSource};

/// Default streaming endpoint of the recommendation service.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/fontrecommendations/typesense/stream";

/// Request body accepted by the recommendation service.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRequest<'a> {
    pub query: &'a str,
    pub intermediate_query_enabled: bool,
    pub prompt: &'a str,
    /// The service expects this flag as a string.
    pub with_conversion_ranking: &'static str,
    pub faiss_optimized: bool,
}

impl<'a> RecommendationRequest<'a> {
    /// The prompt text is sent as both `query` and `prompt`.
    pub fn for_prompt(prompt: &'a str) -> Self {
        Self {
            query: prompt,
            intermediate_query_enabled: true,
            prompt,
            with_conversion_ranking: "true",
            faiss_optimized: true,
        }
    }
}

/// Errors from the recommendation HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum RecommendApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Recommendation API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// Reading the response body failed after the stream had started.
    #[error("Response stream interrupted: {0}")]
    Interrupted(String),
}

/// HTTP client for one recommendation endpoint.
pub struct RecommendationApi {
    client: reqwest::Client,
    endpoint: String,
}

impl RecommendationApi {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open the stream for `prompt`.
    ///
    /// Fails immediately on a transport error or a non-2xx status. On
    /// success the body is returned unread, chunk by chunk.
    pub async fn open_stream(&self, prompt: &str) -> Result<ChunkStream, RecommendApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RecommendationRequest::for_prompt(prompt))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;

        let chunks = futures::stream::unfold(Some(response), |state| async move {
            let mut response = state?;
            match response.chunk().await {
                Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
                Ok(None) => None,
                // Yield the error once, then end the stream.
                Err(e) => Some((Err(RecommendApiError::Interrupted(e.to_string())), None)),
            }
        });

        Ok(chunks.boxed())
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`RecommendApiError::ApiError`] with status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RecommendApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RecommendApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecommendationSource for RecommendationApi {
    async fn open(&self, prompt: &str) -> Result<ChunkStream, RecommendApiError> {
        self.open_stream(prompt).await
    }
}
