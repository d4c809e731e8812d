use std::time::Duration;

use crate::api::RecommendApiError;

/// Why a recommendation request produced no candidate list.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// The request could not be sent or the service answered non-2xx.
    #[error(transparent)]
    Api(#[from] RecommendApiError),

    /// The body broke off mid-stream.
    #[error("Stream transport failed: {0}")]
    Transport(String),

    #[error("Stream ended without completion")]
    EndedWithoutCompletion,

    #[error("Recommendation request timed out after {0:?}")]
    Timeout(Duration),

    /// A newer request replaced this one before it finished.
    #[error("Request {0} was superseded by a newer request")]
    Superseded(u64),

    #[error("Completion frame carried no recommendations")]
    NoResults,
}

impl RecommendError {
    /// HTTP status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            RecommendError::Api(RecommendApiError::ApiError { status, .. }) => Some(*status),
            RecommendError::Api(RecommendApiError::Request(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
