use fonteval_core::error::CoreError;
use fonteval_db::StoreError;
use fonteval_recommend::error::RecommendError;

/// Errors surfaced by [`crate::session::EvaluationSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No prompt is selected")]
    NoActivePrompt,

    #[error("Font '{0}' is not among the current recommendations")]
    UnknownFont(String),

    /// A reset of the prompt removed the rating before it was confirmed.
    #[error("Rating for font '{0}' was cleared by a prompt reset")]
    ClearedByReset(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Recommend(#[from] RecommendError),
}
