//! Events emitted by [`crate::loader::RecommendationLoader`].
//!
//! Every event carries the `request_id` of the load that produced it, so
//! subscribers can drop anything that does not belong to the request they
//! are currently showing.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationEvent {
    Started { request_id: u64, prompt: String },

    Progress {
        request_id: u64,
        /// As reported by the service; usually 0-100.
        percent: f64,
    },

    Completed { request_id: u64, candidates: usize },

    Failed { request_id: u64, error: String },
}

impl RecommendationEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            RecommendationEvent::Started { request_id, .. }
            | RecommendationEvent::Progress { request_id, .. }
            | RecommendationEvent::Completed { request_id, .. }
            | RecommendationEvent::Failed { request_id, .. } => *request_id,
        }
    }
}
