//! Streaming recommendation client.
//!
//! Sends a prompt to the external recommendation service, decodes the
//! newline-delimited `data: {...}` frames it streams back, reports
//! progress, and resolves with the ranked candidate list from the
//! `complete` frame. [`loader::RecommendationLoader`] adds per-request
//! tagging so a newer prompt selection supersedes an older one.

pub mod api;
pub mod client;
pub mod error;
pub mod events;
pub mod frames;
pub mod loader;
pub mod source;
pub mod stream;
