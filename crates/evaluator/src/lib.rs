//! Client-side evaluation session.
//!
//! An [`session::EvaluationSession`] belongs to one evaluator. It loads
//! recommendations for the selected prompt, records ratings optimistically
//! with a per-record confirmation state, submits them to a
//! [`fonteval_db::FeedbackStore`] in per-font order, and reconciles the
//! session with the durable history for display.

pub mod config;
pub mod error;
pub mod preview;
pub mod remote_store;
pub mod session;
pub mod submission;
