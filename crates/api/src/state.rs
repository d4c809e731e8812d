use std::sync::Arc;

use fonteval_core::prompts::PromptCatalog;
use fonteval_db::FeedbackStore;

use crate::auth::UserDirectory;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// The configured feedback store (file or PostgreSQL).
    pub store: Arc<dyn FeedbackStore>,
    pub users: Arc<UserDirectory>,
    pub catalog: Arc<PromptCatalog>,
    /// Present only on the PostgreSQL backend.
    pub pool: Option<fonteval_db::DbPool>,
    pub config: Arc<ServerConfig>,
}
