#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use fonteval_api::auth::{UserAccount, UserDirectory};
use fonteval_api::config::{FeedbackBackend, ServerConfig};
use fonteval_api::router::build_app_router;
use fonteval_api::state::AppState;
use fonteval_core::prompts::PromptCatalog;
use fonteval_db::file_store::FileFeedbackStore;
use fonteval_db::pg_store::PgFeedbackStore;
use fonteval_db::DbPool;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(backend: FeedbackBackend) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.to_string()],
        request_timeout_secs: 30,
        backend,
        feedback_file: "feedback.json".into(),
        users_file: "user.json".into(),
        database_url: None,
    }
}

pub fn test_users() -> UserDirectory {
    UserDirectory::new(vec![
        UserAccount {
            username: "alice".into(),
            password: "s3cret".into(),
            email: "alice@example.com".into(),
            extra: serde_json::Map::new(),
        },
        UserAccount {
            username: "bob".into(),
            password: "hunter2".into(),
            email: String::new(),
            extra: serde_json::Map::new(),
        },
    ])
}

/// A file-backed app. The feedback document lives in the returned temp dir,
/// which must outlive the router.
pub async fn build_test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(FeedbackBackend::File);
    config.feedback_file = dir.path().join("feedback.json");

    let store = FileFeedbackStore::open(config.feedback_file.clone())
        .await
        .unwrap();
    let state = AppState {
        store: Arc::new(store),
        users: Arc::new(test_users()),
        catalog: Arc::new(PromptCatalog::default()),
        pool: None,
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), dir)
}

/// A PostgreSQL-backed app, with the `/font-scores` routes mounted.
pub fn build_pg_test_app(pool: DbPool) -> Router {
    let config = test_config(FeedbackBackend::Postgres);
    let catalog = PromptCatalog::default();
    let state = AppState {
        store: Arc::new(PgFeedbackStore::new(pool.clone(), catalog.clone())),
        users: Arc::new(test_users()),
        catalog: Arc::new(catalog),
        pool: Some(pool),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
