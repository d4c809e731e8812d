//! Preview probe against a local stand-in for the render service.

use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use fonteval_core::candidate::RecommendationCandidate;
use fonteval_evaluator::preview::{PreviewConfig, PreviewLoader, PreviewStatus};
use serde::Deserialize;

#[derive(Deserialize)]
struct RenderParams {
    id: String,
}

/// `ok-*` renders, `slow-*` stalls, anything else is a 404.
async fn render(Query(params): Query<RenderParams>) -> Result<&'static str, StatusCode> {
    if params.id.starts_with("ok-") {
        Ok("PNG")
    } else if params.id.starts_with("slow-") {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("PNG")
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn loader() -> PreviewLoader {
    let app = Router::new().route("/fonts/font_rend.php", get(render));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    PreviewLoader::new(PreviewConfig {
        base_url: format!("http://{addr}/fonts/font_rend.php"),
        timeout: Duration::from_millis(200),
    })
}

#[tokio::test]
async fn test_probe_reports_loaded_preview() {
    let loader = loader().await;
    let font = RecommendationCandidate::new("Helvetica Now", Some("ok-helv"));
    assert_eq!(loader.probe(&font).await, PreviewStatus::Loaded);
}

#[tokio::test]
async fn test_probe_reports_missing_preview() {
    let loader = loader().await;
    let font = RecommendationCandidate::new("Ghost Sans", Some("missing"));
    assert_eq!(loader.probe(&font).await, PreviewStatus::Unavailable);
}

#[tokio::test]
async fn test_slow_preview_times_out_as_unavailable() {
    let loader = loader().await;
    let font = RecommendationCandidate::new("Sluggish Serif", Some("slow-1"));

    let started = std::time::Instant::now();
    assert_eq!(loader.probe(&font).await, PreviewStatus::Unavailable);
    assert!(started.elapsed() < Duration::from_secs(2));
}
