use std::time::Duration;

use fonteval_recommend::api::DEFAULT_ENDPOINT;
use fonteval_recommend::client::ClientConfig;

use crate::preview::{PreviewConfig, DEFAULT_PREVIEW_BASE_URL};

/// Evaluator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Streaming recommendation endpoint.
    pub recommendation_endpoint: String,
    /// Upper bound for one recommendation request, in seconds.
    pub recommendation_timeout_secs: u64,
    /// Candidates kept per prompt.
    pub max_recommendations: usize,
    /// Base URL of the feedback service.
    pub feedback_api_url: String,
    /// Font preview renderer.
    pub preview_base_url: String,
    /// Time box for one preview load, in milliseconds.
    pub preview_timeout_ms: u64,
}

impl EvaluatorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                                                      |
    /// |-------------------------------|--------------------------------------------------------------|
    /// | `RECOMMENDATION_ENDPOINT`     | `http://localhost:3000/fontrecommendations/typesense/stream` |
    /// | `RECOMMENDATION_TIMEOUT_SECS` | `30`                                                         |
    /// | `MAX_RECOMMENDATIONS`         | `10`                                                         |
    /// | `FEEDBACK_API_URL`            | `http://localhost:3001`                                      |
    /// | `PREVIEW_BASE_URL`            | `https://render.myfonts.net/fonts/font_rend.php`             |
    /// | `PREVIEW_TIMEOUT_MS`          | `3000`                                                       |
    pub fn from_env() -> Self {
        let recommendation_endpoint =
            std::env::var("RECOMMENDATION_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());

        let recommendation_timeout_secs: u64 = std::env::var("RECOMMENDATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("RECOMMENDATION_TIMEOUT_SECS must be a valid u64");

        let max_recommendations: usize = std::env::var("MAX_RECOMMENDATIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("MAX_RECOMMENDATIONS must be a valid usize");

        let feedback_api_url =
            std::env::var("FEEDBACK_API_URL").unwrap_or_else(|_| "http://localhost:3001".into());

        let preview_base_url =
            std::env::var("PREVIEW_BASE_URL").unwrap_or_else(|_| DEFAULT_PREVIEW_BASE_URL.into());

        let preview_timeout_ms: u64 = std::env::var("PREVIEW_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PREVIEW_TIMEOUT_MS must be a valid u64");

        Self {
            recommendation_endpoint,
            recommendation_timeout_secs,
            max_recommendations,
            feedback_api_url,
            preview_base_url,
            preview_timeout_ms,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.recommendation_timeout_secs),
            max_results: self.max_recommendations,
        }
    }

    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            base_url: self.preview_base_url.clone(),
            timeout: Duration::from_millis(self.preview_timeout_ms),
        }
    }
}
