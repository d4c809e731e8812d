//! Font preview URLs and the time-boxed preview probe.
//!
//! Previews are rendered by an external service keyed by the font's
//! content hash. Loading one is best effort: a slow or failed preview is
//! reported as unavailable and never blocks rating.

use std::collections::HashMap;
use std::time::Duration;

use fonteval_core::candidate::RecommendationCandidate;
use reqwest::Url;
use serde::Serialize;
use tokio::sync::RwLock;

pub const DEFAULT_PREVIEW_BASE_URL: &str = "https://render.myfonts.net/fonts/font_rend.php";

/// Sample sentence rendered in every preview.
pub const PREVIEW_SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog";

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PREVIEW_BASE_URL.to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

/// Preview image URL for the font with content hash `md5`.
///
/// Returns `None` if `base_url` is not a valid absolute URL.
pub fn preview_url(base_url: &str, md5: &str) -> Option<Url> {
    Url::parse_with_params(
        base_url,
        &[
            ("id", md5),
            ("rt", PREVIEW_SAMPLE_TEXT),
            ("rs", "30"),
            ("fg", "000000"),
            ("t", "pc"),
            ("sc", "5"),
            ("bg", "FFFFFF"),
            ("x", "0"),
            ("y", "0"),
            ("al", "left"),
        ],
    )
    .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Loaded,
    Unavailable,
}

/// Probes preview URLs and remembers the outcome per URL.
pub struct PreviewLoader {
    client: reqwest::Client,
    config: PreviewConfig,
    cache: RwLock<HashMap<String, PreviewStatus>>,
}

impl PreviewLoader {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn url_for(&self, candidate: &RecommendationCandidate) -> Option<Url> {
        let md5 = candidate.md5.as_deref().filter(|m| !m.trim().is_empty())?;
        preview_url(&self.config.base_url, md5)
    }

    /// Load the candidate's preview within the configured time box.
    pub async fn probe(&self, candidate: &RecommendationCandidate) -> PreviewStatus {
        let Some(url) = self.url_for(candidate) else {
            return PreviewStatus::Unavailable;
        };
        let key = url.to_string();

        if let Some(status) = self.cache.read().await.get(&key) {
            return *status;
        }

        let status = match tokio::time::timeout(self.config.timeout, self.fetch(url)).await {
            Ok(Ok(())) => PreviewStatus::Loaded,
            Ok(Err(e)) => {
                tracing::debug!(family = %candidate.family_name, error = %e, "Preview unavailable");
                PreviewStatus::Unavailable
            }
            Err(_) => {
                tracing::debug!(family = %candidate.family_name, "Preview timed out");
                PreviewStatus::Unavailable
            }
        };

        self.cache.write().await.insert(key, status);
        status
    }

    async fn fetch(&self, url: Url) -> Result<(), reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(())
    }
}
