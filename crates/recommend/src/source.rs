//! The seam between the stream consumer and whatever produces bytes.
//!
//! [`crate::api::RecommendationApi`] is the production source.
//! [`ScriptedSource`] replays canned chunk sequences and backs the tests
//! of this crate and of the evaluator session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::api::RecommendApiError;

/// Raw response body, one transport chunk per item.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, RecommendApiError>>;

/// Opens a recommendation stream for a prompt.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn open(&self, prompt: &str) -> Result<ChunkStream, RecommendApiError>;
}

/// Canned response for one prompt.
#[derive(Debug, Clone, Default)]
pub struct Script {
    status: Option<(u16, String)>,
    chunks: Vec<Result<Vec<u8>, String>>,
    delay: Option<Duration>,
    hang: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the request with a non-2xx status before any body is read.
    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some((code, body.into())),
            ..Self::default()
        }
    }

    pub fn chunk(mut self, text: impl AsRef<[u8]>) -> Self {
        self.chunks.push(Ok(text.as_ref().to_vec()));
        self
    }

    /// Break the body with a transport error at this point.
    pub fn interrupt(mut self, detail: impl Into<String>) -> Self {
        self.chunks.push(Err(detail.into()));
        self
    }

    /// Wait `delay` before the first chunk.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keep the connection open forever after the scripted chunks.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// A single `complete` frame carrying `recommendations`.
    pub fn complete(recommendations: serde_json::Value) -> Self {
        Self::new().chunk(complete_frame(recommendations))
    }

    fn into_stream(self) -> Result<ChunkStream, RecommendApiError> {
        if let Some((status, body)) = self.status {
            return Err(RecommendApiError::ApiError { status, body });
        }
        let body = stream::iter(
            self.chunks
                .into_iter()
                .map(|c| c.map_err(RecommendApiError::Interrupted)),
        );
        let chunks = match self.delay {
            Some(delay) => stream::once(tokio::time::sleep(delay))
                .filter_map(|_| async { None::<Result<Vec<u8>, RecommendApiError>> })
                .chain(body)
                .boxed(),
            None => body.boxed(),
        };
        if self.hang {
            Ok(chunks.chain(stream::pending()).boxed())
        } else {
            Ok(chunks.boxed())
        }
    }
}

/// Build a terminated `complete` frame line.
pub fn complete_frame(recommendations: serde_json::Value) -> String {
    let payload = serde_json::json!({
        "status": "complete",
        "results": { "recommendations": recommendations },
    });
    format!("data: {payload}\n")
}

/// Replays a [`Script`] per prompt.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    fallback: Option<Script>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prompt: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(prompt.into(), script);
        self
    }

    /// Script used for prompts without their own entry.
    pub fn with_fallback(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Number of streams opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationSource for ScriptedSource {
    async fn open(&self, prompt: &str) -> Result<ChunkStream, RecommendApiError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(prompt)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| RecommendApiError::ApiError {
                status: 404,
                body: format!("no script for prompt '{prompt}'"),
            })?;
        script.into_stream()
    }
}
