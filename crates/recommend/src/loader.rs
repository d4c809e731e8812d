//! Single-active-request recommendation loader.
//!
//! [`RecommendationLoader`] tags every load with a monotonically
//! increasing request id. Starting a new load cancels the previous one,
//! and progress or results from a superseded load are never delivered.
//!
//! Events are broadcast via a [`tokio::sync::broadcast`] channel. Call
//! [`RecommendationLoader::subscribe`] to receive them.

use std::sync::atomic::{AtomicU64, Ordering};

use fonteval_core::candidate::RecommendationCandidate;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::client::RecommendationClient;
use crate::error::RecommendError;
use crate::events::RecommendationEvent;

/// Broadcast channel capacity for loader events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of one successful load.
#[derive(Debug, Clone)]
pub struct LoadedRecommendations {
    pub request_id: u64,
    pub prompt: String,
    pub candidates: Vec<RecommendationCandidate>,
}

/// A reserved load; see [`RecommendationLoader::begin`].
#[derive(Debug)]
pub struct LoadTicket {
    request_id: u64,
    prompt: String,
    token: CancellationToken,
}

impl LoadTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

pub struct RecommendationLoader {
    client: RecommendationClient,
    /// Id of the most recent load; anything else is stale.
    current: AtomicU64,
    /// Id and cancellation token of the load in flight, if any.
    active: Mutex<Option<(u64, CancellationToken)>>,
    event_tx: broadcast::Sender<RecommendationEvent>,
}

impl RecommendationLoader {
    pub fn new(client: RecommendationClient) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            current: AtomicU64::new(0),
            active: Mutex::new(None),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecommendationEvent> {
        self.event_tx.subscribe()
    }

    /// Id of the most recently started load (0 before the first).
    pub fn current_request_id(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, request_id: u64) -> bool {
        self.current_request_id() == request_id
    }

    /// Load recommendations for `prompt`, superseding any load in flight.
    ///
    /// Returns [`RecommendError::Superseded`] if another load or
    /// [`cancel`](Self::cancel) replaces this one before it finishes.
    pub async fn load(&self, prompt: &str) -> Result<LoadedRecommendations, RecommendError> {
        let ticket = self.begin(prompt).await;
        self.run(ticket).await
    }

    /// Reserve the next request id for `prompt` and supersede the load in
    /// flight, without opening the stream yet.
    ///
    /// Ids are handed out in the order `begin` is called, so a caller that
    /// needs to do other work before [`run`](Self::run) still keeps its
    /// place.
    pub async fn begin(&self, prompt: &str) -> LoadTicket {
        let token = CancellationToken::new();
        let request_id = {
            let mut active = self.active.lock().await;
            let request_id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((_, previous)) = active.replace((request_id, token.clone())) {
                previous.cancel();
            }
            request_id
        };

        tracing::info!(request_id, prompt = %prompt, "Loading recommendations");
        let _ = self.event_tx.send(RecommendationEvent::Started {
            request_id,
            prompt: prompt.to_string(),
        });

        LoadTicket {
            request_id,
            prompt: prompt.to_string(),
            token,
        }
    }

    /// Stream the recommendations reserved by `ticket`.
    pub async fn run(&self, ticket: LoadTicket) -> Result<LoadedRecommendations, RecommendError> {
        let LoadTicket {
            request_id,
            prompt,
            token,
        } = ticket;
        if token.is_cancelled() {
            tracing::debug!(request_id, "Load superseded before it started");
            return Err(RecommendError::Superseded(request_id));
        }

        let event_tx = self.event_tx.clone();
        let current = &self.current;
        let on_progress = move |percent: f64| {
            if current.load(Ordering::SeqCst) == request_id {
                let _ = event_tx.send(RecommendationEvent::Progress {
                    request_id,
                    percent,
                });
            }
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(RecommendError::Superseded(request_id)),
            result = self.client.recommend(&prompt, on_progress) => result,
        };

        if !self.is_current(request_id) {
            tracing::debug!(request_id, "Discarding superseded recommendation result");
            return Err(RecommendError::Superseded(request_id));
        }
        self.clear_active(request_id).await;

        match result {
            Ok(candidates) => {
                let _ = self.event_tx.send(RecommendationEvent::Completed {
                    request_id,
                    candidates: candidates.len(),
                });
                Ok(LoadedRecommendations {
                    request_id,
                    prompt,
                    candidates,
                })
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "Recommendation request failed");
                let _ = self.event_tx.send(RecommendationEvent::Failed {
                    request_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Abandon the load in flight, if any.
    pub async fn cancel(&self) {
        let mut active = self.active.lock().await;
        self.current.fetch_add(1, Ordering::SeqCst);
        if let Some((_, token)) = active.take() {
            token.cancel();
        }
    }

    async fn clear_active(&self, request_id: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|(id, _)| *id == request_id) {
            *active = None;
        }
    }
}
