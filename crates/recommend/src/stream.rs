//! Stream consumer loop.
//!
//! Reads raw chunks, splits them into lines, parses marker-prefixed
//! frames, reports progress, and resolves on the first `complete` frame.

use futures::{Stream, StreamExt};

use crate::api::RecommendApiError;
use crate::error::RecommendError;
use crate::frames::{parse_frame_line, CompletionPayload, LineBuffer};

/// Consume a recommendation stream until its `complete` frame.
///
/// `on_progress` is called synchronously, in stream order, once per frame
/// with a numeric progress value; it must not block. Malformed frames are
/// logged and skipped. Anything after the `complete` frame is left unread
/// and the stream is dropped.
pub async fn consume_stream<S, F>(
    mut chunks: S,
    mut on_progress: F,
) -> Result<CompletionPayload, RecommendError>
where
    S: Stream<Item = Result<Vec<u8>, RecommendApiError>> + Unpin,
    F: FnMut(f64),
{
    let mut buffer = LineBuffer::new();

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| match e {
            RecommendApiError::Interrupted(detail) => RecommendError::Transport(detail),
            other => RecommendError::Api(other),
        })?;

        for line in buffer.push(&chunk) {
            if let Some(payload) = handle_line(&line, &mut on_progress)? {
                return Ok(payload);
            }
        }
    }

    // The final line may lack its terminator.
    if let Some(line) = buffer.finish() {
        if let Some(payload) = handle_line(&line, &mut on_progress)? {
            return Ok(payload);
        }
    }

    tracing::info!("Recommendation stream ended without a complete frame");
    Err(RecommendError::EndedWithoutCompletion)
}

/// Process one complete line. Returns the payload if it was the
/// `complete` frame.
fn handle_line<F: FnMut(f64)>(
    line: &str,
    on_progress: &mut F,
) -> Result<Option<CompletionPayload>, RecommendError> {
    let frame = match parse_frame_line(line) {
        None => return Ok(None),
        Some(Ok(frame)) => frame,
        Some(Err(e)) => {
            tracing::warn!(error = %e, line = %line, "Skipping malformed stream frame");
            return Ok(None);
        }
    };

    if let Some(percent) = frame.progress_percent() {
        tracing::debug!(percent, "Recommendation progress");
        on_progress(percent);
    }

    if !frame.is_complete() {
        return Ok(None);
    }

    CompletionPayload::from_frame(&frame)
        .map(Some)
        .ok_or(RecommendError::NoResults)
}
