//! Stream frame types, line buffering, and the frame parser.
//!
//! The service writes lines of the form `data: {json}`, separated by
//! `\n` and possibly padded with blank or non-marker lines. A transport
//! chunk may end anywhere, including inside the marker, the JSON payload,
//! or a multi-byte UTF-8 sequence.

use fonteval_core::candidate::RecommendationCandidate;
use serde::Deserialize;

/// Literal prefix of every meaningful line.
pub const FRAME_MARKER: &str = "data: ";

/// `status` value of the terminating frame.
pub const STATUS_COMPLETE: &str = "complete";

/// Splits raw bytes into complete lines, holding back the unterminated
/// tail until more bytes arrive.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and drain every line it completes.
    ///
    /// Lines are split on the raw `\n` byte before decoding, so a UTF-8
    /// sequence cut across chunks is reassembled before it is decoded.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// Take the unterminated remainder, if any, once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

/// One decoded frame. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub status: Option<String>,
    /// Number, or numeric string optionally suffixed with `%`.
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub results: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StreamFrame {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETE)
    }

    /// Progress as a number, if the frame carries a numeric-like value.
    pub fn progress_percent(&self) -> Option<f64> {
        let value = match self.progress.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }
}

/// Parse one complete line.
///
/// Returns `None` for lines without the marker (padding, comments),
/// otherwise the result of decoding the JSON after the marker.
pub fn parse_frame_line(line: &str) -> Option<Result<StreamFrame, serde_json::Error>> {
    let payload = line.strip_prefix(FRAME_MARKER)?;
    Some(serde_json::from_str(payload))
}

/// Final result carried by the `complete` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPayload {
    /// Candidates in service order, untruncated and unranked.
    pub candidates: Vec<RecommendationCandidate>,
    /// The `results` object exactly as received.
    pub raw: serde_json::Value,
}

impl CompletionPayload {
    /// Extract `results.recommendations` from a complete frame.
    ///
    /// Returns `None` when the frame has no recommendations array.
    /// Individual entries that do not describe a font are dropped.
    pub fn from_frame(frame: &StreamFrame) -> Option<Self> {
        let raw = frame.results.clone()?;
        let list = raw.get("recommendations")?.as_array()?;
        let candidates = list
            .iter()
            .filter_map(|item| match RecommendationCandidate::deserialize(item) {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed recommendation");
                    None
                }
            })
            .collect();
        Some(Self { candidates, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_holds_back_partial_line() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"data: {\"progress\": 4").is_empty());
        assert_eq!(buf.push(b"0}\n"), vec!["data: {\"progress\": 40}"]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn buffer_splits_multiple_lines_in_one_chunk() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"a\n\nb\r\nc");
        assert_eq!(lines, vec!["a", "", "b"]);
        assert_eq!(buf.finish().as_deref(), Some("c"));
        assert!(buf.finish().is_none());
    }

    #[test]
    fn buffer_reassembles_split_utf8() {
        let text = "data: {\"status\":\"Überprüfung\"}\n".as_bytes();
        // Split inside the two-byte encoding of 'Ü'.
        let cut = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut buf = LineBuffer::new();
        assert!(buf.push(&text[..cut]).is_empty());
        let lines = buf.push(&text[cut..]);
        assert_eq!(lines, vec!["data: {\"status\":\"Überprüfung\"}"]);
    }

    #[test]
    fn parse_ignores_lines_without_marker() {
        assert!(parse_frame_line("").is_none());
        assert!(parse_frame_line(": keep-alive").is_none());
        assert!(parse_frame_line("data:{}").is_none());
    }

    #[test]
    fn parse_reports_malformed_json() {
        assert!(parse_frame_line("data: {not json").unwrap().is_err());
    }

    #[test]
    fn progress_accepts_numbers_and_percent_strings() {
        let frame = parse_frame_line(r#"data: {"progress": 40}"#).unwrap().unwrap();
        assert_eq!(frame.progress_percent(), Some(40.0));
        let frame = parse_frame_line(r#"data: {"progress": "75%"}"#).unwrap().unwrap();
        assert_eq!(frame.progress_percent(), Some(75.0));
        let frame = parse_frame_line(r#"data: {"progress": "n/a"}"#).unwrap().unwrap();
        assert_eq!(frame.progress_percent(), None);
        let frame = parse_frame_line(r#"data: {"message": "searching"}"#).unwrap().unwrap();
        assert_eq!(frame.progress_percent(), None);
        assert_eq!(frame.extra["message"], "searching");
    }

    #[test]
    fn completion_payload_from_frame() {
        let line = r#"data: {"status":"complete","results":{"recommendations":[{"family_name":"Helvetica","md5":"h1"},{"oops":true}]}}"#;
        let frame = parse_frame_line(line).unwrap().unwrap();
        assert!(frame.is_complete());
        let payload = CompletionPayload::from_frame(&frame).unwrap();
        assert_eq!(payload.candidates.len(), 1);
        assert_eq!(payload.candidates[0].family_name, "Helvetica");
    }

    #[test]
    fn completion_without_results_is_none() {
        let frame = parse_frame_line(r#"data: {"status":"complete"}"#).unwrap().unwrap();
        assert!(CompletionPayload::from_frame(&frame).is_none());
    }
}
