//! In-memory ratings made during the current evaluation session.
//!
//! The set is scoped to one active prompt and keyed by font key. Each entry
//! carries a confirmation state so a failed submission stays visible and
//! retryable instead of silently diverging from the durable store.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::rating::RatingRecord;

/// Durable-store status of a session rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum Confirmation {
    Pending,
    Confirmed,
    Failed(String),
}

/// One rating held in the session set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRating {
    pub record: RatingRecord,
    pub confirmation: Confirmation,
    /// Monotonic per-set sequence; a later write for the same font has a
    /// larger value.
    pub sequence: u64,
}

/// Where the most recent reset of one prompt left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResetMark {
    /// Session reset marker after the reset.
    marker: u64,
    /// Ratings numbered at or below this were removed.
    through_sequence: u64,
}

/// Ratings created or updated since the active prompt was loaded.
#[derive(Debug, Default)]
pub struct SessionScoreSet {
    active_prompt: Option<String>,
    entries: IndexMap<String, SessionRating>,
    next_sequence: u64,
    reset_marker: u64,
    resets: IndexMap<String, ResetMark>,
}

impl SessionScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `prompt`, dropping every rating from the previous prompt.
    pub fn begin_prompt(&mut self, prompt: impl Into<String>) {
        self.active_prompt = Some(prompt.into());
        self.entries.clear();
    }

    pub fn active_prompt(&self) -> Option<&str> {
        self.active_prompt.as_deref()
    }

    /// Record `record` as pending, replacing any earlier rating of the same
    /// font. Returns the sequence number the submission must confirm with.
    pub fn record(&mut self, record: RatingRecord) -> Result<u64, CoreError> {
        let Some(active) = self.active_prompt.as_deref() else {
            return Err(CoreError::Validation("No active prompt".into()));
        };
        if record.prompt_name != active {
            return Err(CoreError::Validation(format!(
                "Rating for '{}' does not belong to the active prompt '{active}'",
                record.prompt_name
            )));
        }

        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.entries.insert(
            record.font_key.clone(),
            SessionRating {
                record,
                confirmation: Confirmation::Pending,
                sequence,
            },
        );
        Ok(sequence)
    }

    /// Mark the rating confirmed if `sequence` is still the latest write
    /// for `font_key`. Returns whether anything changed.
    pub fn confirm(&mut self, font_key: &str, sequence: u64) -> bool {
        self.set_confirmation(font_key, sequence, Confirmation::Confirmed)
    }

    /// Mark the rating failed if `sequence` is still the latest write.
    pub fn fail(&mut self, font_key: &str, sequence: u64, error: impl Into<String>) -> bool {
        self.set_confirmation(font_key, sequence, Confirmation::Failed(error.into()))
    }

    fn set_confirmation(&mut self, font_key: &str, sequence: u64, state: Confirmation) -> bool {
        match self.entries.get_mut(font_key) {
            Some(entry) if entry.sequence == sequence => {
                entry.confirmation = state;
                true
            }
            _ => false,
        }
    }

    /// Move a rating back to pending under a fresh sequence number, for a
    /// retry. Returns the new sequence, or `None` if the font is unknown.
    pub fn resubmit(&mut self, font_key: &str) -> Option<u64> {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let entry = self.entries.get_mut(font_key)?;
        entry.sequence = sequence;
        entry.confirmation = Confirmation::Pending;
        Some(sequence)
    }

    /// Highest sequence handed out so far.
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// A reset of `prompt` succeeded at the store, removing every rating
    /// numbered up to `through_sequence`.
    ///
    /// Those ratings leave the set when `prompt` is active. The reset
    /// marker is bumped so durable snapshots fetched before the reset are
    /// recognised as stale for `prompt`.
    pub fn mark_reset(&mut self, prompt: &str, through_sequence: u64) {
        if self.active_prompt.as_deref() == Some(prompt) {
            self.entries.retain(|_, e| e.sequence > through_sequence);
        }
        self.reset_marker += 1;
        self.resets.insert(
            prompt.to_string(),
            ResetMark {
                marker: self.reset_marker,
                through_sequence,
            },
        );
    }

    pub fn reset_marker(&self) -> u64 {
        self.reset_marker
    }

    /// Reset marker of the latest reset of `prompt`, if it was ever reset.
    pub fn reset_marker_for(&self, prompt: &str) -> Option<u64> {
        self.resets.get(prompt).map(|r| r.marker)
    }

    /// Whether rating number `sequence` for `prompt` was removed by a reset.
    pub fn cleared_by_reset(&self, prompt: &str, sequence: u64) -> bool {
        self.resets
            .get(prompt)
            .is_some_and(|r| sequence <= r.through_sequence)
    }

    pub fn get(&self, font_key: &str) -> Option<&SessionRating> {
        self.entries.get(font_key)
    }

    pub fn failed(&self) -> Vec<&SessionRating> {
        self.entries
            .values()
            .filter(|e| matches!(e.confirmation, Confirmation::Failed(_)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRating> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
