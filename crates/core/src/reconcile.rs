//! Score Reconciler: merges durable and session ratings for one prompt.
//!
//! Durable records for the active prompt seed a map keyed by font key;
//! session records overlay it, so the most recent user action always wins
//! over what the store last reported for the same font.

use indexmap::IndexMap;
use serde::Serialize;

use crate::rating::{RatingRecord, UserFeedback};
use crate::score::Score;
use crate::session::{Confirmation, SessionScoreSet};

/// A user's durable history as last fetched, tagged with the session reset
/// marker current at fetch time.
#[derive(Debug, Clone, Default)]
pub struct DurableSnapshot {
    pub feedback: UserFeedback,
    pub reset_marker: u64,
}

impl DurableSnapshot {
    pub fn new(feedback: UserFeedback, reset_marker: u64) -> Self {
        Self {
            feedback,
            reset_marker,
        }
    }

    /// Durable records belonging to `prompt`.
    ///
    /// Records that omit `promptName` inherit the prompt they are filed
    /// under.
    pub fn records_for<'a>(&'a self, prompt: &'a str) -> impl Iterator<Item = &'a RatingRecord> {
        self.feedback.iter().flat_map(move |(group, records)| {
            records.iter().filter(move |r| {
                let name = if r.prompt_name.is_empty() {
                    group.as_str()
                } else {
                    r.prompt_name.as_str()
                };
                name == prompt
            })
        })
    }
}

/// One entry of the effective list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveRating {
    #[serde(flatten)]
    pub record: RatingRecord,
    pub confirmation: Confirmation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub count: usize,
    pub percent: u32,
}

/// Reconciled view of the active prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub prompt: String,
    pub ratings: Vec<EffectiveRating>,
    pub good: CategoryStat,
    pub average: CategoryStat,
    pub bad: CategoryStat,
    pub evaluated: usize,
    pub total_candidates: usize,
    pub progress_percent: u32,
}

impl ScoreSummary {
    pub fn stat(&self, score: Score) -> CategoryStat {
        match score {
            Score::GoodMatch => self.good,
            Score::AverageMatch => self.average,
            Score::BadMatch => self.bad,
        }
    }

    pub fn rating_for(&self, font_key: &str) -> Option<&EffectiveRating> {
        self.ratings.iter().find(|r| r.record.font_key == font_key)
    }
}

/// Rounded percentage of `part` in `total`; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Produce the effective list and statistics for `active_prompt`.
///
/// Durable data is ignored when the snapshot predates the latest reset of
/// the active prompt, so a reset shows as empty even before the re-fetch
/// lands.
pub fn reconcile(
    active_prompt: &str,
    durable: &DurableSnapshot,
    session: &SessionScoreSet,
    total_candidates: usize,
) -> ScoreSummary {
    let stale = session
        .reset_marker_for(active_prompt)
        .is_some_and(|marker| durable.reset_marker < marker);

    let mut merged: IndexMap<String, EffectiveRating> = IndexMap::new();

    if !stale {
        for record in durable.records_for(active_prompt) {
            merged.insert(
                record.font_key.clone(),
                EffectiveRating {
                    record: record.clone(),
                    confirmation: Confirmation::Confirmed,
                },
            );
        }
    }

    if session.active_prompt() == Some(active_prompt) {
        for entry in session.iter() {
            merged.insert(
                entry.record.font_key.clone(),
                EffectiveRating {
                    record: entry.record.clone(),
                    confirmation: entry.confirmation.clone(),
                },
            );
        }
    }

    let ratings: Vec<EffectiveRating> = merged.into_values().collect();
    let evaluated = ratings.len();
    let count = |score: Score| ratings.iter().filter(|r| r.record.score == score).count();
    let stat = |score: Score| {
        let n = count(score);
        CategoryStat {
            count: n,
            percent: percent(n, evaluated),
        }
    };

    ScoreSummary {
        prompt: active_prompt.to_string(),
        good: stat(Score::GoodMatch),
        average: stat(Score::AverageMatch),
        bad: stat(Score::BadMatch),
        evaluated,
        total_candidates,
        progress_percent: percent(evaluated, total_candidates).min(100),
        ratings,
    }
}
