//! Rating score labels and their normalization.
//!
//! Scores reach the system in two textual forms: the short form used by
//! the rating controls (`good`, `average`, `bad`) and the display form
//! written to the feedback file (`Good Match`, ...). Both parse to the same
//! [`Score`], so comparisons and aggregation never look at raw labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How well a recommended font matches the prompt.
///
/// Serialized in display form; deserialized from any accepted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Score {
    GoodMatch,
    AverageMatch,
    BadMatch,
}

/// Every score, in display order.
pub const ALL_SCORES: [Score; 3] = [Score::GoodMatch, Score::AverageMatch, Score::BadMatch];

impl Score {
    /// Parse any accepted label (short or display form, case-insensitive,
    /// surrounding whitespace ignored).
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        let label = label.trim();
        ALL_SCORES
            .into_iter()
            .find(|s| {
                label.eq_ignore_ascii_case(s.short_form())
                    || label.eq_ignore_ascii_case(s.display_form())
            })
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid score '{label}'. Must be one of: good, average, bad"
                ))
            })
    }

    pub const fn short_form(self) -> &'static str {
        match self {
            Score::GoodMatch => "good",
            Score::AverageMatch => "average",
            Score::BadMatch => "bad",
        }
    }

    pub const fn display_form(self) -> &'static str {
        match self {
            Score::GoodMatch => "Good Match",
            Score::AverageMatch => "Average Match",
            Score::BadMatch => "Bad Match",
        }
    }

    /// Average and bad ratings must explain themselves.
    pub const fn requires_reason(self) -> bool {
        !matches!(self, Score::GoodMatch)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_form())
    }
}

impl FromStr for Score {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Score::parse(s)
    }
}

impl TryFrom<String> for Score {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Score::parse(&value)
    }
}

impl From<Score> for String {
    fn from(score: Score) -> Self {
        score.display_form().to_string()
    }
}
