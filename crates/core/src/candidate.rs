//! Font candidates returned by the recommendation service.

use serde::{Deserialize, Serialize};

/// Number of leading candidates highlighted as top picks.
pub const TOP_HIGHLIGHT_COUNT: usize = 3;

/// One font recommended for a prompt.
///
/// `rank` is not sent by the service; it is the 1-based position in the
/// returned sequence, assigned by [`rank_candidates`]. Unknown service
/// fields are kept in `extra` so nothing is lost when a candidate is
/// echoed back into a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    pub family_name: String,
    #[serde(default)]
    pub style_name: String,
    #[serde(default)]
    pub foundry_name: String,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub rank: usize,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecommendationCandidate {
    pub fn new(family_name: impl Into<String>, md5: Option<&str>) -> Self {
        Self {
            family_name: family_name.into(),
            style_name: String::new(),
            foundry_name: String::new(),
            md5: md5.map(str::to_string),
            rank: 0,
            extra: serde_json::Map::new(),
        }
    }

    /// Key under which ratings for this font are stored.
    pub fn font_key(&self) -> String {
        font_key_for(self.md5.as_deref(), &self.family_name)
    }

    /// Whether this candidate is among the highlighted top picks.
    pub fn is_top_pick(&self) -> bool {
        (1..=TOP_HIGHLIGHT_COUNT).contains(&self.rank)
    }
}

/// Stable identity of a font: its content hash, or the family name when
/// the service supplied no hash.
///
/// Distinct fonts that share a family name and lack a hash collide under
/// the fallback and overwrite each other's ratings.
pub fn font_key_for(md5: Option<&str>, family_name: &str) -> String {
    match md5.map(str::trim) {
        Some(hash) if !hash.is_empty() => hash.to_string(),
        _ => family_name.to_string(),
    }
}

/// Truncate to `max` candidates and assign 1-based ranks.
pub fn rank_candidates(
    candidates: Vec<RecommendationCandidate>,
    max: usize,
) -> Vec<RecommendationCandidate> {
    candidates
        .into_iter()
        .take(max)
        .enumerate()
        .map(|(i, mut c)| {
            c.rank = i + 1;
            c
        })
        .collect()
}
