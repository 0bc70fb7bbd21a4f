use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GrevError;

/// Review sort order offered by both page layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    MostHelpful,
    MostRecent,
    HighestScore,
    LowestScore,
}

impl SortBy {
    /// Stable token used in review file names (`reviews_<token>.csv`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::MostHelpful => "most_helpful",
            SortBy::MostRecent => "most_recent",
            SortBy::HighestScore => "highest_score",
            SortBy::LowestScore => "lowest_score",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = GrevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "most_helpful" => Ok(SortBy::MostHelpful),
            "most_recent" => Ok(SortBy::MostRecent),
            "highest_score" => Ok(SortBy::HighestScore),
            "lowest_score" => Ok(SortBy::LowestScore),
            other => Err(GrevError::InvalidSortBy(other.to_string())),
        }
    }
}

/// Caller-supplied early-exit target: pagination halts as soon as a single
/// review node contains both substrings. The matching node itself is
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopCriterion {
    pub username: String,
    pub review_text: String,
}

impl StopCriterion {
    /// True when both substrings occur, case-insensitively, in the node text.
    pub fn matches(&self, node_text: &str) -> bool {
        let haystack = node_text.to_lowercase();
        haystack.contains(&self.username.to_lowercase())
            && haystack.contains(&self.review_text.to_lowercase())
    }
}

/// Immutable per-run parameters, threaded through every component.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Place/hotel being scraped; also names the output directory.
    pub entity_name: String,
    /// Direct Google page URL; `None` in search mode.
    pub page_url: Option<String>,
    pub sort_by: SortBy,
    /// Review cap; -1 scrapes everything.
    pub n_reviews: i64,
    pub stop_criterion: Option<StopCriterion>,
    pub save_reviews: bool,
    pub save_metadata: bool,
}

impl RunParams {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            page_url: None,
            sort_by: SortBy::default(),
            n_reviews: -1,
            stop_criterion: None,
            save_reviews: true,
            save_metadata: true,
        }
    }
}
