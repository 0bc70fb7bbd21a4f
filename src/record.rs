use serde::Serialize;

/// One parsed review.
///
/// Always carries a username, rating and the humanized posted date. The text
/// fields hold either a localized/original pair (machine-translated review),
/// the original text alone, or nothing for a rating-tags-only review.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub username: String,
    /// Absent for reviews on non-Google source sites without a link.
    pub user_profile_url: Option<String>,
    pub review_text_localized: Option<String>,
    pub review_text_original: Option<String>,
    /// Structured sub-ratings, e.g. "Rooms 4.0, Service 5.0,".
    pub rating_tags: Option<String>,
    pub owner_response_text: Option<String>,
    pub owner_response_time: Option<String>,
    /// Raw relative date as rendered, e.g. "2 weeks".
    pub posted_at_humanized: String,
    /// Derived absolute timestamp; None when normalization failed.
    pub posted_at_absolute: Option<String>,
    /// "google" or the name of a third-party aggregator.
    pub source_site: Option<String>,
    pub rating_score: f64,
    /// 5 for Google-hosted reviews, 10 for most aggregators.
    pub rating_scale: f64,
    /// Free-text trip classifier, e.g. "Holiday ❘ Family".
    pub stay_type: Option<String>,
    pub image_urls: Vec<String>,
}

impl ReviewRecord {
    /// Whether this review counts toward the run's Google-review tally.
    pub fn is_google_review(&self) -> bool {
        self.source_site
            .as_deref()
            .map(|site| site.trim().eq_ignore_ascii_case("google"))
            .unwrap_or(false)
    }
}

/// Aggregate rating metadata for the entity, extracted once before
/// pagination and persisted once per run.
///
/// The dialog layout cannot produce the per-star histogram, so the star
/// buckets are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallRating {
    pub entity_name: String,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub five_star: Option<String>,
    pub four_star: Option<String>,
    pub three_star: Option<String>,
    pub two_star: Option<String>,
    pub one_star: Option<String>,
}

impl OverallRating {
    /// Expected number of scroll windows (ten reviews each), for progress
    /// logging only; termination never depends on it.
    pub fn expected_windows(&self) -> usize {
        self.review_count
            .map(|n| (n as usize).div_ceil(10))
            .unwrap_or(0)
    }
}
