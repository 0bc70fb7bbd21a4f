//! Review-text segmentation.
//!
//! One review node yields a loose list of text lines mixing the reviewer's
//! prose, per-category rating tags and an optional reply from management:
//!
//! ```text
//! The staff is extremely courteous and friendly.
//! Rooms
//! 4.0
//! Service
//! 5.0
//! Hotel highlights
//! Quiet · Kid-friendly · Great value
//! Response from the owner
//! 10 hours ago
//! Thank you for taking the time to share your feedback.
//! ```
//!
//! `segment` splits such a list into its parts. Any of the three blocks may
//! be missing.

use chrono::{DateTime, Local};

use crate::dates;

/// A first line equal to one of these labels means the review has no prose
/// body and every line belongs to the rating-tag block.
const CATEGORY_LABELS: [&str; 9] = [
    "Rooms",
    "Service",
    "Location",
    "Hotel highlights",
    "Nearby activities",
    "Safety",
    "Walkability",
    "Food & drinks",
    "Noteworthy details",
];

const OWNER_RESPONSE_MARKER: &str = "response from the owner";
const TRANSLATION_MARKER: &str = "(Original)";
const TRANSLATED_BY_MARKER: &str = "(Translated by Google)";

/// Text fields of one review after segmentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedText {
    /// Monolithic review body; cleared when redistributed into the
    /// localized/original pair of a machine-translated review.
    pub body: Option<String>,
    pub rating_tags: Option<String>,
    pub localized_text: Option<String>,
    pub original_text: Option<String>,
    pub owner_response_text: Option<String>,
    /// Absolute timestamp of the owner's reply; None when the humanized
    /// time did not parse.
    pub owner_response_time: Option<String>,
}

/// Split the raw lines of one review node into body, rating tags,
/// localized/original text and owner response.
pub fn segment(lines: &[String], reference_now: DateTime<Local>) -> SegmentedText {
    let mut out = SegmentedText::default();

    let mut lines: Vec<String> = lines.iter().filter(|l| !l.is_empty()).cloned().collect();

    // Everything after the owner-response marker is the reply block: first
    // line is the humanized response time, the rest is the response text.
    if let Some(idx) = lines
        .iter()
        .position(|l| l.to_lowercase().contains(OWNER_RESPONSE_MARKER))
    {
        let tail = lines.split_off(idx);
        let joined = tail[1..].join("\n");
        let joined = joined.trim_matches('\n');
        let mut parts = joined.split('\n');
        if let Some(first) = parts.next() {
            if !first.is_empty() {
                out.owner_response_time = dates::normalize(first, reference_now);
            }
            let text = parts.collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                out.owner_response_text = Some(text);
            }
        }
    }

    // The node may have contained nothing but an owner response.
    if lines.is_empty() {
        return out;
    }

    lines[0] = lines[0].replace('\n', " ");

    if lines.len() > 1 {
        if CATEGORY_LABELS.contains(&lines[0].as_str()) {
            // No prose at all; every line is part of the tag block.
            out.rating_tags = Some(join_rating_tags(&lines));
        } else {
            out.body = Some(lines[0].clone());
            out.rating_tags = Some(join_rating_tags(&lines[1..]));
        }
    } else {
        out.body = Some(lines[0].clone());
    }

    // Machine-translated reviews carry both versions around the
    // "(Original)" marker; split and clear the monolithic body.
    if let Some(body) = out.body.clone() {
        if let Some((localized, original)) = body.split_once(TRANSLATION_MARKER) {
            out.localized_text = Some(localized.replace(TRANSLATED_BY_MARKER, "").trim().to_string());
            out.original_text = Some(original.to_string());
            out.body = None;
        } else {
            out.original_text = Some(body);
        }
    }

    out
}

/// Join rating-tag lines, inserting a comma after every ".0" so adjacent tag
/// values stay separable ("Rooms 4.0Service" becomes "Rooms 4.0,Service").
///
/// Scores with other decimals ("4.5") pass through unsplit and the final tag
/// keeps its trailing comma; the exact output format is load-bearing for
/// downstream CSV consumers.
fn join_rating_tags(lines: &[String]) -> String {
    lines.join(" ").replace(".0", ".0,").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_body_and_rating_tags() {
        let input = lines(&["Great stay!", "Rooms", "4.0", "Service", "5.0"]);
        let got = segment(&input, Local::now());
        assert_eq!(got.body.as_deref(), Some("Great stay!"));
        assert_eq!(got.original_text.as_deref(), Some("Great stay!"));
        assert_eq!(got.rating_tags.as_deref(), Some("Rooms 4.0, Service 5.0,"));
        assert_eq!(got.localized_text, None);
        assert_eq!(got.owner_response_text, None);
    }

    #[test]
    fn test_tags_only_review_has_no_body() {
        let input = lines(&["Rooms", "4.0", "Service", "5.0"]);
        let got = segment(&input, Local::now());
        assert_eq!(got.body, None);
        assert_eq!(got.original_text, None);
        assert_eq!(got.rating_tags.as_deref(), Some("Rooms 4.0, Service 5.0,"));
    }

    #[test]
    fn test_prose_only_review_has_no_tags() {
        let input = lines(&["Lovely place, will come back."]);
        let got = segment(&input, Local::now());
        assert_eq!(got.body.as_deref(), Some("Lovely place, will come back."));
        assert_eq!(got.rating_tags, None);
    }

    #[test]
    fn test_owner_response_block() {
        let now = Local::now();
        let input = lines(&["Nice place.", "Response from the owner", "2 days ago", "Thank", "you"]);
        let got = segment(&input, now);
        assert_eq!(got.body.as_deref(), Some("Nice place."));
        assert_eq!(got.owner_response_text.as_deref(), Some("Thank you"));
        assert_eq!(got.owner_response_time, dates::normalize("2 days ago", now));
        assert!(got.owner_response_time.is_some());
    }

    #[test]
    fn test_owner_response_only() {
        let now = Local::now();
        let input = lines(&["Response from the owner", "a week ago", "We appreciate it."]);
        let got = segment(&input, now);
        assert_eq!(got.body, None);
        assert_eq!(got.rating_tags, None);
        assert_eq!(got.owner_response_text.as_deref(), Some("We appreciate it."));
        assert_eq!(got.owner_response_time, dates::normalize("a week ago", now));
    }

    #[test]
    fn test_translation_marker_splits_body() {
        let input = lines(&["Hello (Translated by Google)(Original)Bonjour"]);
        let got = segment(&input, Local::now());
        assert_eq!(got.localized_text.as_deref(), Some("Hello"));
        assert_eq!(got.original_text.as_deref(), Some("Bonjour"));
        assert_eq!(got.body, None);
    }

    #[test]
    fn test_empty_lines_are_dropped() {
        let input = lines(&["", "Great stay!", ""]);
        let got = segment(&input, Local::now());
        assert_eq!(got.body.as_deref(), Some("Great stay!"));
    }
}
