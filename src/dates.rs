//! Humanized relative-date normalization.
//!
//! Review dates are rendered like "2 weeks ago", "an hour ago" or
//! "just now"; this module turns them into absolute timestamps relative to a
//! caller-supplied reference instant so results are testable.

use chrono::{DateTime, Duration, Local, Months};
use once_cell::sync::Lazy;
use regex::Regex;

/// Output format for all absolute timestamps.
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

// Plural form: "2 weeks ago", "15 minutes ago".
static PLURAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+).*?\b(minutes|hours|days|weeks|months|years)\b")
        .expect("invalid plural date regex")
});

// Singular form: "a minute ago", "an hour ago". Matches the bare unit word
// anywhere, so "sometime last week" parses as one week ago; downstream
// consumers rely on that leniency.
static SINGULAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(minute|hour|day|week|month|year)\b").expect("invalid singular date regex")
});

/// Convert a humanized relative date into an absolute timestamp.
///
/// Returns `None` when the string carries no recognizable quantity or unit;
/// the caller keeps the raw humanized string either way.
pub fn normalize(humanized: &str, reference_now: DateTime<Local>) -> Option<String> {
    if humanized.contains("now") {
        return Some(reference_now.format(TIMESTAMP_FORMAT).to_string());
    }

    if let Some(caps) = PLURAL_RE.captures(humanized) {
        let quantity: i64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str();
        return subtract(reference_now, quantity, unit.trim_end_matches('s'));
    }

    if let Some(caps) = SINGULAR_RE.captures(humanized) {
        return subtract(reference_now, 1, caps.get(1)?.as_str());
    }

    None
}

/// Calendar-aware subtraction: months and years shift the month/year fields
/// rather than subtracting a fixed number of seconds.
fn subtract(now: DateTime<Local>, quantity: i64, unit: &str) -> Option<String> {
    let then = match unit {
        "minute" => now.checked_sub_signed(Duration::minutes(quantity))?,
        "hour" => now.checked_sub_signed(Duration::hours(quantity))?,
        "day" => now.checked_sub_signed(Duration::days(quantity))?,
        "week" => now.checked_sub_signed(Duration::weeks(quantity))?,
        "month" => now.checked_sub_months(Months::new(u32::try_from(quantity).ok()?))?,
        "year" => {
            now.checked_sub_months(Months::new(u32::try_from(quantity.checked_mul(12)?).ok()?))?
        }
        _ => return None,
    };
    Some(then.format(TIMESTAMP_FORMAT).to_string())
}
