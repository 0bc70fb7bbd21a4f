//! The pagination control loop shared by both layouts.
//!
//! Reviews load by infinite scroll in windows of ten. Each iteration jumps
//! to the bottom, nudges back up to trigger the lazy loader, waits for the
//! next window to attach and parses every review node in it. The loop stops
//! on one of three conditions: the requested count is reached, the stop
//! criterion matches, or the list is exhausted.

use std::fmt;
use std::time::Duration;

use chrono::Local;
use colored::Colorize;
use tracing::{info, warn};

use crate::driver::{Node, Page};
use crate::error::Result;
use crate::extract::{ExtractContext, Extracted};
use crate::layout::PageLayout;
use crate::params::RunParams;
use crate::record::{OverallRating, ReviewRecord};
use crate::sink::CsvSink;

/// Consecutive failed window probes tolerated before declaring the list
/// exhausted. A single timeout is often just slow loading.
pub const WINDOW_RETRY_BUDGET: u32 = 5;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CountReached,
    CriterionMet,
    Exhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::CountReached => "count cap reached",
            StopReason::CriterionMet => "stop criterion met",
            StopReason::Exhausted => "end of list",
        };
        write!(f, "{text}")
    }
}

/// Everything a finished pagination run produced.
pub struct ScrapeOutcome {
    /// Collected records, truncated to the requested cap.
    pub reviews: Vec<ReviewRecord>,
    /// Everything parsed, before truncation.
    pub total_count: usize,
    /// How many of the parsed reviews were posted on Google.
    pub google_count: usize,
    pub windows_parsed: usize,
    pub expected_windows: usize,
    pub stop: StopReason,
}

/// Scroll through the review list, extracting every window until a stop
/// condition fires.
///
/// When a sink is given, each window's records are appended before the count
/// cap is applied, so the CSV may run past the cap by up to one window while
/// the returned vector is truncated exactly.
pub fn paginate(
    page: &dyn Page,
    layout: &dyn PageLayout,
    params: &RunParams,
    sink: Option<&CsvSink>,
    overall: &OverallRating,
) -> Result<ScrapeOutcome> {
    let expected_windows = overall.expected_windows();
    let cap = params.n_reviews;

    let mut reviews: Vec<ReviewRecord> = Vec::new();
    let mut google_count = 0usize;
    let mut total_count = 0usize;
    let mut windows_parsed = 0usize;
    let mut window_idx = 1usize;
    let mut failed_probes = 0u32;

    let stop = loop {
        page.scroll_by(0, 10_000)?;
        page.sleep(Duration::from_millis(200));
        page.scroll_by(0, layout.scroll_back())?;
        page.sleep(Duration::from_secs(2));

        if !layout.window_present(page, window_idx) {
            failed_probes += 1;
            info!(
                window = window_idx,
                attempt = failed_probes,
                "review window did not attach"
            );
            if failed_probes >= WINDOW_RETRY_BUDGET {
                break StopReason::Exhausted;
            }
            continue;
        }

        let window = layout.window_node(page, window_idx)?;
        let (records, criterion_met) =
            parse_window(layout, window.as_ref(), params, window_idx)?;

        google_count += records.iter().filter(|r| r.is_google_review()).count();
        total_count += records.len();

        if let Some(sink) = sink {
            sink.append_reviews(params.sort_by, &records)?;
        }
        reviews.extend(records);
        windows_parsed = window_idx;

        println!(
            "{} collected {} reviews",
            format!("[window {window_idx}/{expected_windows}]").cyan(),
            total_count
        );

        if cap > -1 && total_count as i64 >= cap {
            reviews.truncate(cap as usize);
            break StopReason::CountReached;
        }
        if criterion_met {
            break StopReason::CriterionMet;
        }

        window_idx += 1;
        failed_probes = 0;
    };

    Ok(ScrapeOutcome {
        reviews,
        total_count,
        google_count,
        windows_parsed,
        expected_windows,
        stop,
    })
}

/// Parse every review node in one window.
///
/// The window's review count is the number of rating fragments in its text;
/// both layouts render exactly one "/5" or "/10" per review. Individual
/// nodes that fail to extract are logged and skipped rather than aborting
/// the window.
fn parse_window(
    layout: &dyn PageLayout,
    window: &dyn Node,
    params: &RunParams,
    window_idx: usize,
) -> Result<(Vec<ReviewRecord>, bool)> {
    let text = window.text()?;
    let n = text.matches("/5").count() + text.matches("/10").count();

    let now = Local::now();
    let mut records = Vec::with_capacity(n);

    for offset in 1..=n {
        let ctx = ExtractContext {
            stop_criterion: params.stop_criterion.as_ref(),
            window_idx,
            offset,
            now,
        };

        let node = match layout.review_node(window, offset) {
            Ok(node) => node,
            Err(e) => {
                warn!(window = window_idx, offset, error = %e, "review node not found");
                continue;
            }
        };

        match layout.extract(node.as_ref(), &ctx) {
            Ok(Extracted::Record(record)) => records.push(*record),
            Ok(Extracted::StopCriterionMet) => return Ok((records, true)),
            Err(e) => {
                warn!(window = window_idx, offset, error = %e, "failed to extract review");
            }
        }
    }

    Ok((records, false))
}
