//! Run entry points: navigate to the review surface, detect the layout,
//! extract metadata, then hand off to the pagination loop.

use std::time::Duration;

use chrono::Local;
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::driver::{Page, WAIT_TIMEOUT};
use crate::error::{GrevError, Result};
use crate::layout::{DialogLayout, FullScreenLayout, PageLayout};
use crate::paginate::{self, ScrapeOutcome};
use crate::params::RunParams;
use crate::sink::CsvSink;

const SEARCH_BOX: &str = r#"//textarea[@aria-label="Search" or @aria-label="بحث"]"#;
const ENGLISH_BUTTON: &str = r#"//a[contains(., 'Change to English')]"#;
/// Entry to the full-screen surface, rendered for hotel-class entities.
const FULL_SCREEN_BUTTON: &str =
    r#"//a[contains(@href, '/travel/search?') and span[text()='View all reviews']]"#;
/// Entry to the dialog surface, rendered for everything else.
const DIALOG_BUTTON: &str =
    r#"//a[@data-is_owner='false' and @role='button' and span[contains(., ' Google reviews')]]"#;
/// Reviews tab on a Maps place page.
const REVIEWS_TAB: &str = r#"//div[@aria-label="Reviews" and @id="reviews" and @role="tab"]"#;

const ENTRY_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Search Google for the entity, open whichever review surface the result
/// page offers and scrape it.
pub fn run_search(page: &dyn Page, params: &RunParams, config: &Config) -> Result<ScrapeOutcome> {
    page.goto("https://www.google.com")?;
    page.sleep(Duration::from_secs(2));

    page.fill(SEARCH_BOX, &params.entity_name)?;
    page.press("Enter")?;
    page.sleep(Duration::from_secs(5));

    // Results sometimes come back localized; the interstitial link flips
    // them to English, which every selector here depends on.
    let english = page.locate(ENGLISH_BUTTON)?;
    if english.is_visible(ENTRY_PROBE_TIMEOUT) {
        english.click(WAIT_TIMEOUT)?;
        page.sleep(Duration::from_secs(5));
    }

    let full_screen = page.locate(FULL_SCREEN_BUTTON)?;
    if full_screen.is_visible(ENTRY_PROBE_TIMEOUT) {
        info!(layout = "full-screen", "opening review surface");
        full_screen.click(Duration::from_secs(50))?;
        return scrape(page, &FullScreenLayout, params, config);
    }

    let dialog = page.locate(DIALOG_BUTTON)?;
    if dialog.is_visible(ENTRY_PROBE_TIMEOUT) {
        info!(layout = "dialog", "opening review surface");
        dialog.click(WAIT_TIMEOUT)?;
        // The dialog only renders its review list at desktop widths.
        page.set_viewport(1200, 800)?;
        return scrape(page, &DialogLayout, params, config);
    }

    Err(GrevError::NoEntryPoint)
}

/// Open a Maps place URL directly and scrape its full-screen surface.
pub fn run_url(page: &dyn Page, params: &RunParams, config: &Config) -> Result<ScrapeOutcome> {
    let raw = params.page_url.as_deref().filter(|u| !u.is_empty());
    let raw = raw.ok_or(GrevError::MissingUrl)?;
    Url::parse(raw).map_err(|e| GrevError::Config(format!("invalid URL {raw:?}: {e}")))?;

    page.goto(raw)?;

    let tab = page.locate(REVIEWS_TAB)?;
    if !tab.is_visible(WAIT_TIMEOUT) {
        return Err(GrevError::NoEntryPoint);
    }
    tab.click(Duration::from_secs(90))?;
    page.sleep(Duration::from_secs(2));

    scrape(page, &FullScreenLayout, params, config)
}

/// Output-directory name for URL mode when the caller supplies none: the
/// URL's host, or a fixed placeholder when the URL has no parseable host.
pub fn entity_name_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "google_place".to_string())
}

/// Shared tail of both entry points.
fn scrape(
    page: &dyn Page,
    layout: &dyn PageLayout,
    params: &RunParams,
    config: &Config,
) -> Result<ScrapeOutcome> {
    // Metadata before prepare(): the aggregate rating covers all sources,
    // so it is read before the source filter narrows the list to Google.
    let overall = layout.overall_rating(page, &params.entity_name)?;
    info!(
        layout = layout.name(),
        rating = ?overall.rating,
        review_count = ?overall.review_count,
        "extracted overall rating"
    );

    let sink = if params.save_reviews || params.save_metadata {
        Some(CsvSink::new(
            &config.output_dir(),
            &params.entity_name,
            Local::now(),
        ))
    } else {
        None
    };

    if params.save_metadata {
        if let Some(sink) = &sink {
            sink.write_metadata(&overall)?;
        }
    }

    layout.prepare(page)?;
    page.sleep(Duration::from_secs(2));
    layout.apply_sort(page, params.sort_by)?;

    let review_sink = if params.save_reviews { sink.as_ref() } else { None };
    paginate::paginate(page, layout, params, review_sink, &overall)
}
