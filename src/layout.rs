//! The two page layouts Google serves for an entity's reviews.
//!
//! Hotel-class entities open a full-screen review surface; everything else
//! gets a scrollable dialog. Both paginate by infinite scroll in windows of
//! ten reviews, but differ in selectors, sort controls, metadata shape and
//! per-record markup. `PageLayout` hides all of that from the pagination
//! loop.

use tracing::debug;

use crate::driver::{Node, Page, METADATA_TIMEOUT, PROBE_TIMEOUT, WAIT_TIMEOUT};
use crate::error::{GrevError, Result};
use crate::extract::{self, ExtractContext, Extracted};
use crate::params::SortBy;
use crate::record::OverallRating;

/// Layout-specific behavior behind the shared pagination loop.
pub trait PageLayout {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// One-time setup after the surface opens, before metadata extraction.
    fn prepare(&self, page: &dyn Page) -> Result<()>;

    /// Aggregate rating metadata. Failing here aborts the run; a surface
    /// without its summary element will not render reviews either.
    fn overall_rating(&self, page: &dyn Page, entity_name: &str) -> Result<OverallRating>;

    fn apply_sort(&self, page: &dyn Page, sort_by: SortBy) -> Result<()>;

    /// Whether the 1-based scroll window exists yet.
    fn window_present(&self, page: &dyn Page, idx: usize) -> bool;

    fn window_node(&self, page: &dyn Page, idx: usize) -> Result<Box<dyn Node>>;

    /// The review node at a 1-based offset within a window.
    fn review_node(&self, window: &dyn Node, offset: usize) -> Result<Box<dyn Node>>;

    fn extract(&self, node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted>;

    /// Small upward scroll applied after each jump to the bottom, which
    /// nudges the lazy loader into fetching the next window.
    fn scroll_back(&self) -> i64;
}

/// Full-screen review surface (hotel entities).
pub struct FullScreenLayout;

/// Container of the scroll windows.
const FS_CONTAINER: &str = r#"//c-wiz[@data-node-index="0;0" and @c-wiz and @jscontroller and @jsaction and @decode-data-ved="1"]/div/div"#;

const FS_SUMMARY: &str =
    r#"//div[contains(@aria-label, 'out of 5 stars from ') and @role='text']"#;

const FS_SOURCE_OPTIONS: &str = r#"//div[@aria-label="Review Source Options"]"#;
const FS_SOURCE_GOOGLE: &str =
    r#"//div[@role='listbox']//div[@role='option' and contains(., 'Google')]"#;
const FS_SORT_OPTIONS: &str = r#"//div[@aria-label="Review Sort Options"]"#;

impl FullScreenLayout {
    fn sort_option_selector(sort_by: SortBy) -> String {
        let (data_value, label) = match sort_by {
            SortBy::MostHelpful => (1, "Most helpful"),
            SortBy::MostRecent => (2, "Most recent"),
            SortBy::HighestScore => (3, "Highest score"),
            SortBy::LowestScore => (4, "Lowest score"),
        };
        format!(
            r#"//div[@role='listbox']//div[@role='option' and @data-value='{data_value}' and @aria-label='{label}']"#
        )
    }

    fn star_bucket(page: &dyn Page, stars: u8) -> Result<Option<String>> {
        let selector =
            format!(r#"//div[contains(@aria-label, '{stars}-star reviews') and @role='text']"#);
        let node = page.locate(&selector)?;
        if !node.is_visible(PROBE_TIMEOUT) {
            return Ok(None);
        }
        // aria-label: "5-star reviews 54 percent."
        let label = match node.attribute("aria-label")? {
            Some(label) => label,
            None => return Ok(None),
        };
        let percent = label
            .split("-star reviews ")
            .nth(1)
            .and_then(|rest| rest.split(" percent").next())
            .map(|p| format!("{}%", p.trim()));
        Ok(percent)
    }
}

impl PageLayout for FullScreenLayout {
    fn name(&self) -> &'static str {
        "full-screen"
    }

    /// Restrict the source filter to Google so the review list and the
    /// aggregate metadata describe the same population.
    fn prepare(&self, page: &dyn Page) -> Result<()> {
        let source_options = page.locate(FS_SOURCE_OPTIONS)?;
        if !source_options.is_visible(WAIT_TIMEOUT) {
            debug!("no review source filter on this surface");
            return Ok(());
        }
        source_options.click(WAIT_TIMEOUT)?;
        page.sleep(std::time::Duration::from_secs(5));
        page.locate(FS_SOURCE_GOOGLE)?.click(WAIT_TIMEOUT)?;
        page.sleep(std::time::Duration::from_secs(5));
        Ok(())
    }

    fn overall_rating(&self, page: &dyn Page, entity_name: &str) -> Result<OverallRating> {
        let summary = page.locate(FS_SUMMARY)?;
        if !summary.is_attached(METADATA_TIMEOUT) {
            return Err(GrevError::MetadataUnavailable);
        }

        // aria-label: "3.6 out of 5 stars from 206 reviews"
        let label = summary
            .attribute("aria-label")?
            .ok_or(GrevError::MetadataUnavailable)?;
        let rating = label
            .split(" out of ")
            .next()
            .and_then(|s| s.trim().parse().ok());
        let review_count = label
            .split(" stars from ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.replace(',', "").parse().ok());

        Ok(OverallRating {
            entity_name: entity_name.to_string(),
            rating,
            review_count,
            five_star: Self::star_bucket(page, 5)?,
            four_star: Self::star_bucket(page, 4)?,
            three_star: Self::star_bucket(page, 3)?,
            two_star: Self::star_bucket(page, 2)?,
            one_star: Self::star_bucket(page, 1)?,
        })
    }

    fn apply_sort(&self, page: &dyn Page, sort_by: SortBy) -> Result<()> {
        page.locate(FS_SORT_OPTIONS)?.click(WAIT_TIMEOUT)?;
        page.sleep(std::time::Duration::from_secs(5));
        page.locate(&Self::sort_option_selector(sort_by))?
            .click(WAIT_TIMEOUT)?;
        Ok(())
    }

    fn window_present(&self, page: &dyn Page, idx: usize) -> bool {
        match self.window_node(page, idx) {
            Ok(window) => window.is_attached(WAIT_TIMEOUT),
            Err(_) => false,
        }
    }

    fn window_node(&self, page: &dyn Page, idx: usize) -> Result<Box<dyn Node>> {
        page.locate(FS_CONTAINER)?.locate(&format!("div[{idx}]"))
    }

    fn review_node(&self, window: &dyn Node, offset: usize) -> Result<Box<dyn Node>> {
        window.locate(&format!("div[{offset}]"))
    }

    fn extract(&self, node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
        extract::extract_full_screen(node, ctx)
    }

    fn scroll_back(&self) -> i64 {
        -200
    }
}

/// Dialog review surface (non-hotel entities).
pub struct DialogLayout;

const DLG_CONTAINER: &str = r#"//div[@id="reviewSort" and @data-async-type="reviewSort"]"#;

const DLG_SUMMARY_RATING: &str =
    r#"//div[@class='review-dialog-top']//span[contains(@aria-label, ' out of 5')]"#;
const DLG_SUMMARY_COUNT: &str = r#"//div[@class='review-dialog-top']//span[contains(., 'reviews on Google')][not(.//span)]"#;

const DLG_SORT_DROPDOWN: &str =
    r#"//g-dropdown-menu//div[@role="button" and @aria-expanded="false"]"#;

impl DialogLayout {
    fn sort_option_selector(sort_by: SortBy) -> String {
        let label = match sort_by {
            SortBy::MostHelpful => "Most relevant",
            SortBy::MostRecent => "Newest",
            SortBy::HighestScore => "Highest rating",
            SortBy::LowestScore => "Lowest rating",
        };
        format!(
            r#"//g-menu[@role='menu']/g-menu-item[@role='menuitemradio' and div[text()= '{label}'] ]"#
        )
    }
}

impl PageLayout for DialogLayout {
    fn name(&self) -> &'static str {
        "dialog"
    }

    fn prepare(&self, _page: &dyn Page) -> Result<()> {
        Ok(())
    }

    fn overall_rating(&self, page: &dyn Page, entity_name: &str) -> Result<OverallRating> {
        let rating_node = page.locate(DLG_SUMMARY_RATING)?;
        if !rating_node.is_attached(METADATA_TIMEOUT) {
            return Err(GrevError::MetadataUnavailable);
        }
        // aria-label: "Rated 4.1 out of 5,"
        let rating = rating_node.attribute("aria-label")?.and_then(|label| {
            label
                .split(" out of ")
                .next()
                .and_then(|s| s.rsplit(' ').next())
                .and_then(|s| s.parse().ok())
        });

        let count_node = page.locate(DLG_SUMMARY_COUNT)?;
        if !count_node.is_attached(METADATA_TIMEOUT) {
            return Err(GrevError::MetadataUnavailable);
        }
        // Text: "1,065 reviews on Google". Some locales render the count with
        // a decimal point, so fall back to parsing as float.
        let review_count = count_node.text()?.split_whitespace().next().and_then(|n| {
            let n = n.replace(',', "");
            n.parse::<u64>().ok().or_else(|| n.parse::<f64>().ok().map(|f| f as u64))
        });

        Ok(OverallRating {
            entity_name: entity_name.to_string(),
            rating,
            review_count,
            ..Default::default()
        })
    }

    fn apply_sort(&self, page: &dyn Page, sort_by: SortBy) -> Result<()> {
        page.locate(DLG_SORT_DROPDOWN)?.click(WAIT_TIMEOUT)?;
        page.sleep(std::time::Duration::from_secs(2));
        page.locate(&Self::sort_option_selector(sort_by))?
            .click(WAIT_TIMEOUT)?;
        Ok(())
    }

    fn window_present(&self, page: &dyn Page, idx: usize) -> bool {
        match self.window_node(page, idx) {
            Ok(window) => window.is_attached(WAIT_TIMEOUT),
            Err(_) => false,
        }
    }

    fn window_node(&self, page: &dyn Page, idx: usize) -> Result<Box<dyn Node>> {
        page.locate(DLG_CONTAINER)?.locate(&format!("div[{idx}]"))
    }

    fn review_node(&self, window: &dyn Node, offset: usize) -> Result<Box<dyn Node>> {
        window.locate(&format!("div[@data-google-review-count]/div[{offset}]"))
    }

    fn extract(&self, node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
        extract::extract_dialog(node, ctx)
    }

    fn scroll_back(&self) -> i64 {
        -50
    }
}
