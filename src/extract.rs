//! Per-record extraction: one review DOM node in, one `ReviewRecord` out.
//!
//! Each page layout renders a review in one of two sub-shapes, depending on
//! whether it was posted on Google or pulled in from a third-party
//! aggregator. The probe for the Google-path author element picks the code
//! path; everything downstream (text segmentation, posted-date resolution,
//! stop-criterion test, image gallery, rating split) is shared.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::dates;
use crate::driver::{Node, PROBE_TIMEOUT};
use crate::error::{GrevError, Result};
use crate::params::StopCriterion;
use crate::record::ReviewRecord;
use crate::segment;

/// Thumbnail-size path segment in full-screen gallery URLs.
static FULL_SCRN_THUMB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"w\d+-h\d+-k-no-p").expect("invalid thumbnail regex"));

/// Dialog-variant thumbnail segment.
static DIALOG_THUMB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"w\d+-h\d+-p-n-k-no").expect("invalid thumbnail regex"));

/// First rating tag of a dialog review, e.g. "Rooms: 4/5".
static DIALOG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+:\s\d/5").expect("invalid rating tag regex"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Requested resolution for gallery assets.
const FULL_RES: &str = "w800-h800";

/// XPath fragments addressing sub-elements of one review node.
pub mod selectors {
    /// Author link of a review posted on Google (full-screen layout).
    pub const FS_GOOGLE_AUTHOR: &str = "div[1]/div/span/a";
    /// Author name of a review posted elsewhere.
    pub const FS_OTHER_AUTHOR: &str = "div[1]/div/span/span[1]";
    /// Optional profile link of a review posted elsewhere.
    pub const FS_OTHER_PROFILE: &str = "div[1]/div/span/span[2]/a";
    /// Innermost node holding an "N/5" rating; the inner [not(...)] clause
    /// keeps the probe from grabbing a container around it.
    pub const FS_RATING_OF_5: &str =
        r#"//div[contains(., "/5")][not(.//div[contains(., "/5")])]"#;
    pub const FS_RATING_OF_10: &str =
        r#"//div[contains(., "/10")][not(.//div[contains(., "/10")])]"#;
    /// Visible text fragments under the body region, minus known noise
    /// labels, separator glyphs, icon-only fragments and nested duplicates.
    pub const FS_TEXT_BLOCK: &str = r#"div[2]//span[normalize-space() != "Business" and normalize-space() != "Vacation" and normalize-space() != "Family" and normalize-space() != "Friends" and normalize-space() != "Couple" and normalize-space() != "Solo" and not(contains(., " ❘ ")) and not(contains(., "Read more")) and not(contains(., "Report review")) and not(.//svg) ][not(.//span/span)] | div[2]//p[not(contains(., " ❘ ")) and not(contains(., "Read more")) and not(contains(., "Report review")) and not(.//svg)][not(.//p/span)]"#;
    pub const FS_STAY_TYPE: &str = "div[2]/div/span";
    pub const FS_IMAGES: &str = "div[2]//img[contains(@alt, 'Photo')]";

    /// "<relative> ago on <site>" node; carries both date and source site.
    pub const POSTED_ON_SITE: &str =
        "//span[contains(., 'ago on')][not(.//span[contains(., 'ago on')])]";
    /// Plain "<relative> ago" fallback; the site stays unknown.
    pub const POSTED_PLAIN: &str =
        "//span[contains(., ' ago')][not(.//span[contains(., ' ago')])]";

    /// Presence of this block means a dialog review was posted on Google.
    pub const DLG_GOOGLE_BLOCK: &str = "div[1]";
    pub const DLG_AUTHOR: &str = "div[1]/div/div/a";
    pub const DLG_RATING: &str = "div[1]/span";
    /// Region holding stay type, review text and rating tags.
    pub const DLG_REVIEW_REGION: &str = "div[1]/div[3]/div/div[1]";
    /// Sibling region holding the original-language text of a translated
    /// review; absent otherwise.
    pub const DLG_ORIGINAL_REGION: &str = "div[1]/div[3]/div/div[2]";
    pub const DLG_CAROUSEL: &str = "div[2]/g-scrolling-carousel";
    pub const DLG_CAROUSEL_PHOTOS: &str =
        "div[2]/g-scrolling-carousel//div[@aria-label = 'Photos']";
    pub const DLG_OTHER_AUTHOR: &str = "a/div[1]/span[1]";
    pub const DLG_OTHER_DATE: &str = "a/div[1]/span[2]";
    pub const DLG_OTHER_RATING: &str = "a/span";
    pub const DLG_OTHER_TEXT: &str = "a/div[2]";
}

/// Shared per-node extraction context.
#[derive(Clone, Copy)]
pub struct ExtractContext<'a> {
    pub stop_criterion: Option<&'a StopCriterion>,
    /// 1-based scroll-window index, for failure logging.
    pub window_idx: usize,
    /// 1-based offset of the node within its window.
    pub offset: usize,
    pub now: DateTime<Local>,
}

/// Outcome of extracting one node.
pub enum Extracted {
    Record(Box<ReviewRecord>),
    /// The stop criterion matched inside this node; the caller discards the
    /// node and halts pagination.
    StopCriterionMet,
}

/// Extract one review node of the full-screen layout.
pub fn extract_full_screen(node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
    let google_author = node.locate(selectors::FS_GOOGLE_AUTHOR)?;
    let (username, user_profile_url, rating_raw) = if google_author.is_visible(PROBE_TIMEOUT) {
        (
            google_author.text()?,
            google_author.attribute("href")?,
            node.locate(selectors::FS_RATING_OF_5)?.text()?,
        )
    } else {
        let username = node.locate(selectors::FS_OTHER_AUTHOR)?.text()?;
        let profile_link = node.locate(selectors::FS_OTHER_PROFILE)?;
        let user_profile_url = if profile_link.is_visible(PROBE_TIMEOUT) {
            profile_link.attribute("href")?
        } else {
            None
        };
        (
            username,
            user_profile_url,
            node.locate(selectors::FS_RATING_OF_10)?.text()?,
        )
    };

    let lines = node.locate(selectors::FS_TEXT_BLOCK)?.all_texts()?;
    let segmented = segment::segment(&lines, ctx.now);

    if stop_criterion_met(node, ctx.stop_criterion)? {
        return Ok(Extracted::StopCriterionMet);
    }

    let (posted_at_humanized, source_site) = resolve_posted_date(node)?;
    let posted_at_absolute = dates::normalize(&posted_at_humanized, ctx.now);

    let stay_type = optional_text(node, selectors::FS_STAY_TYPE)?;
    let image_urls = collect_gallery_images(node)?;
    let (rating_score, rating_scale) = split_rating(&rating_raw)?;

    Ok(Extracted::Record(Box::new(ReviewRecord {
        username,
        user_profile_url,
        review_text_localized: segmented.localized_text,
        review_text_original: segmented.original_text,
        rating_tags: segmented.rating_tags,
        owner_response_text: segmented.owner_response_text,
        owner_response_time: segmented.owner_response_time,
        posted_at_humanized,
        posted_at_absolute,
        source_site,
        rating_score,
        rating_scale,
        stay_type,
        image_urls,
    })))
}

/// Extract one review node of the dialog layout.
pub fn extract_dialog(node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
    if node.locate(selectors::DLG_GOOGLE_BLOCK)?.is_visible(PROBE_TIMEOUT) {
        extract_dialog_google(node, ctx)
    } else {
        extract_dialog_other_site(node, ctx)
    }
}

fn extract_dialog_google(node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
    let author = node.locate(selectors::DLG_AUTHOR)?;
    let username = author.text()?;
    let user_profile_url = author.attribute("href")?;
    let rating_raw = node.locate(selectors::DLG_RATING)?.text()?;

    let (stay_type, primary_text, rating_tags) =
        region_fields(node, selectors::DLG_REVIEW_REGION, ctx)?;
    let (_, original_region_text, _) =
        region_fields(node, selectors::DLG_ORIGINAL_REGION, ctx)?;

    // A populated sibling region means the primary text is a translation.
    let (review_text_localized, review_text_original) = match original_region_text {
        Some(original) => (primary_text, Some(original)),
        None => (None, primary_text),
    };

    let (posted_at_humanized, source_site) = resolve_posted_date(node)?;

    // With attached pictures the owner response shifts from div[3] to div[4].
    let carousel = node.locate(selectors::DLG_CAROUSEL)?;
    let (image_urls, owner_base) = if carousel.is_visible(PROBE_TIMEOUT) {
        (collect_carousel_images(node)?, "div[4]")
    } else {
        (Vec::new(), "div[3]")
    };
    let (owner_response_time, owner_response_text) =
        resolve_owner_response(node, owner_base, ctx)?;

    let posted_at_absolute = dates::normalize(&posted_at_humanized, ctx.now);
    let (rating_score, rating_scale) = split_rating(&rating_raw)?;

    if stop_criterion_met(node, ctx.stop_criterion)? {
        return Ok(Extracted::StopCriterionMet);
    }

    Ok(Extracted::Record(Box::new(ReviewRecord {
        username,
        user_profile_url,
        review_text_localized,
        review_text_original,
        rating_tags,
        owner_response_text,
        owner_response_time,
        posted_at_humanized,
        posted_at_absolute,
        source_site,
        rating_score,
        rating_scale,
        stay_type,
        image_urls,
    })))
}

fn extract_dialog_other_site(node: &dyn Node, ctx: &ExtractContext) -> Result<Extracted> {
    let username = node.locate(selectors::DLG_OTHER_AUTHOR)?.text()?;

    let date_raw = tidy(&node.locate(selectors::DLG_OTHER_DATE)?.text()?)
        .ok_or_else(|| GrevError::Extraction("empty posted-date text".into()))?;
    let posted_at_humanized = date_raw
        .split("ago on")
        .next()
        .unwrap_or(&date_raw)
        .trim()
        .to_string();

    let rating_raw = tidy(&node.locate(selectors::DLG_OTHER_RATING)?.text()?)
        .ok_or_else(|| GrevError::Extraction("empty rating text".into()))?;

    let review_text_original = tidy(&node.locate(selectors::DLG_OTHER_TEXT)?.text()?);

    let posted_at_absolute = dates::normalize(&posted_at_humanized, ctx.now);
    let (rating_score, rating_scale) = split_rating(&rating_raw)?;

    if stop_criterion_met(node, ctx.stop_criterion)? {
        return Ok(Extracted::StopCriterionMet);
    }

    Ok(Extracted::Record(Box::new(ReviewRecord {
        username,
        posted_at_humanized,
        posted_at_absolute,
        review_text_original,
        source_site: Some("other".to_string()),
        rating_score,
        rating_scale,
        ..Default::default()
    })))
}

/// Resolves {stay type, review text, rating tags} under one dialog review
/// region addressed by a relative path.
///
/// The region shape varies: three child divs mean a stay-type line precedes
/// the text, two mean either text or stay type alone, one means no text at
/// all. The review text itself nests one span deeper when expandable.
fn region_fields(
    node: &dyn Node,
    region: &str,
    ctx: &ExtractContext,
) -> Result<(Option<String>, Option<String>, Option<String>)> {
    let sections = node.locate_all(&format!("{region}/div"))?;

    let (stay_path, review_path) = if sections.len() > 2 {
        let review = if !node
            .locate_all(&format!("{region}/div[2]/span/span/span"))?
            .is_empty()
        {
            Some(format!("{region}/div[2]/span/span/span"))
        } else if !node
            .locate_all(&format!("{region}/div[2]/span/span"))?
            .is_empty()
        {
            Some(format!("{region}/div[2]/span/span"))
        } else {
            None
        };
        (Some(format!("{region}/div[1]")), review)
    } else if sections.len() > 1 {
        if !node
            .locate_all(&format!("{region}/div[1]/span/span/span"))?
            .is_empty()
        {
            (None, Some(format!("{region}/div[1]/span/span/span")))
        } else if !node
            .locate_all(&format!("{region}/div[1]/span/span"))?
            .is_empty()
        {
            (None, Some(format!("{region}/div[1]/span/span")))
        } else {
            // Stay type with no review text.
            (Some(format!("{region}/div[1]")), None)
        }
    } else {
        info!(
            window = ctx.window_idx,
            offset = ctx.offset,
            region,
            "no review text found"
        );
        (None, None)
    };

    let stay_type = match stay_path {
        Some(path) => tidy(&node.locate(&path)?.text()?),
        None => None,
    };

    let (review_text, rating_tags) = match review_path {
        Some(path) => {
            let raw = node.locate(&path)?.text()?;
            let (review, tags) = split_dialog_tags(&raw);
            (review.as_deref().and_then(tidy), tags.as_deref().and_then(tidy))
        }
        None => (None, None),
    };

    Ok((stay_type, review_text, rating_tags))
}

/// Separates prose from the "Rooms: 4/5 | Service: 5/5" tag block the dialog
/// layout renders inline. The last word of the text and the first tag label
/// can be glued together, so each known label gets a space up front before
/// the split point is searched.
fn split_dialog_tags(text: &str) -> (Option<String>, Option<String>) {
    let mut text = text.to_string();
    for label in [
        "Rooms:",
        "Service:",
        "Location:",
        "Hotel highlights:",
        "Nearby activities:",
        "Safety:",
        "Walkability:",
        "Food & drinks:",
        "Noteworthy details:",
    ] {
        text = text.replace(label, &format!(" {label}"));
    }

    match DIALOG_TAG_RE.find(&text) {
        Some(m) => {
            let review = text[..m.start()].to_string();
            let tags = text[m.start()..].to_string();
            (Some(review), Some(tags))
        }
        None => (Some(text), None),
    }
}

/// Owner responses sit under `<base>/div/div/div[1]`: first child div is the
/// humanized response time (prefixed with the marker text), second is the
/// response body, which keeps its full text in a second span when the
/// response is expandable.
fn resolve_owner_response(
    node: &dyn Node,
    base: &str,
    ctx: &ExtractContext,
) -> Result<(Option<String>, Option<String>)> {
    let anchor = format!("{base}/div/div/div[1]");
    if !node.locate(&anchor)?.is_visible(PROBE_TIMEOUT) {
        return Ok((None, None));
    }

    let time_raw = node.locate(&format!("{anchor}/div[1]"))?.text()?;
    let owner_response_time = tidy(&time_raw)
        .and_then(|t| {
            t.rsplit("Response from the owner")
                .next()
                .map(|s| s.trim().to_string())
        })
        .and_then(|humanized| dates::normalize(&humanized, ctx.now));

    let owner_response_text = if !node
        .locate_all(&format!("{anchor}/div[2]/span[2]"))?
        .is_empty()
    {
        tidy(&node.locate(&format!("{anchor}/div[2]/span[2]"))?.text()?)
    } else {
        tidy(&node.locate(&format!("{anchor}/div[2]"))?.text()?)
    };

    Ok((owner_response_time, owner_response_text))
}

fn stop_criterion_met(node: &dyn Node, stop: Option<&StopCriterion>) -> Result<bool> {
    match stop {
        Some(criterion) => Ok(criterion.matches(&node.text()?)),
        None => Ok(false),
    }
}

/// The "ago on <site>" node wins because it carries the source site; the
/// plain " ago" node is the fallback with no site.
fn resolve_posted_date(node: &dyn Node) -> Result<(String, Option<String>)> {
    let on_site = node.locate(selectors::POSTED_ON_SITE)?;
    if on_site.is_visible(PROBE_TIMEOUT) {
        let raw = tidy(&on_site.text()?)
            .ok_or_else(|| GrevError::Extraction("empty posted-date text".into()))?;
        if let Some((date, site)) = raw.split_once("ago on") {
            return Ok((date.trim().to_string(), Some(site.trim().to_string())));
        }
    }

    let plain = node.locate(selectors::POSTED_PLAIN)?;
    let date = tidy(&plain.text()?)
        .ok_or_else(|| GrevError::Extraction("empty posted-date text".into()))?;
    Ok((date, None))
}

fn optional_text(node: &dyn Node, selector: &str) -> Result<Option<String>> {
    let element = node.locate(selector)?;
    if element.is_visible(PROBE_TIMEOUT) {
        Ok(Some(element.text()?))
    } else {
        Ok(None)
    }
}

/// Gallery images, `src` with a `data-src` fallback, thumbnail path segment
/// rewritten so the URLs point at full-resolution assets.
fn collect_gallery_images(node: &dyn Node) -> Result<Vec<String>> {
    if !node.locate(selectors::FS_IMAGES)?.is_visible(PROBE_TIMEOUT) {
        return Ok(Vec::new());
    }

    let mut urls = Vec::new();
    for img in node.locate_all(selectors::FS_IMAGES)? {
        let src = match img.attribute("src")? {
            Some(src) if !src.is_empty() => Some(src),
            _ => img.attribute("data-src")?,
        };
        if let Some(src) = src {
            urls.push(FULL_SCRN_THUMB_RE.replace_all(&src, FULL_RES).into_owned());
        }
    }
    Ok(urls)
}

/// Carousel photos carry their URL in an inline background-image style.
fn collect_carousel_images(node: &dyn Node) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for photo in node.locate_all(selectors::DLG_CAROUSEL_PHOTOS)? {
        if let Some(style) = photo.attribute("style")? {
            let url = style.replace("background-image:url(", "").replace(')', "");
            urls.push(DIALOG_THUMB_RE.replace_all(&url, FULL_RES).into_owned());
        }
    }
    Ok(urls)
}

/// Split "4/5" into score and scale.
fn split_rating(raw: &str) -> Result<(f64, f64)> {
    let raw = raw.trim();
    let (score, scale) = raw
        .split_once('/')
        .ok_or_else(|| GrevError::Extraction(format!("rating string without '/': {raw:?}")))?;
    let score = score
        .trim()
        .parse()
        .map_err(|_| GrevError::Extraction(format!("unparseable rating score: {raw:?}")))?;
    let scale = scale
        .trim()
        .parse()
        .map_err(|_| GrevError::Extraction(format!("unparseable rating scale: {raw:?}")))?;
    Ok((score, scale))
}

/// Collapse runs of whitespace and trim; None when nothing is left.
fn tidy(text: &str) -> Option<String> {
    let cleaned = WHITESPACE_RE.replace_all(text, " ").trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}
