//! CSV persistence.
//!
//! Each run writes into its own timestamped directory: one metadata file,
//! overwritten whole, and one reviews file per sort order, appended to
//! window by window so a crashed run keeps everything collected so far.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::WriterBuilder;

use crate::error::Result;
use crate::params::SortBy;
use crate::record::{OverallRating, ReviewRecord};

pub const METADATA_FILE: &str = "metadata.csv";

const REVIEW_HEADER: [&str; 14] = [
    "username",
    "user_profile_url",
    "review_text_localized",
    "review_text_original",
    "rating_tags",
    "owner_response_text",
    "owner_response_time",
    "posted_at_humanized",
    "posted_at_absolute",
    "source_site",
    "rating_score",
    "rating_scale",
    "stay_type",
    "image_urls",
];

const METADATA_HEADER: [&str; 8] = [
    "rating",
    "no_of_reviews",
    "5-star",
    "4-star",
    "3-star",
    "2-star",
    "1-star",
    "entity_name",
];

/// Writes one run's CSV files under a per-run directory.
pub struct CsvSink {
    run_dir: PathBuf,
}

impl CsvSink {
    /// The directory is named from the entity and start time but only
    /// created on first write, so a run that saves nothing leaves nothing.
    pub fn new(output_dir: &Path, entity_name: &str, started_at: DateTime<Local>) -> Self {
        let dir_name = format!(
            "{entity_name}_{}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );
        Self {
            run_dir: output_dir.join(dir_name),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write the metadata file, replacing any previous contents.
    pub fn write_metadata(&self, overall: &OverallRating) -> Result<()> {
        fs::create_dir_all(&self.run_dir)?;
        let mut writer = csv::Writer::from_path(self.run_dir.join(METADATA_FILE))?;
        writer.write_record(METADATA_HEADER)?;
        writer.write_record([
            overall.rating.map(|r| r.to_string()).unwrap_or_default(),
            overall
                .review_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            overall.five_star.clone().unwrap_or_default(),
            overall.four_star.clone().unwrap_or_default(),
            overall.three_star.clone().unwrap_or_default(),
            overall.two_star.clone().unwrap_or_default(),
            overall.one_star.clone().unwrap_or_default(),
            overall.entity_name.clone(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Append a batch of reviews to the sort-specific file, writing the
    /// header only when the file does not exist yet.
    pub fn append_reviews(&self, sort_by: SortBy, records: &[ReviewRecord]) -> Result<()> {
        fs::create_dir_all(&self.run_dir)?;
        let path = self.run_dir.join(format!("reviews_{}.csv", sort_by.as_str()));
        let write_header = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if write_header {
            writer.write_record(REVIEW_HEADER)?;
        }
        for record in records {
            writer.write_record([
                record.username.clone(),
                record.user_profile_url.clone().unwrap_or_default(),
                record.review_text_localized.clone().unwrap_or_default(),
                record.review_text_original.clone().unwrap_or_default(),
                record.rating_tags.clone().unwrap_or_default(),
                record.owner_response_text.clone().unwrap_or_default(),
                record.owner_response_time.clone().unwrap_or_default(),
                record.posted_at_humanized.clone(),
                record.posted_at_absolute.clone().unwrap_or_default(),
                record.source_site.clone().unwrap_or_default(),
                record.rating_score.to_string(),
                record.rating_scale.to_string(),
                record.stay_type.clone().unwrap_or_default(),
                record.image_urls.join(", "),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
