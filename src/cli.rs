use clap::{Args, Parser, Subcommand};

use crate::params::{SortBy, StopCriterion};

#[derive(Parser)]
#[command(
    name = "grev",
    about = "Scrape Google reviews for places and hotels",
    version,
    after_help = "EXAMPLES:\n    grev search \"Hotel Luna Paris\"\n    grev search \"Cafe Central\" --sort-by most_recent -n 50\n    grev url \"https://www.google.com/travel/search?q=...\" --name \"Hotel Luna\"\n    grev search \"Hotel Luna\" --stop-username \"Jane Roe\" --stop-review \"great pool\""
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search Google for a place and scrape its reviews
    Search {
        /// Name of the place or hotel to search for
        place: String,

        #[command(flatten)]
        opts: ScrapeOpts,
    },

    /// Scrape reviews from a Google page URL directly
    Url {
        /// Google page URL of the place
        url: String,

        /// Name used for the output directory (defaults to the URL host)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        opts: ScrapeOpts,
    },
}

#[derive(Args)]
pub struct ScrapeOpts {
    /// Review sort order
    #[arg(long, value_enum, default_value_t = SortBy::MostHelpful)]
    pub sort_by: SortBy,

    /// Maximum number of reviews to collect; -1 for all
    #[arg(short = 'n', long, default_value_t = -1, allow_hyphen_values = true)]
    pub n_reviews: i64,

    /// Stop when a review by this username is reached (with --stop-review)
    #[arg(long, requires = "stop_review")]
    pub stop_username: Option<String>,

    /// Stop when a review containing this text is reached (with --stop-username)
    #[arg(long, requires = "stop_username")]
    pub stop_review: Option<String>,

    /// Do not write the reviews CSV
    #[arg(long)]
    pub no_save_reviews: bool,

    /// Do not write the metadata CSV
    #[arg(long)]
    pub no_save_metadata: bool,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,
}

impl ScrapeOpts {
    /// Both halves are required together, enforced by clap.
    pub fn stop_criterion(&self) -> Option<StopCriterion> {
        match (&self.stop_username, &self.stop_review) {
            (Some(username), Some(review_text)) => Some(StopCriterion {
                username: username.clone(),
                review_text: review_text.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stop_flags_require_each_other() {
        let result = Cli::try_parse_from(["grev", "search", "Hotel", "--stop-username", "jane"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "grev",
            "search",
            "Hotel",
            "--stop-username",
            "jane",
            "--stop-review",
            "great pool",
        ])
        .unwrap();
        let Commands::Search { opts, .. } = cli.command else {
            panic!("expected search subcommand");
        };
        assert!(opts.stop_criterion().is_some());
    }

    #[test]
    fn test_negative_review_cap_parses() {
        let cli = Cli::try_parse_from(["grev", "search", "Hotel", "-n", "-1"]).unwrap();
        let Commands::Search { opts, .. } = cli.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(opts.n_reviews, -1);
    }
}
