//! grev: scrape Google reviews for places and hotels into CSV files.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use grev::cli::{Cli, Commands, ScrapeOpts};
use grev::config::Config;
use grev::params::RunParams;
use grev::playwright::PlaywrightPage;
use grev::{run, Result};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = execute() {
        eprintln!("{} {e}", "error:".red().bold());
        if let Some(hint) = e.hint() {
            eprintln!("\n{hint}");
        }
        std::process::exit(1);
    }
}

fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let (params, opts) = build_params(&cli);
    let headless = opts.headless || !config.headed;

    let page = PlaywrightPage::launch(headless)?;
    let outcome = if params.page_url.is_some() {
        run::run_url(&page, &params, &config)
    } else {
        run::run_search(&page, &params, &config)
    };
    page.close()?;
    let outcome = outcome?;

    println!(
        "\n{} {} reviews ({} from Google) across {} of ~{} windows: {}",
        "done:".green().bold(),
        outcome.reviews.len(),
        outcome.google_count,
        outcome.windows_parsed,
        outcome.expected_windows,
        outcome.stop,
    );
    Ok(())
}

fn build_params(cli: &Cli) -> (RunParams, &ScrapeOpts) {
    let (mut params, opts) = match &cli.command {
        Commands::Search { place, opts } => (RunParams::new(place.clone()), opts),
        Commands::Url { url, name, opts } => {
            let entity_name = name
                .clone()
                .unwrap_or_else(|| run::entity_name_from_url(url));
            let mut params = RunParams::new(entity_name);
            params.page_url = Some(url.clone());
            (params, opts)
        }
    };

    params.sort_by = opts.sort_by;
    params.n_reviews = opts.n_reviews;
    params.stop_criterion = opts.stop_criterion();
    params.save_reviews = !opts.no_save_reviews;
    params.save_metadata = !opts.no_save_metadata;

    (params, opts)
}
