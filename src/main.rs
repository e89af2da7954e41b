//! # ExamTopics Downloader
//!
//! Harvests question/answer records from the paginated ExamTopics discussion
//! index (or, when `--cached` is set, a pre-scraped GitHub mirror) and
//! renders them to a single Markdown document.
//!
//! ## Usage
//!
//! ```sh
//! examtopics_downloader -p google -s gcp-ace -o gcp-ace.md -c
//! ```
//!
//! ## Architecture
//!
//! The application is a fetch-and-assemble pipeline:
//! 1. **Discovery**: read the provider's page count, fetch every listing
//!    page concurrently, and collect matching discussion links
//! 2. **Resolution**: deduplicate the links and sort them by
//!    (topic, question) number
//! 3. **Fetching**: download each question page (or cached JSON bundle)
//!    under a shared rate limit and bounded worker pool
//! 4. **Output**: write the Markdown document (and optionally a link list)
//!
//! Per-item failures are absorbed along the way and only reduce the result
//! count; output-file failures are the one thing that aborts a run.

use clap::Parser;
use std::error::Error;
use tracing::{info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod fetch;
mod links;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use fetch::{build_client, RateLimiter, RetryingClient, BASE_URL, REQUESTS_PER_SECOND};
use scrapers::{live, Endpoints};
use utils::add_base_url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();

    let fetcher = RetryingClient::new(build_client(None)?);

    if args.exams {
        let exams = live::provider_exams(&fetcher, BASE_URL, &args.provider).await?;
        println!("Exams for provider '{}'\n", args.provider);
        for exam in exams {
            println!("{}", add_base_url(BASE_URL, &exam));
        }
        return Ok(());
    }

    if args.search.is_empty() {
        warn!("running without a search filter; every discussion link will match");
    }

    let limiter = RateLimiter::new(REQUESTS_PER_SECOND);

    // The bearer credential stays on a cache-path-only client so it is
    // never sent to the live site.
    let cache_fetcher = if args.cached {
        Some(RetryingClient::new(build_client(args.token.as_deref())?))
    } else {
        None
    };

    let questions = scrapers::collect_questions(
        &fetcher,
        cache_fetcher.as_ref(),
        &limiter,
        Endpoints::default(),
        &args.provider,
        &args.search,
    )
    .await;

    limiter.stop();

    if args.save_links {
        outputs::links::save_links(&questions, "saved-links.txt").await?;
    }

    outputs::markdown::write_questions(&questions, &args.output, args.comments).await?;

    info!(
        path = %args.output,
        count = questions.len(),
        elapsed = ?start_time.elapsed(),
        "saved output"
    );
    Ok(())
}
