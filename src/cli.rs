//! Command-line interface definitions for the ExamTopics downloader.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The GitHub token can be provided via flag or the `GITHUB_TOKEN`
//! environment variable.

use clap::Parser;

/// Command-line arguments for the ExamTopics downloader.
///
/// # Examples
///
/// ```sh
/// # Scrape all gcp-ace questions for the google provider
/// examtopics_downloader -p google -s gcp-ace
///
/// # Prefer the pre-scraped cache, include discussion comments
/// examtopics_downloader -p google -s gcp-ace --cached -c
///
/// # List the exams available for a provider and exit
/// examtopics_downloader -p amazon --exams
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Name of the exam provider
    #[arg(short, long, default_value = "google")]
    pub provider: String,

    /// Substring to match in discussion links (empty matches everything)
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Path of the Markdown output file
    #[arg(short, long, default_value = "examtopics_output.md")]
    pub output: String,

    /// Include the comment/discussion text for each question
    #[arg(short, long)]
    pub comments: bool,

    /// Print the provider's exam URLs and exit without scraping
    #[arg(long)]
    pub exams: bool,

    /// Also save the unique question links to saved-links.txt
    #[arg(long)]
    pub save_links: bool,

    /// Try the pre-scraped GitHub cache before live scraping
    #[arg(long)]
    pub cached: bool,

    /// GitHub token for authenticated cache requests
    #[arg(long, env = "GITHUB_TOKEN")]
    pub token: Option<String>,
}
