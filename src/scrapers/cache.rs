//! Cached question bundles from the GitHub mirror.
//!
//! An alternate source that bypasses live scraping entirely: a repository
//! holds one pre-scraped JSON bundle per exam file, named
//! `<exam>_<seq>.json`. Resolution lists the provider folder through the
//! contents API, filters by the normalized matching rule, and orders by the
//! embedded sequence number. Each bundle is then fetched in two hops
//! (descriptor JSON -> `download_url` -> typed bundle) and flattened into
//! one record per sub-question.
//!
//! An empty or malformed listing is a cache miss, not an error; the caller
//! falls back to live scraping.

use tracing::{info, warn};

use crate::fetch::{RateLimiter, RetryingClient, MAX_CONCURRENT_REQUESTS};
use crate::models::{CacheBundle, CacheFile, CacheQuestion, Question};
use crate::scrapers::gather_ordered;
use crate::utils::{
    capitalize_first, clean_text, extract_number_from_path, grep_cache_string, name_from_link,
};

/// Keep the descriptors matching `filter` and return their URLs ordered by
/// embedded sequence number (missing numbers sort first as -1).
fn filter_and_sort(files: Vec<CacheFile>, filter: &str) -> Vec<String> {
    let mut matching: Vec<(i64, String)> = files
        .into_iter()
        .filter(|file| grep_cache_string(&file.url, filter))
        .map(|file| (extract_number_from_path(&file.name), file.url))
        .collect();
    matching.sort_by_key(|(number, _)| *number);
    matching.into_iter().map(|(_, url)| url).collect()
}

/// Resolve the cache-bundle URLs for `provider` matching `filter`.
///
/// Returns an empty list on any listing failure (fetch, parse) so the
/// pipeline can treat it as a cache miss.
pub async fn cached_links(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    cache_url: &str,
    provider: &str,
    filter: &str,
) -> Vec<String> {
    let url = format!("{cache_url}/{}", capitalize_first(provider));
    limiter.acquire().await;

    let Some(body) = fetcher.fetch(&url).await else {
        warn!(%url, "cache listing unavailable");
        return Vec::new();
    };

    let files: Vec<CacheFile> = match serde_json::from_slice(&body) {
        Ok(files) => files,
        Err(e) => {
            warn!(%url, error = %e, "malformed cache listing; treating as cache miss");
            return Vec::new();
        }
    };

    let links = filter_and_sort(files, filter);
    info!(count = links.len(), provider, "resolved cached bundle links");
    links
}

/// Flatten one bundle into records, one per sub-question.
///
/// Titles carry the exam name only at this point; the run-wide `question #N`
/// suffix is assigned after aggregation so the numbering is deterministic.
fn flatten_bundle(questions: Vec<CacheQuestion>, name: &str) -> Vec<Question> {
    questions
        .into_iter()
        .map(|q| {
            let mut comments = String::new();
            for entry in &q.discussion {
                comments.push_str(&format!("[{}] {}\n", entry.poster, entry.content));
            }

            // BTreeMap iteration gives the choices in sorted key order.
            let mut choices_block = String::new();
            for (key, value) in &q.choices {
                choices_block.push_str(&format!("**{key}:** {value}\n\n"));
            }

            Question {
                title: format!("Examtopics {name}"),
                header: q.question_text,
                content: q.question_images.join("\n"),
                choices: vec![choices_block],
                answer: q.answer,
                timestamp: q.timestamp,
                link: q.url,
                comments: clean_text(&comments),
            }
        })
        .collect()
}

async fn bundle_questions(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    link: String,
) -> Option<Vec<Question>> {
    limiter.acquire().await;
    let descriptor = fetcher.fetch(&link).await?;

    let descriptor: serde_json::Value = match serde_json::from_slice(&descriptor) {
        Ok(value) => value,
        Err(e) => {
            warn!(%link, error = %e, "malformed bundle descriptor");
            return None;
        }
    };
    let Some(download_url) = descriptor.get("download_url").and_then(|v| v.as_str()) else {
        warn!(%link, "bundle descriptor has no download_url");
        return None;
    };

    limiter.acquire().await;
    let body = fetcher.fetch(download_url).await?;
    let bundle: CacheBundle = match serde_json::from_slice(&body) {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!(%download_url, error = %e, "malformed question bundle");
            return None;
        }
    };

    if bundle.page_props.questions.is_empty() {
        warn!(%download_url, "bundle contains no questions");
        return None;
    }

    info!(%download_url, count = bundle.page_props.questions.len(), "processing bundle");
    Some(flatten_bundle(bundle.page_props.questions, &name_from_link(&link)))
}

/// Append the run-wide sequential title suffix, `#1`, `#2`, ... across every
/// record of the run (never reset per file).
fn number_questions(questions: &mut [Question]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.title = format!("{} question #{}", question.title, index + 1);
    }
}

/// Fetch and flatten every cached bundle, preserving link order, then apply
/// the run-wide numbering.
pub async fn fetch_cached_questions(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    links: Vec<String>,
) -> Vec<Question> {
    let bundles: Vec<Vec<Question>> = gather_ordered(links, MAX_CONCURRENT_REQUESTS, |link| {
        bundle_questions(fetcher, limiter, link)
    })
    .await;

    let mut questions: Vec<Question> = bundles.into_iter().flatten().collect();
    number_questions(&mut questions);
    info!(count = questions.len(), "flattened cached bundles");
    questions
}
