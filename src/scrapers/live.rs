//! Live scraping of ExamTopics discussion pages.
//!
//! Two phases, both rate-limited and bounded to
//! [`MAX_CONCURRENT_REQUESTS`](crate::fetch::MAX_CONCURRENT_REQUESTS)
//! workers:
//!
//! 1. **Discovery**: read the page count from the provider's listing root
//!    (defaulting to one page when the indicator is missing), then fetch
//!    every listing page and collect hrefs that contain `/discussions` and
//!    the caller's filter string.
//! 2. **Fetching**: download each resolved question page and extract the
//!    record fields through fixed selectors.
//!
//! A page that fails to fetch or parse contributes nothing and never aborts
//! its siblings.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, warn};

use crate::fetch::{RateLimiter, RetryingClient, MAX_CONCURRENT_REQUESTS};
use crate::models::Question;
use crate::scrapers::gather_ordered;
use crate::utils::{clean_text, grep_string};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static PAGE_INDICATOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".discussion-list-page-indicator strong").unwrap());
static EXAM_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(".popular-exam-link").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static HEADER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".question-discussion-header").unwrap());
static CARD_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse(".card-text").unwrap());
static CHOICE_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li.multi-choice-item").unwrap());
static CORRECT_ANSWER: Lazy<Selector> = Lazy::new(|| Selector::parse(".correct-answer").unwrap());
static META_TIMESTAMP: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".discussion-meta-data > i").unwrap());
static DISCUSSION: Lazy<Selector> = Lazy::new(|| Selector::parse(".discussion-container").unwrap());

fn select_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .flat_map(|element| element.text())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the total page count from the listing root document.
///
/// The indicator renders as "page X of N"; the second `strong` holds N.
/// Missing or unparseable indicators default to a single page.
fn parse_page_count(document: &Html) -> usize {
    document
        .select(&PAGE_INDICATOR)
        .nth(1)
        .and_then(|element| {
            element
                .text()
                .collect::<String>()
                .trim()
                .parse::<usize>()
                .ok()
        })
        .filter(|count| *count > 0)
        .unwrap_or(1)
}

/// Extract every discussion href on a listing page that matches `filter`
/// (case-insensitive; an empty filter matches all).
fn links_from_page(html: &str, filter: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| grep_string(href, "/discussions") && grep_string(href, filter))
        .map(str::to_string)
        .collect()
}

async fn page_count(fetcher: &RetryingClient, base_url: &str, provider: &str) -> usize {
    let url = format!("{base_url}/discussions/{provider}/");
    match fetcher.fetch(&url).await {
        Some(body) => parse_page_count(&Html::parse_document(&String::from_utf8_lossy(&body))),
        None => {
            warn!(%url, "could not fetch listing root; assuming a single page");
            1
        }
    }
}

/// Discover all candidate question links for `provider` matching `filter`.
///
/// Fetches every listing page concurrently; a failed page contributes zero
/// links. The returned list is raw: unsorted and possibly with duplicates.
pub async fn discover_links(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    base_url: &str,
    provider: &str,
    filter: &str,
) -> Vec<String> {
    let pages = page_count(fetcher, base_url, provider).await;
    info!(pages, provider, "fetching discussion listing pages");

    let page_lists: Vec<Vec<String>> = gather_ordered(
        (1..=pages).collect(),
        MAX_CONCURRENT_REQUESTS,
        |page| async move {
            limiter.acquire().await;
            let url = format!("{base_url}/discussions/{provider}/{page}");
            let body = fetcher.fetch(&url).await?;
            let links = links_from_page(&String::from_utf8_lossy(&body), filter);
            debug!(page, count = links.len(), "extracted links from page");
            Some(links)
        },
    )
    .await;

    page_lists.into_iter().flatten().collect()
}

/// Extract one question record from a discussion page document.
fn parse_question(html: &str, url: &str) -> Question {
    let document = Html::parse_document(html);

    let choices = document
        .select(&CHOICE_ITEM)
        .map(|element| clean_text(&element.text().collect::<Vec<_>>().join(" ")))
        .collect();

    // The suggested answer block repeats the letter with voting noise around
    // it; only its first non-whitespace character is meaningful.
    let answer = select_text(&document, &CORRECT_ANSWER)
        .chars()
        .find(|c| !c.is_whitespace())
        .map(String::from)
        .unwrap_or_default();

    Question {
        title: clean_text(&select_text(&document, &TITLE)),
        header: select_text(&document, &HEADER).trim().replace('\t', ""),
        content: clean_text(&select_text(&document, &CARD_TEXT)),
        choices,
        answer,
        timestamp: clean_text(&select_text(&document, &META_TIMESTAMP)),
        link: url.to_string(),
        comments: clean_text(&select_text(&document, &DISCUSSION)),
    }
}

async fn fetch_question(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    url: String,
) -> Option<Question> {
    limiter.acquire().await;
    let body = fetcher.fetch(&url).await?;
    Some(parse_question(&String::from_utf8_lossy(&body), &url))
}

/// Fetch and parse every resolved link into a record, preserving link order.
///
/// Failed links are dropped; the survivors come back in the order the links
/// were given, regardless of worker completion order.
pub async fn fetch_questions(
    fetcher: &RetryingClient,
    limiter: &RateLimiter,
    urls: Vec<String>,
) -> Vec<Question> {
    let total = urls.len();
    let questions = gather_ordered(urls, MAX_CONCURRENT_REQUESTS, |url| {
        fetch_question(fetcher, limiter, url)
    })
    .await;

    info!(
        total,
        fetched = questions.len(),
        failed = total - questions.len(),
        "fetched question pages"
    );
    questions
}

/// List the exam pages advertised for `provider`.
///
/// Unlike per-question failures this is a setup-level operation: a failed
/// fetch is an error the caller aborts on.
pub async fn provider_exams(
    fetcher: &RetryingClient,
    base_url: &str,
    provider: &str,
) -> Result<Vec<String>, Box<dyn Error>> {
    let url = format!("{base_url}/exams/{provider}/");
    let body = fetcher
        .fetch(&url)
        .await
        .ok_or_else(|| format!("failed to fetch exam listing from {url}"))?;

    let document = Html::parse_document(&String::from_utf8_lossy(&body));
    Ok(document
        .select(&EXAM_LINK)
        .filter_map(|element| element.value().attr("href"))
        .map(clean_text)
        .collect())
}
