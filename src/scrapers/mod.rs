//! Scraping pipeline stages for the two question sources.
//!
//! # Submodules
//!
//! - [`live`]: paginated discussion-page discovery and per-question page
//!   extraction from the live site
//! - [`cache`]: the pre-scraped GitHub mirror: contents listing, bundle
//!   download, and flattening
//!
//! [`collect_questions`] is the source-selection entry point: it tries the
//! cache first when a cache client is supplied and falls back to live
//! scraping on a cache miss. Both stages share [`gather_ordered`], the
//! order-preserving concurrent collector: a bounded pool of workers whose
//! results land in slots indexed by input position, so completion order
//! never affects output order.

use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::info;

use crate::fetch::{RateLimiter, RetryingClient, BASE_URL, CACHE_REPO_URL};
use crate::links;
use crate::models::Question;
use crate::utils::add_base_url;

pub mod cache;
pub mod live;

/// Where a run reads from: the live site root and the cache listing root.
///
/// Constructed once per run and passed by reference-sized value; tests point
/// both roots at loopback stub servers.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints<'a> {
    pub base_url: &'a str,
    pub cache_url: &'a str,
}

impl Default for Endpoints<'static> {
    fn default() -> Self {
        Self {
            base_url: BASE_URL,
            cache_url: CACHE_REPO_URL,
        }
    }
}

/// Collect all question records for `provider` matching `filter`.
///
/// When `cache_fetcher` is supplied the cache path runs first; a cache miss
/// (empty listing, or bundles that all fail) falls back to live scraping:
/// discovery, link resolution, then rate-limited record fetching.
pub async fn collect_questions(
    fetcher: &RetryingClient,
    cache_fetcher: Option<&RetryingClient>,
    limiter: &RateLimiter,
    endpoints: Endpoints<'_>,
    provider: &str,
    filter: &str,
) -> Vec<Question> {
    if let Some(cache_fetcher) = cache_fetcher {
        let cached_links =
            cache::cached_links(cache_fetcher, limiter, endpoints.cache_url, provider, filter)
                .await;
        if cached_links.is_empty() {
            info!("cache miss; falling back to live scraping");
        } else {
            let questions =
                cache::fetch_cached_questions(cache_fetcher, limiter, cached_links).await;
            if !questions.is_empty() {
                return questions;
            }
            info!("cached bundles yielded no records; falling back to live scraping");
        }
    }

    let raw_links =
        live::discover_links(fetcher, limiter, endpoints.base_url, provider, filter).await;
    let resolved = links::resolve(raw_links);
    info!(count = resolved.len(), "resolved unique matching links");

    let urls = resolved
        .iter()
        .map(|link| add_base_url(endpoints.base_url, link))
        .collect();
    live::fetch_questions(fetcher, limiter, urls).await
}

/// Run `task` over `items` with at most `limit` in flight, dropping failed
/// (`None`) results and preserving input order in the output.
///
/// Results are written into a pre-sized slot vector at each item's input
/// index before the empty slots are compacted away, so the caller sees the
/// survivors in exactly the order the items were given.
pub async fn gather_ordered<I, R, F, Fut>(items: Vec<I>, limit: usize, task: F) -> Vec<R>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Option<R>>,
{
    let total = items.len();
    let indexed: Vec<(usize, Option<R>)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = task(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    for (index, result) in indexed {
        slots[index] = result;
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rng, Rng};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_gather_ordered_preserves_input_order_under_random_latency() {
        let items: Vec<usize> = (0..40).collect();
        let gathered = gather_ordered(items.clone(), 8, |i| async move {
            let jitter = rng().random_range(0..20);
            sleep(Duration::from_millis(jitter)).await;
            Some(i)
        })
        .await;
        assert_eq!(gathered, items);
    }

    #[tokio::test]
    async fn test_gather_ordered_compacts_failed_items() {
        let items: Vec<usize> = (0..20).collect();
        let gathered = gather_ordered(items, 4, |i| async move {
            if i % 7 == 0 { None } else { Some(i) }
        })
        .await;
        let expected: Vec<usize> = (0..20).filter(|i| i % 7 != 0).collect();
        assert_eq!(gathered, expected);
    }

    #[tokio::test]
    async fn test_gather_ordered_empty_input() {
        let gathered: Vec<u8> =
            gather_ordered(Vec::<u8>::new(), 4, |b| async move { Some(b) }).await;
        assert!(gathered.is_empty());
    }

    /// Serve fixed (path, body) routes on a loopback listener; unknown
    /// paths get a 404.
    fn serve_routes(listener: TcpListener, routes: Vec<(String, String)>) {
        let routes = Arc::new(routes);
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let response = match routes.iter().find(|(p, _)| p.as_str() == path) {
                        Some((_, body)) => format!(
                            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                            body.len()
                        ),
                        None => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                            .to_string(),
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
    }

    async fn bind_loopback() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    fn fast_fetcher() -> RetryingClient {
        RetryingClient::with_policy(reqwest::Client::new(), 0, Duration::from_millis(1), 2.0)
    }

    #[tokio::test]
    async fn test_cache_miss_falls_back_to_live_discovery() {
        let (listener, addr) = bind_loopback().await;
        let question_path =
            "/discussions/google/view/1-exam-gcp-ace-topic-1-question-2-discussion/";
        serve_routes(
            listener,
            vec![
                // Listing root without a page indicator: one page assumed.
                (
                    "/discussions/google/".to_string(),
                    "<html><body>listing</body></html>".to_string(),
                ),
                (
                    "/discussions/google/1".to_string(),
                    format!(r#"<html><body><a href="{question_path}">q2</a></body></html>"#),
                ),
                (
                    question_path.to_string(),
                    "<html><body>\
                       <h1>Exam GCP ACE topic 1 question 2 discussion</h1>\
                       <span class=\"correct-answer\">A</span>\
                     </body></html>"
                        .to_string(),
                ),
                // No cache routes: the listing request 404s (a cache miss).
            ],
        );

        let base = format!("http://{addr}");
        let cache = format!("{base}/cache");
        let endpoints = Endpoints {
            base_url: &base,
            cache_url: &cache,
        };
        let fetcher = fast_fetcher();
        let limiter = RateLimiter::new(1000.0);

        let questions = collect_questions(
            &fetcher,
            Some(&fetcher),
            &limiter,
            endpoints,
            "google",
            "gcp-ace",
        )
        .await;
        limiter.stop();

        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].title,
            "Exam GCP ACE topic 1 question 2 discussion"
        );
        assert_eq!(questions[0].answer, "A");
        assert_eq!(questions[0].link, format!("{base}{question_path}"));
    }

    #[tokio::test]
    async fn test_cache_hit_bypasses_live_scraping() {
        let (listener, addr) = bind_loopback().await;
        let bundle = r#"{
            "pageProps": {
                "questions": [{
                    "choices": {"A": "first"},
                    "question_text": "Pick one.",
                    "answer": "A",
                    "discussion": [],
                    "question_images": [],
                    "url": "https://www.examtopics.com/discussions/google/view/1-q/",
                    "timestamp": "t"
                }]
            }
        }"#;
        serve_routes(
            listener,
            vec![
                (
                    "/cache/Google".to_string(),
                    format!(
                        r#"[{{"name": "gcp-ace_1.json", "url": "http://{addr}/cache/Google/gcp-ace_1.json"}}]"#
                    ),
                ),
                (
                    "/cache/Google/gcp-ace_1.json".to_string(),
                    format!(r#"{{"download_url": "http://{addr}/files/gcp-ace_1.json"}}"#),
                ),
                ("/files/gcp-ace_1.json".to_string(), bundle.to_string()),
                // No live routes: a fallback would produce zero records.
            ],
        );

        let base = format!("http://{addr}");
        let cache = format!("{base}/cache");
        let endpoints = Endpoints {
            base_url: &base,
            cache_url: &cache,
        };
        let fetcher = fast_fetcher();
        let limiter = RateLimiter::new(1000.0);

        let questions = collect_questions(
            &fetcher,
            Some(&fetcher),
            &limiter,
            endpoints,
            "google",
            "gcp-ace",
        )
        .await;
        limiter.stop();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "Examtopics gcp ace_1 question #1");
        assert_eq!(questions[0].header, "Pick one.");
    }
}
