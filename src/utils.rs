//! Utility functions for text cleanup, filter matching, and URL/name handling.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace normalization for scraped page text
//! - The two filter-matching rules (live pages vs. cached file names)
//! - Sequence-number and display-name extraction from cache file names
//! - Base-URL resolution for relative discussion links
//!
//! Note that the live and cache paths intentionally match filters differently:
//! live links are compared as plain case-insensitive substrings, while cache
//! file names are normalized first (dashes collapsed, `_N.json` suffix
//! stripped) to tolerate formatting drift in the mirrored file names.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static REPEATED_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static JSON_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(_\d+)?\.json$").unwrap());

/// Collapse scraped text into a single clean line.
///
/// Newlines and tabs become spaces, runs of whitespace collapse to one
/// space, and two site-specific fixups are applied: a newline is restored
/// before "Suggested Answer" and the login-form artifact "Forgot my
/// password" is dropped.
pub fn clean_text(raw: &str) -> String {
    let cleaned = WHITESPACE.replace_all(raw.trim(), " ");
    let cleaned = cleaned
        .trim()
        .replacen("Suggested Answer", "\nSuggested Answer", 1)
        .replace("Forgot my password", "");
    cleaned
}

/// Case-insensitive substring match used by the live-scrape path.
///
/// An empty `needle` matches everything.
pub fn grep_string(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Normalize a cache file identifier for matching: lowercase, collapse
/// repeated dashes, strip a trailing `_<seq>.json` / `.json` suffix.
fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let collapsed = REPEATED_DASHES.replace_all(&lowered, "-");
    JSON_SUFFIX.replace(&collapsed, "").into_owned()
}

/// Filter match used by the cache path; both sides are normalized before
/// the substring test, a looser rule than [`grep_string`].
pub fn grep_cache_string(haystack: &str, needle: &str) -> bool {
    normalize(haystack).contains(&normalize(needle))
}

/// Extract the sequence number embedded in a cache file name: the digits
/// after the first `_` up to the extension. `abc_42.json` yields 42;
/// a name without an underscore yields -1 (sorts first).
pub fn extract_number_from_path(filename: &str) -> i64 {
    filename
        .split_once('_')
        .and_then(|(_, rest)| rest.split('.').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(-1)
}

/// Derive a display name from a cache file URL: the last path segment with
/// any query string and `.json` extension removed and dashes spaced out.
pub fn name_from_link(link: &str) -> String {
    let base = link.rsplit('/').next().unwrap_or(link);
    let base = base.split('?').next().unwrap_or(base);
    let name = base.trim_end_matches(".json").replace('-', " ");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a (usually relative) discussion href against a site base URL.
pub fn add_base_url(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("{base_url}{href}"))
}

/// Capitalize the first character; the cache repository names its provider
/// folders this way.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
