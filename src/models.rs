//! Data models for scraped questions and the cached-bundle JSON schema.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Question`]: one harvested question/answer record, the unit of output
//! - [`CacheFile`]: one entry of the GitHub contents listing for a provider folder
//! - [`CacheBundle`] and friends: the typed schema of a pre-scraped JSON bundle
//!
//! The bundle types mirror the JSON produced by the upstream scrape cache, hence
//! the `rename` attributes and the permissive `#[serde(default)]` on every field:
//! a partially-filled bundle should degrade to empty strings, not a parse error.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A single question/answer record, assembled either from a live discussion
/// page or from a cached JSON bundle.
///
/// Immutable once built; each concurrent worker owns the records it produced
/// until they are handed to the order-preserving collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Page title; records with an empty title are skipped at output time.
    pub title: String,
    /// The question-discussion header line (or the raw question text for
    /// cache-sourced records).
    pub header: String,
    /// Body content: the question card text, or joined image URLs for
    /// cache-sourced records.
    pub content: String,
    /// Choice/question fragments, one Markdown-ready block per entry.
    pub choices: Vec<String>,
    /// The suggested answer reduced to a single character.
    pub answer: String,
    /// Free-text timestamp as published by the source.
    pub timestamp: String,
    /// Canonical source URL for the question.
    pub link: String,
    /// Concatenated discussion/comment text.
    pub comments: String,
}

/// One file descriptor from the GitHub repository-contents listing.
///
/// Only used to order cache-sourced links; discarded once the sorted URL
/// list has been produced.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheFile {
    /// File name, e.g. `gcp-ace_3.json`; carries the embedded sequence number.
    #[serde(default)]
    pub name: String,
    /// Contents-API URL for the file's metadata descriptor.
    #[serde(default)]
    pub url: String,
}

/// Top level of a cached question bundle.
#[derive(Debug, Deserialize)]
pub struct CacheBundle {
    #[serde(rename = "pageProps", default)]
    pub page_props: PageProps,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageProps {
    #[serde(default)]
    pub questions: Vec<CacheQuestion>,
}

/// One sub-question inside a cached bundle.
#[derive(Debug, Default, Deserialize)]
pub struct CacheQuestion {
    /// Answer choices keyed by letter; `BTreeMap` keeps key order deterministic.
    #[serde(default)]
    pub choices: BTreeMap<String, String>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub discussion: Vec<DiscussionEntry>,
    #[serde(default)]
    pub question_images: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub timestamp: String,
}

/// One comment in a cached sub-question's discussion thread.
#[derive(Debug, Default, Deserialize)]
pub struct DiscussionEntry {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub upvote_count: i64,
}
