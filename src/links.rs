//! Link deduplication and ordering.
//!
//! Discovery produces one raw href list per listing page, with duplicates
//! (the site repeats links in several page widgets) and in whatever order the
//! pages happened to be crawled. [`resolve`] turns that into the canonical
//! sequence the rest of the pipeline is built around: duplicates removed,
//! then a stable ascending sort by (topic number, question number) extracted
//! from the URL structure. That sorted order, not discovery order, governs
//! the final output order.

use itertools::Itertools;

/// Topic ordering key: the integer after `topic-` up to the next `-`.
/// Absent or unparseable yields 0.
pub fn topic_number(url: &str) -> u64 {
    url.split_once("topic-")
        .and_then(|(_, rest)| rest.split('-').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// In-topic question ordering key: the integer after `question-`, with a
/// trailing `/` or `-discussion` suffix stripped. Absent or unparseable
/// yields 0.
pub fn question_number(url: &str) -> u64 {
    url.split_once("question-")
        .map(|(_, rest)| {
            rest.trim_end_matches('/')
                .trim_end_matches("-discussion")
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Deduplicate raw links by exact string identity (first occurrence wins),
/// then stable-sort ascending by (topic, question). Ties keep their
/// first-seen order.
pub fn resolve(links: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = links.into_iter().unique().collect();
    unique.sort_by_key(|link| (topic_number(link), question_number(link)));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_topic_number() {
        assert_eq!(topic_number("/discussions/x/topic-12-question-3/"), 12);
        assert_eq!(topic_number("/discussions/x/question-3/"), 0);
        assert_eq!(topic_number("/discussions/x/topic-abc-question-3/"), 0);
    }

    #[test]
    fn test_question_number() {
        assert_eq!(question_number("/discussions/x/topic-1-question-9-discussion"), 9);
        assert_eq!(question_number("/discussions/x/topic-1-question-9/"), 9);
        assert_eq!(question_number("/discussions/x/topic-1/"), 0);
    }

    #[test]
    fn test_resolve_sorts_by_topic_then_question() {
        let raw = links(&[
            "/discussions/x/topic-2-question-5-discussion",
            "/discussions/x/topic-1-question-9-discussion",
            "/discussions/x/topic-1-question-2-discussion",
        ]);
        let resolved = resolve(raw);
        assert_eq!(
            resolved,
            links(&[
                "/discussions/x/topic-1-question-2-discussion",
                "/discussions/x/topic-1-question-9-discussion",
                "/discussions/x/topic-2-question-5-discussion",
            ])
        );
    }

    #[test]
    fn test_resolve_deduplicates_exactly() {
        let raw = links(&["/a", "/b", "/a", "/c", "/b", "/a"]);
        let resolved = resolve(raw.clone());
        assert_eq!(resolved.len(), 3);
        for link in &resolved {
            assert_eq!(resolved.iter().filter(|l| *l == link).count(), 1);
            assert!(raw.contains(link));
        }
    }

    #[test]
    fn test_resolve_preserves_first_seen_order_on_ties() {
        // No topic/question markers, so every key is (0, 0).
        let raw = links(&["/c", "/a", "/b"]);
        assert_eq!(resolve(raw.clone()), raw);
    }
}
