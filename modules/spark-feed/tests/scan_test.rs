// Scanner behavior over fixture feeds: dedup, termination, ranking,
// dispatch isolation, cancellation.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::Utc;

use spark_common::scoring::{ScoreVariant, DEFAULT_AGE_CUTOFF_MINUTES};
use spark_feed::extractor::{CandidateExtractor, MARKER_LIKE};
use spark_feed::scanner::{ScanConfig, TimelineScanner};
use spark_feed::testing::{FixtureFeed, FixtureItem, RecordingSink};

fn extractor() -> CandidateExtractor {
    CandidateExtractor::new(ScoreVariant::ViewWeighted, DEFAULT_AGE_CUTOFF_MINUTES, 20)
}

fn fast_config(target: usize, max_attempts: u32) -> ScanConfig {
    ScanConfig::builder()
        .target_unique_count(target)
        .max_attempts(max_attempts)
        .settle_delay(Duration::from_millis(1))
        .dispatch_delay(Duration::from_millis(1))
        .build()
}

fn post(permalink: &str, likes: &str) -> FixtureItem {
    FixtureItem::new(permalink, Utc::now() - chrono::Duration::minutes(5))
        .body("some post text")
        .author("Author")
        .metric(MARKER_LIKE, likes, "")
}

#[tokio::test]
async fn deduplicates_by_permalink_across_pages() {
    let repeated = "https://x.com/a/status/1";
    let feed = FixtureFeed::new(vec![
        vec![post(repeated, "100"), post("https://x.com/a/status/2", "50")],
        // Same post visible again after scrolling.
        vec![post(repeated, "100"), post("https://x.com/a/status/3", "10")],
    ]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(10, 2));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    assert_eq!(outcome.stats.unique_candidates, 3);
    let mut permalinks: Vec<_> = outcome
        .selected
        .iter()
        .map(|c| c.permalink_url.clone())
        .collect();
    permalinks.sort();
    permalinks.dedup();
    assert_eq!(permalinks.len(), outcome.selected.len());
    assert_eq!(feed.reset_count(), 1);
}

#[tokio::test]
async fn stops_when_target_reached() {
    let feed = FixtureFeed::new(vec![
        vec![post("https://x.com/a/status/1", "1"), post("https://x.com/a/status/2", "2")],
        vec![post("https://x.com/a/status/3", "3")],
        vec![post("https://x.com/a/status/4", "4")],
    ]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(2, 100));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    // First page already satisfies the target: exactly one attempt.
    assert_eq!(outcome.stats.attempts, 1);
    assert_eq!(outcome.stats.unique_candidates, 2);
}

#[tokio::test]
async fn stops_when_budget_exhausted() {
    // One page, one unique candidate: the target is unreachable.
    let feed = FixtureFeed::new(vec![vec![post("https://x.com/a/status/1", "5")]]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(50, 4));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    assert_eq!(outcome.stats.attempts, 4);
    assert_eq!(outcome.stats.unique_candidates, 1);
}

#[tokio::test]
async fn ranks_by_score_and_dispatches_top_three() {
    let feed = FixtureFeed::new(vec![vec![
        post("https://x.com/a/status/1", "10"),
        post("https://x.com/a/status/2", "5000"),
        post("https://x.com/a/status/3", "900"),
        post("https://x.com/a/status/4", "40"),
    ]]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(4, 2));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    let selected: Vec<_> = outcome
        .selected
        .iter()
        .map(|c| c.permalink_url.as_str())
        .collect();
    assert_eq!(
        selected,
        vec![
            "https://x.com/a/status/2",
            "https://x.com/a/status/3",
            "https://x.com/a/status/4",
        ]
    );
    assert_eq!(sink.submitted().len(), 3);
    assert_eq!(outcome.stats.dispatched, 3);
}

#[tokio::test]
async fn equal_scores_keep_discovery_order() {
    let feed = FixtureFeed::new(vec![vec![
        post("https://x.com/a/status/1", "100"),
        post("https://x.com/a/status/2", "100"),
        post("https://x.com/a/status/3", "100"),
    ]]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(3, 2));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    let selected: Vec<_> = outcome
        .selected
        .iter()
        .map(|c| c.permalink_url.as_str())
        .collect();
    assert_eq!(
        selected,
        vec![
            "https://x.com/a/status/1",
            "https://x.com/a/status/2",
            "https://x.com/a/status/3",
        ]
    );
}

#[tokio::test]
async fn dispatch_failure_does_not_abort_remaining() {
    let feed = FixtureFeed::new(vec![vec![
        post("https://x.com/a/status/1", "300"),
        post("https://x.com/a/status/2", "200"),
        post("https://x.com/a/status/3", "100"),
    ]]);
    let sink = RecordingSink::new().fail_on("https://x.com/a/status/2");
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(3, 2));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    assert_eq!(outcome.stats.dispatched, 2);
    assert_eq!(outcome.stats.dispatch_failures, 1);
    let submitted: Vec<_> = sink
        .submitted()
        .iter()
        .map(|c| c.permalink_url.clone())
        .collect();
    assert_eq!(
        submitted,
        vec!["https://x.com/a/status/1", "https://x.com/a/status/3"]
    );
}

#[tokio::test]
async fn cancellation_stops_before_collecting() {
    let feed = FixtureFeed::new(vec![vec![post("https://x.com/a/status/1", "100")]]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(true);

    let scanner = TimelineScanner::new(extractor(), fast_config(10, 10));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    assert!(outcome.stats.cancelled);
    assert_eq!(outcome.stats.attempts, 0);
    assert!(sink.submitted().is_empty());
}

#[tokio::test]
async fn rejected_items_are_counted_not_dispatched() {
    let stale = FixtureItem::new(
        "https://x.com/a/status/9",
        Utc::now() - chrono::Duration::minutes(500),
    )
    .body("ancient")
    .metric(MARKER_LIKE, "9999", "");
    let feed = FixtureFeed::new(vec![vec![stale, post("https://x.com/a/status/1", "10")]]);
    let sink = RecordingSink::new();
    let cancel = AtomicBool::new(false);

    let scanner = TimelineScanner::new(extractor(), fast_config(2, 1));
    let outcome = scanner.scan(&feed, &sink, &cancel).await.unwrap();

    assert_eq!(outcome.stats.items_rejected, 1);
    assert_eq!(outcome.stats.unique_candidates, 1);
    assert_eq!(outcome.selected.len(), 1);
}
