use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use spark_common::types::Candidate;
use spark_common::Config;

use crate::dispatch::CandidateSink;
use crate::extractor::CandidateExtractor;
use crate::item::FeedSession;

/// Tuning for one scan. Defaults mirror the deployed constants; the real
/// values come from `Config`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ScanConfig {
    #[builder(default = 50)]
    pub target_unique_count: usize,
    #[builder(default = 100)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_millis(1500))]
    pub settle_delay: Duration,
    #[builder(default = Duration::from_millis(3000))]
    pub dispatch_delay: Duration,
    /// How many top-ranked candidates are submitted per scan.
    #[builder(default = 3)]
    pub dispatch_top_k: usize,
}

impl ScanConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_unique_count: config.target_unique_count,
            max_attempts: config.max_scan_attempts,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            dispatch_delay: Duration::from_millis(config.dispatch_delay_ms),
            dispatch_top_k: 3,
        }
    }
}

/// Where a scan currently is. Purely observational; the loop itself is the
/// state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scrolling,
    Collecting,
    Sorting,
    Dispatching,
    Done,
}

/// Stats from one scan.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub attempts: u32,
    pub items_seen: u32,
    pub items_rejected: u32,
    pub unique_candidates: u32,
    pub dispatched: u32,
    pub dispatch_failures: u32,
    pub cancelled: bool,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scan Complete ===")?;
        writeln!(f, "Attempts:          {}", self.attempts)?;
        writeln!(f, "Items seen:        {}", self.items_seen)?;
        writeln!(f, "Items rejected:    {}", self.items_rejected)?;
        writeln!(f, "Unique candidates: {}", self.unique_candidates)?;
        writeln!(f, "Dispatched:        {}", self.dispatched)?;
        writeln!(f, "Dispatch failures: {}", self.dispatch_failures)?;
        if self.cancelled {
            writeln!(f, "(cancelled)")?;
        }
        Ok(())
    }
}

/// Result of one scan: the ranked dispatch set plus bookkeeping.
#[derive(Debug)]
pub struct ScanOutcome {
    pub selected: Vec<Candidate>,
    pub stats: ScanStats,
}

/// Drives incremental scrolling over a continuously-mutating feed,
/// deduplicates candidates by permalink, and dispatches a ranked top-K.
///
/// All dedup state is owned by the scan invocation. Nothing ambient
/// survives between scans, and no two scans may share a feed session.
pub struct TimelineScanner {
    extractor: CandidateExtractor,
    config: ScanConfig,
}

impl TimelineScanner {
    pub fn new(extractor: CandidateExtractor, config: ScanConfig) -> Self {
        Self { extractor, config }
    }

    /// Run one scan to completion. Terminates when the unique-candidate
    /// target is reached, the attempt budget is exhausted, or `cancel` is
    /// raised; never unbounded. Dispatch failures are isolated per
    /// candidate.
    pub async fn scan(
        &self,
        session: &dyn FeedSession,
        sink: &dyn CandidateSink,
        cancel: &AtomicBool,
    ) -> Result<ScanOutcome> {
        debug!(phase = ?ScanPhase::Idle, "Scan starting");
        let mut stats = ScanStats::default();
        let mut seen: HashSet<String> = HashSet::new();
        // Discovery order doubles as the tie-break order for ranking.
        let mut candidates: Vec<Candidate> = Vec::new();

        session.reset_viewport().await;
        tokio::time::sleep(self.config.settle_delay).await;

        while candidates.len() < self.config.target_unique_count
            && stats.attempts < self.config.max_attempts
        {
            if cancel.load(Ordering::Relaxed) {
                info!("Scan cancelled between attempts");
                stats.cancelled = true;
                break;
            }

            let now = Utc::now();
            for item in session.visible_items() {
                stats.items_seen += 1;
                match self.extractor.extract_for_scan(item.as_ref(), now) {
                    Some(candidate) => {
                        if seen.insert(candidate.permalink_url.clone()) {
                            candidates.push(candidate);
                        }
                    }
                    None => stats.items_rejected += 1,
                }
            }
            debug!(
                phase = ?ScanPhase::Collecting,
                unique = candidates.len(),
                target = self.config.target_unique_count,
                attempt = stats.attempts,
                "Collected visible items"
            );

            debug!(phase = ?ScanPhase::Scrolling, "Advancing viewport");
            session.advance_viewport().await;
            tokio::time::sleep(self.config.settle_delay).await;
            stats.attempts += 1;
        }

        stats.unique_candidates = candidates.len() as u32;

        debug!(phase = ?ScanPhase::Sorting, "Ranking candidates");
        // Stable sort: equal scores keep discovery order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        let selected: Vec<Candidate> = candidates
            .into_iter()
            .take(self.config.dispatch_top_k)
            .collect();
        info!(
            selected = selected.len(),
            unique = stats.unique_candidates,
            "Scan ranked candidates"
        );

        debug!(phase = ?ScanPhase::Dispatching, count = selected.len(), "Dispatching");
        for candidate in &selected {
            if cancel.load(Ordering::Relaxed) {
                stats.cancelled = true;
                break;
            }
            match sink.submit(candidate).await {
                Ok(()) => stats.dispatched += 1,
                Err(e) => {
                    // One failed submission never aborts the rest.
                    warn!(
                        permalink = candidate.permalink_url.as_str(),
                        error = %e,
                        "Candidate dispatch failed"
                    );
                    stats.dispatch_failures += 1;
                }
            }
            tokio::time::sleep(self.config.dispatch_delay).await;
        }

        debug!(phase = ?ScanPhase::Done, "Scan finished");

        Ok(ScanOutcome { selected, stats })
    }
}
