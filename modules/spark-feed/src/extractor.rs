use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use spark_common::scoring::{minutes_elapsed, score, ScoreVariant};
use spark_common::types::{Candidate, EngagementMetrics};

use crate::item::{FeedItem, ItemElement};
use crate::metrics::parse_metric;

// --- Stable identifying markers ---

pub const MARKER_LIKE: &str = "like";
pub const MARKER_UNLIKE: &str = "unlike";
pub const MARKER_REPOST: &str = "repost";
pub const MARKER_UNREPOST: &str = "unrepost";
pub const MARKER_REPLY: &str = "reply";
pub const MARKER_VIEWS: &str = "views";

/// Promotion markers, multilingual. An item whose visible text contains any
/// of these, or whose icons expose one as an accessible label, is dropped
/// before scoring.
pub const PROMOTION_MARKERS: [&str; 4] = ["Ad", "Promoted", "プロモーション", "広告"];

const UNKNOWN_AUTHOR: &str = "Unknown";

/// Why an item was dropped. Rejections are filtering, not errors; the scan
/// counts them and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NoTimestamp,
    NoPermalink,
    Promotion,
    NoisyDiscussion,
    Stale,
}

/// Turns one feed item into a scored `Candidate`, or rejects it.
pub struct CandidateExtractor {
    variant: ScoreVariant,
    age_cutoff_minutes: i64,
    reply_noise_threshold: u64,
}

/// Metric elements resolved for one item. `views` stays `None` when neither
/// the marker nor a fourth action control exists; that absence selects the
/// classic formula for the item.
struct ResolvedControls {
    like: Option<Arc<dyn ItemElement>>,
    repost: Option<Arc<dyn ItemElement>>,
    reply: Option<Arc<dyn ItemElement>>,
    views: Option<Arc<dyn ItemElement>>,
}

impl CandidateExtractor {
    pub fn new(variant: ScoreVariant, age_cutoff_minutes: i64, reply_noise_threshold: u64) -> Self {
        Self {
            variant,
            age_cutoff_minutes,
            reply_noise_threshold,
        }
    }

    /// Interactive path: an explicit single-item action always surfaces a
    /// result, so a stale item comes back zero-scored instead of vanishing.
    pub fn extract(&self, item: &dyn FeedItem, now: DateTime<Utc>) -> Option<Candidate> {
        self.extract_inner(item, now, true)
    }

    /// Batch-scan path: stale items are dead weight and are silently dropped.
    pub fn extract_for_scan(&self, item: &dyn FeedItem, now: DateTime<Utc>) -> Option<Candidate> {
        self.extract_inner(item, now, false)
    }

    fn extract_inner(
        &self,
        item: &dyn FeedItem,
        now: DateTime<Utc>,
        keep_stale: bool,
    ) -> Option<Candidate> {
        match self.try_extract(item, now, keep_stale) {
            Ok(candidate) => Some(candidate),
            Err(rejection) => {
                debug!(?rejection, "Item rejected");
                None
            }
        }
    }

    fn try_extract(
        &self,
        item: &dyn FeedItem,
        now: DateTime<Utc>,
        keep_stale: bool,
    ) -> Result<Candidate, Rejection> {
        // Without a timestamp the item can be neither scored nor aged;
        // without a permalink it can be neither deduplicated nor persisted.
        let created_at = item.timestamp().ok_or(Rejection::NoTimestamp)?;
        let permalink_url = item.permalink().ok_or(Rejection::NoPermalink)?;

        if is_promotion(item) {
            return Err(Rejection::Promotion);
        }

        let controls = resolve_controls(item);
        let metrics = EngagementMetrics {
            like_count: parse_control(&controls.like),
            repost_count: parse_control(&controls.repost),
            reply_count: parse_control(&controls.reply),
            view_count: parse_control(&controls.views),
        };

        // Saturated discussions have low marginal value.
        if metrics.reply_count >= self.reply_noise_threshold {
            return Err(Rejection::NoisyDiscussion);
        }

        if !keep_stale && minutes_elapsed(created_at, now) > self.age_cutoff_minutes {
            return Err(Rejection::Stale);
        }

        let blocks = item.body_blocks();
        let body_text = blocks.first().cloned().unwrap_or_default();
        let quoted_text = if blocks.len() >= 2 {
            Some(blocks[1].clone())
        } else {
            None
        };

        // The view-weighted formula only applies when a views element
        // actually resolved; otherwise fall back to the classic one.
        let variant = if controls.views.is_some() {
            self.variant
        } else {
            ScoreVariant::Classic
        };
        let score = score(&metrics, created_at, now, variant, self.age_cutoff_minutes);

        let author_name = item
            .author_text()
            .and_then(|text| text.lines().next().map(|line| line.trim().to_string()))
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Ok(Candidate {
            permalink_url,
            author_name,
            body_text,
            quoted_text,
            created_at,
            metrics,
            score,
        })
    }
}

fn parse_control(element: &Option<Arc<dyn ItemElement>>) -> u64 {
    match element {
        Some(el) => parse_metric(&el.text(), &el.label()),
        None => 0,
    }
}

fn is_promotion(item: &dyn FeedItem) -> bool {
    let text = item.text_content();
    if PROMOTION_MARKERS.iter().any(|marker| text.contains(marker)) {
        return true;
    }
    item.graphic_labels()
        .iter()
        .any(|label| PROMOTION_MARKERS.iter().any(|marker| label == marker))
}

/// Resolve metric elements by marker, then fill gaps positionally from the
/// action-control group (fixed order: reply, repost, like, views). Positional
/// hits never override an element already found by marker.
fn resolve_controls(item: &dyn FeedItem) -> ResolvedControls {
    let mut like = item.find(MARKER_LIKE).or_else(|| item.find(MARKER_UNLIKE));
    let mut repost = item
        .find(MARKER_REPOST)
        .or_else(|| item.find(MARKER_UNREPOST));
    let mut reply = item.find(MARKER_REPLY);
    let mut views = item.find(MARKER_VIEWS);

    if like.is_none() || repost.is_none() || reply.is_none() {
        let controls = item.action_controls();
        if controls.len() >= 3 {
            if reply.is_none() {
                reply = Some(controls[0].clone());
            }
            if repost.is_none() {
                repost = Some(controls[1].clone());
            }
            if like.is_none() {
                like = Some(controls[2].clone());
            }
            if views.is_none() && controls.len() >= 4 {
                views = Some(controls[3].clone());
            }
        }
    }

    ResolvedControls {
        like,
        repost,
        reply,
        views,
    }
}
