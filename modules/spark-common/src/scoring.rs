use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EngagementMetrics;

/// Which engagement formula to apply. Both variants are live behavior across
/// deployments, so the selection is configuration, never a hardcoded pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreVariant {
    /// likes + 3·reposts + 5·replies, decayed over (minutes + 15).
    Classic,
    /// Adds views/100 to the numerator and decays over (minutes + 10).
    ViewWeighted,
}

impl std::fmt::Display for ScoreVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreVariant::Classic => write!(f, "classic"),
            ScoreVariant::ViewWeighted => write!(f, "view_weighted"),
        }
    }
}

impl ScoreVariant {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "classic" | "a" => ScoreVariant::Classic,
            _ => ScoreVariant::ViewWeighted,
        }
    }
}

/// Default cutoff: content older than two hours scores zero.
pub const DEFAULT_AGE_CUTOFF_MINUTES: i64 = 120;

/// Whole minutes between publication and `now`, clamped at zero for clock
/// skew (a post "from the future" counts as brand new).
pub fn minutes_elapsed(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - created_at).num_milliseconds() / 60_000).max(0)
}

/// Time-decayed engagement score. Pure: the same inputs produce the same
/// score at ingestion time and on any later audit re-derivation. Posts past
/// the age cutoff are forced to zero regardless of metrics.
pub fn score(
    metrics: &EngagementMetrics,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    variant: ScoreVariant,
    age_cutoff_minutes: i64,
) -> i64 {
    let minutes = minutes_elapsed(created_at, now);
    if minutes > age_cutoff_minutes {
        return 0;
    }

    let weighted = (metrics.like_count + 3 * metrics.repost_count + 5 * metrics.reply_count) as f64;
    let (numerator, denominator) = match variant {
        ScoreVariant::Classic => (weighted * 10.0, (minutes + 15) as f64),
        ScoreVariant::ViewWeighted => (
            (weighted + metrics.view_count as f64 / 100.0) * 10.0,
            (minutes + 10) as f64,
        ),
    };

    (numerator / denominator).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn metrics(likes: u64, reposts: u64, replies: u64, views: u64) -> EngagementMetrics {
        EngagementMetrics {
            like_count: likes,
            repost_count: reposts,
            reply_count: replies,
            view_count: views,
        }
    }

    fn at_minutes(now: DateTime<Utc>, m: i64) -> DateTime<Utc> {
        now - Duration::minutes(m)
    }

    #[test]
    fn classic_scenario() {
        // (100 + 30 + 10) * 10 = 1400 over (5 + 15) = 20 -> 70
        let now = Utc::now();
        let s = score(
            &metrics(100, 10, 2, 0),
            at_minutes(now, 5),
            now,
            ScoreVariant::Classic,
            DEFAULT_AGE_CUTOFF_MINUTES,
        );
        assert_eq!(s, 70);
    }

    #[test]
    fn view_weighted_scenario() {
        // (140 + 5000/100) * 10 = 1900 over (5 + 10) = 15 -> 126
        let now = Utc::now();
        let s = score(
            &metrics(100, 10, 2, 5000),
            at_minutes(now, 5),
            now,
            ScoreVariant::ViewWeighted,
            DEFAULT_AGE_CUTOFF_MINUTES,
        );
        assert_eq!(s, 126);
    }

    #[test]
    fn cutoff_forces_zero_under_both_variants() {
        let now = Utc::now();
        for variant in [ScoreVariant::Classic, ScoreVariant::ViewWeighted] {
            let s = score(
                &metrics(1_000_000, 1_000_000, 0, 1_000_000),
                at_minutes(now, 121),
                now,
                variant,
                DEFAULT_AGE_CUTOFF_MINUTES,
            );
            assert_eq!(s, 0, "variant {variant} must suppress stale content");
        }
    }

    #[test]
    fn exactly_at_cutoff_still_scores() {
        let now = Utc::now();
        let s = score(
            &metrics(1000, 0, 0, 0),
            at_minutes(now, 120),
            now,
            ScoreVariant::Classic,
            DEFAULT_AGE_CUTOFF_MINUTES,
        );
        assert!(s > 0);
    }

    #[test]
    fn monotonically_non_increasing_in_elapsed_minutes() {
        let now = Utc::now();
        let m = metrics(500, 50, 5, 20_000);
        for variant in [ScoreVariant::Classic, ScoreVariant::ViewWeighted] {
            let mut prev = i64::MAX;
            for elapsed in 0..=130 {
                let s = score(
                    &m,
                    at_minutes(now, elapsed),
                    now,
                    variant,
                    DEFAULT_AGE_CUTOFF_MINUTES,
                );
                assert!(
                    s <= prev,
                    "score rose from {prev} to {s} at minute {elapsed} ({variant})"
                );
                prev = s;
            }
        }
    }

    #[test]
    fn future_timestamps_clamp_to_zero_minutes() {
        let now = Utc::now();
        let created = now + Duration::minutes(3);
        assert_eq!(minutes_elapsed(created, now), 0);
        let s = score(
            &metrics(100, 0, 0, 0),
            created,
            now,
            ScoreVariant::Classic,
            DEFAULT_AGE_CUTOFF_MINUTES,
        );
        // (100 * 10) / 15 = 66
        assert_eq!(s, 66);
    }

    #[test]
    fn zero_metrics_score_zero() {
        let now = Utc::now();
        let s = score(
            &metrics(0, 0, 0, 0),
            at_minutes(now, 1),
            now,
            ScoreVariant::ViewWeighted,
            DEFAULT_AGE_CUTOFF_MINUTES,
        );
        assert_eq!(s, 0);
    }
}
