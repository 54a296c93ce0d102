//! Per-provider API call accounting against configured quotas.
//!
//! Counters live in the persisted usage map ([`crate::db::API_USAGE_KEY`]);
//! every operation is a blind read-modify-write of that blob. Concurrent
//! writers race and the last one wins, matching the storage model of the
//! rest of the dashboard state.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::models::{RatePeriod, RateUsageRecord};

#[derive(Clone)]
pub struct RateTracker {
    pool: SqlitePool,
}

impl RateTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records one call attributable to `provider`.
    ///
    /// A fresh or expired window restarts at count 1 with the reset point
    /// one period out; an open window just increments.
    pub async fn record_call(&self, provider: &str, period: RatePeriod) -> Result<RateUsageRecord> {
        self.record_call_at(provider, period, Utc::now()).await
    }

    pub(crate) async fn record_call_at(
        &self,
        provider: &str,
        period: RatePeriod,
        now: DateTime<Utc>,
    ) -> Result<RateUsageRecord> {
        let mut usage = db::load_usage(&self.pool).await?;

        let entry = usage
            .entry(provider.to_string())
            .or_insert(RateUsageRecord {
                count: 0,
                reset_time: now + period.duration(),
            });

        if now >= entry.reset_time {
            entry.count = 1;
            entry.reset_time = now + period.duration();
        } else {
            entry.count += 1;
        }

        let record = *entry;
        db::save_usage(&self.pool, &usage).await?;

        tracing::debug!(provider, count = record.count, "recorded API call");
        Ok(record)
    }

    /// Calls left in the current window: the full `limit` when no window is
    /// open or the last one expired, otherwise `limit - count` floored at 0.
    pub async fn remaining(&self, provider: &str, limit: u32) -> Result<u32> {
        self.remaining_at(provider, limit, Utc::now()).await
    }

    pub(crate) async fn remaining_at(
        &self,
        provider: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<u32> {
        let usage = db::load_usage(&self.pool).await?;

        Ok(match usage.get(provider) {
            Some(record) if now < record.reset_time => limit.saturating_sub(record.count),
            _ => limit,
        })
    }

    /// Formatted time until the provider's window resets, or `None` when no
    /// window is open.
    pub async fn time_until_reset(&self, provider: &str) -> Result<Option<String>> {
        self.time_until_reset_at(provider, Utc::now()).await
    }

    pub(crate) async fn time_until_reset_at(
        &self,
        provider: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let usage = db::load_usage(&self.pool).await?;

        Ok(match usage.get(provider) {
            Some(record) if now < record.reset_time => {
                Some(format_reset_delta(record.reset_time - now))
            }
            _ => None,
        })
    }
}

/// Renders a delta as "Xh Ym" / "Xm Ys" / "Xs" by magnitude. The hour form
/// kicks in strictly above 60 whole minutes.
fn format_reset_delta(delta: Duration) -> String {
    let total_ms = delta.num_milliseconds().max(0);
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;

    if minutes > 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    async fn tracker() -> RateTracker {
        RateTracker::new(db::init_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_exhausting_the_limit() {
        let tracker = tracker().await;
        let t0 = at(1_700_000_000_000);

        for _ in 0..8 {
            tracker
                .record_call_at("twelvedata", RatePeriod::Minute, t0)
                .await
                .unwrap();
        }

        assert_eq!(tracker.remaining_at("twelvedata", 8, t0).await.unwrap(), 0);
        // Over-limit stays floored at zero.
        tracker
            .record_call_at("twelvedata", RatePeriod::Minute, t0)
            .await
            .unwrap();
        assert_eq!(tracker.remaining_at("twelvedata", 8, t0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_window_reset_restarts_count() {
        let tracker = tracker().await;
        let t0 = at(1_700_000_000_000);

        for _ in 0..8 {
            tracker
                .record_call_at("twelvedata", RatePeriod::Minute, t0)
                .await
                .unwrap();
        }

        // One call after the reset point: count restarts at 1.
        let later = t0 + Duration::milliseconds(60_000);
        let record = tracker
            .record_call_at("twelvedata", RatePeriod::Minute, later)
            .await
            .unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.reset_time, later + RatePeriod::Minute.duration());
        assert_eq!(
            tracker.remaining_at("twelvedata", 8, later).await.unwrap(),
            7
        );
    }

    #[tokio::test]
    async fn test_remaining_without_a_record_is_the_full_limit() {
        let tracker = tracker().await;
        let t0 = at(1_700_000_000_000);

        assert_eq!(tracker.remaining_at("coinbase", 10_000, t0).await.unwrap(), 10_000);
        assert_eq!(tracker.time_until_reset_at("coinbase", t0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_record_reads_as_absent() {
        let tracker = tracker().await;
        let t0 = at(1_700_000_000_000);

        tracker
            .record_call_at("alphavantage", RatePeriod::Minute, t0)
            .await
            .unwrap();

        let after = t0 + Duration::milliseconds(60_000);
        assert_eq!(
            tracker.remaining_at("alphavantage", 25, after).await.unwrap(),
            25
        );
        assert_eq!(
            tracker.time_until_reset_at("alphavantage", after).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_usage_survives_tracker_instances() {
        let pool = db::init_in_memory().await.unwrap();
        let t0 = at(1_700_000_000_000);

        RateTracker::new(pool.clone())
            .record_call_at("coinbase", RatePeriod::Hour, t0)
            .await
            .unwrap();

        // A fresh tracker over the same store sees the counter.
        assert_eq!(
            RateTracker::new(pool)
                .remaining_at("coinbase", 10_000, t0)
                .await
                .unwrap(),
            9_999
        );
    }

    #[test]
    fn test_format_reset_delta() {
        assert_eq!(format_reset_delta(Duration::seconds(42)), "42s");
        assert_eq!(format_reset_delta(Duration::seconds(125)), "2m 5s");
        assert_eq!(format_reset_delta(Duration::seconds(2 * 3600 + 15 * 60)), "2h 15m");
        // Exactly one hour still reads in minutes: the hour form needs
        // strictly more than 60 whole minutes.
        assert_eq!(format_reset_delta(Duration::seconds(3600)), "60m 0s");
        assert_eq!(format_reset_delta(Duration::seconds(0)), "0s");
    }
}
