use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{BookingStats, TrekRecord, TrendingRecord};

/// Ceiling on any single repository call made by the engine. An elapsed
/// timer is handled exactly like a repository error.
pub const REPO_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the trending engine needs from the platform database.
///
/// `wishlist_count` deliberately takes no trek slug: wishlist additions
/// are counted globally across all treks, matching what the score
/// history was built on.
#[async_trait]
pub trait TrendingStore: Send + Sync {
    async fn active_treks(&self) -> Result<Vec<TrekRecord>>;

    async fn trek_by_slug(&self, slug: &str) -> Result<TrekRecord>;

    async fn booking_stats(
        &self,
        slug: &str,
        since: Option<NaiveDate>,
        statuses: Option<&[&str]>,
    ) -> Result<BookingStats>;

    async fn wishlist_count(&self, since: Option<NaiveDate>) -> Result<i64>;

    async fn upsert_trending(&self, record: &TrendingRecord) -> Result<()>;

    async fn trending_for_date(&self, date: NaiveDate, limit: i64) -> Result<Vec<TrendingRecord>>;
}

pub async fn with_timeout<T>(call: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(REPO_CALL_TIMEOUT, call).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!(
            "repository call exceeded {}s",
            REPO_CALL_TIMEOUT.as_secs()
        ),
    }
}
