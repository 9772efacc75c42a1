//! In-memory [`TrendingStore`] with per-call fault injection, shared by
//! the collector and driver tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{BookingStats, TrekRecord, TrendingRecord};
use crate::store::TrendingStore;

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub trek_slug: String,
    pub participants: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub treks: Vec<TrekRecord>,
    pub bookings: Vec<BookingRow>,
    pub wishlists: Vec<DateTime<Utc>>,
    pub trending: Mutex<HashMap<(String, NaiveDate), TrendingRecord>>,
    pub fail_listing: bool,
    pub fail_treks: bool,
    pub fail_bookings: bool,
    pub fail_wishlists: bool,
    pub fail_reads: bool,
    pub fail_upsert_for: Option<String>,
}

impl MemoryStore {
    pub fn add_booking(&mut self, slug: &str, participants: i64, status: &str, date: NaiveDate) {
        self.bookings.push(BookingRow {
            trek_slug: slug.to_string(),
            participants,
            status: status.to_string(),
            created_at: midnight(date),
        });
    }

    pub fn add_wishlist(&mut self, date: NaiveDate) {
        self.wishlists.push(midnight(date));
    }

    pub fn trending_record(&self, slug: &str, date: NaiveDate) -> Option<TrendingRecord> {
        self.trending
            .lock()
            .expect("trending lock")
            .get(&(slug.to_string(), date))
            .cloned()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[async_trait]
impl TrendingStore for MemoryStore {
    async fn active_treks(&self) -> Result<Vec<TrekRecord>> {
        if self.fail_listing {
            bail!("trek listing unavailable");
        }
        Ok(self.treks.clone())
    }

    async fn trek_by_slug(&self, slug: &str) -> Result<TrekRecord> {
        if self.fail_treks {
            bail!("trek lookup unavailable");
        }
        self.treks
            .iter()
            .find(|trek| trek.slug == slug)
            .cloned()
            .ok_or_else(|| anyhow!("trek {slug} not found"))
    }

    async fn booking_stats(
        &self,
        slug: &str,
        since: Option<NaiveDate>,
        statuses: Option<&[&str]>,
    ) -> Result<BookingStats> {
        if self.fail_bookings {
            bail!("booking query unavailable");
        }
        let cutoff = since.map(midnight);
        let mut stats = BookingStats::default();
        for booking in &self.bookings {
            if booking.trek_slug != slug {
                continue;
            }
            if let Some(cutoff) = cutoff {
                if booking.created_at < cutoff {
                    continue;
                }
            }
            if let Some(statuses) = statuses {
                if !statuses.contains(&booking.status.as_str()) {
                    continue;
                }
            }
            stats.count += 1;
            stats.total_participants += booking.participants;
        }
        Ok(stats)
    }

    async fn wishlist_count(&self, since: Option<NaiveDate>) -> Result<i64> {
        if self.fail_wishlists {
            bail!("wishlist query unavailable");
        }
        let cutoff = since.map(midnight);
        Ok(self
            .wishlists
            .iter()
            .filter(|added| cutoff.map_or(true, |cutoff| **added >= cutoff))
            .count() as i64)
    }

    async fn upsert_trending(&self, record: &TrendingRecord) -> Result<()> {
        if self.fail_upsert_for.as_deref() == Some(record.trek_slug.as_str()) {
            bail!("upsert rejected for {}", record.trek_slug);
        }
        self.trending
            .lock()
            .expect("trending lock")
            .insert((record.trek_slug.clone(), record.date_calculated), record.clone());
        Ok(())
    }

    async fn trending_for_date(&self, date: NaiveDate, limit: i64) -> Result<Vec<TrendingRecord>> {
        if self.fail_reads {
            bail!("trending query unavailable");
        }
        let mut records: Vec<TrendingRecord> = self
            .trending
            .lock()
            .expect("trending lock")
            .values()
            .filter(|record| record.date_calculated == date)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.trending_score
                .partial_cmp(&a.trending_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}
