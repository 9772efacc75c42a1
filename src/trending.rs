use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::models::{DataSources, TrekRecord, TrendingRecord, UpdateSummary};
use crate::signals;
use crate::store::{with_timeout, TrendingStore};
use crate::variation::{cowave, slug_hash, wave};

// The four signal weights sum to exactly 1.0. Changing any of them
// changes the observable ranking, so they are named and pinned here.
pub const SEARCH_WEIGHT: f64 = 0.25;
pub const ENGAGEMENT_WEIGHT: f64 = 0.35;
pub const BOOKING_WEIGHT: f64 = 0.25;
pub const PAGE_WEIGHT: f64 = 0.15;

pub const DEFAULT_TRENDING_LIMIT: i64 = 10;

const FALLBACK_SCORE_FREQ: f64 = 0.05;
const FALLBACK_SCORE_AMPLITUDE: f64 = 20.0;
const FALLBACK_SCORE_OFFSET: f64 = 40.0;

/// Batch shape of the daily update run. The inter-batch delay is a
/// deliberate rate limit on the platform database.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 1000,
        }
    }
}

/// Fixed-weight linear combination of the four signals, rounded to two
/// decimals (`f64::round`, half away from zero).
pub fn trending_score(search: f64, engagement: f64, booking: f64, page: f64) -> f64 {
    round2(
        search * SEARCH_WEIGHT
            + engagement * ENGAGEMENT_WEIGHT
            + booking * BOOKING_WEIGHT
            + page * PAGE_WEIGHT,
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute one trek's trending record for the given calendar day.
///
/// Never fails: the collectors substitute their own fallbacks on
/// repository trouble, and anything going wrong after the fan-in is
/// answered with a fully degraded record marked `fallback: true`.
pub async fn collect_trek_trending(
    store: &dyn TrendingStore,
    slug: &str,
    name: &str,
    today: NaiveDate,
) -> TrendingRecord {
    let (search, engagement, booking, page) = tokio::join!(
        signals::internal_search_activity(store, slug, today),
        signals::user_engagement(store, slug, today),
        signals::booking_activity(store, slug, today),
        signals::page_activity(store, slug, today),
    );

    match assemble_record(slug, today, search, engagement, booking, page) {
        Ok(record) => {
            debug!(trek = name, score = record.trending_score, "collected trending signals");
            record
        }
        Err(err) => {
            error!(trek = name, error = %err, "trending collection failed, writing degraded record");
            fallback_record(slug, today)
        }
    }
}

fn assemble_record(
    slug: &str,
    today: NaiveDate,
    search: f64,
    engagement: f64,
    booking: i64,
    page: f64,
) -> Result<TrendingRecord> {
    let score = trending_score(search, engagement, booking as f64, page);
    anyhow::ensure!(
        score.is_finite(),
        "aggregation produced a non-finite score for {slug}"
    );
    Ok(TrendingRecord {
        trek_slug: slug.to_string(),
        trending_score: score,
        search_volume: search.floor() as i64,
        social_mentions: engagement.floor() as i64,
        website_views: page.floor() as i64,
        booking_activity: booking,
        data_sources: DataSources::Signals {
            search_volume: search,
            social_media: engagement,
            booking_activity: booking as f64,
            website_views: page,
        },
        date_calculated: today,
        last_updated: Utc::now(),
    })
}

/// Degraded record built from the hash waves alone, without touching the
/// repository. Every field is populated.
pub fn fallback_record(slug: &str, today: NaiveDate) -> TrendingRecord {
    let hash = slug_hash(slug);
    let day = today.ordinal();
    let score = (wave(day, hash, FALLBACK_SCORE_FREQ, FALLBACK_SCORE_AMPLITUDE)
        + FALLBACK_SCORE_OFFSET)
        .clamp(0.0, 100.0);

    // Placeholder signals stay inside each collector's plausible range.
    TrendingRecord {
        trek_slug: slug.to_string(),
        trending_score: round2(score),
        search_volume: placeholder_signal(day, hash, 0.1, 15.0, 20.0),
        social_mentions: placeholder_signal(day, hash, 0.2, 10.0, 15.0),
        website_views: placeholder_signal(day, hash, 0.15, 20.0, 30.0),
        booking_activity: 0,
        data_sources: DataSources::fallback(),
        date_calculated: today,
        last_updated: Utc::now(),
    }
}

fn placeholder_signal(day: u32, hash: i64, frequency: f64, amplitude: f64, offset: f64) -> i64 {
    (cowave(day, hash, frequency, amplitude) + offset).floor() as i64
}

/// Recompute and upsert trending scores for every active trek, in fixed
/// batches with a pause between them. Per-trek failures are counted, not
/// fatal; only a failed trek listing aborts the run.
pub async fn update_all_trending(
    store: &dyn TrendingStore,
    config: &UpdateConfig,
    today: NaiveDate,
) -> UpdateSummary {
    let treks = match store.active_treks().await {
        Ok(treks) => treks,
        Err(err) => {
            error!(error = %err, "could not list active treks, aborting trending update");
            return UpdateSummary {
                success: false,
                updated: 0,
                errors: 1,
            };
        }
    };

    if treks.is_empty() {
        info!("no active treks, nothing to update");
        return UpdateSummary {
            success: true,
            updated: 0,
            errors: 0,
        };
    }

    let batch_size = config.batch_size.max(1);
    let batch_count = treks.len().div_ceil(batch_size);
    let mut updated = 0usize;
    let mut errors = 0usize;

    for (index, batch) in treks.chunks(batch_size).enumerate() {
        debug!(batch = index + 1, of = batch_count, size = batch.len(), "processing batch");
        let results = join_all(batch.iter().map(|trek| process_trek(store, trek, today))).await;
        for result in results {
            match result {
                Ok(()) => updated += 1,
                Err(err) => {
                    error!(error = %err, "trending update failed");
                    errors += 1;
                }
            }
        }

        if index + 1 < batch_count && config.batch_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(config.batch_delay_ms)).await;
        }
    }

    info!(updated, errors, date = %today, "trending update complete");
    UpdateSummary {
        success: true,
        updated,
        errors,
    }
}

async fn process_trek(store: &dyn TrendingStore, trek: &TrekRecord, today: NaiveDate) -> Result<()> {
    let record = collect_trek_trending(store, &trek.slug, &trek.name, today).await;
    with_timeout(store.upsert_trending(&record))
        .await
        .with_context(|| format!("upsert failed for {}", trek.slug))
}

/// Read back a day's trending table, highest score first. Repository
/// trouble yields an empty list, never an error.
pub async fn trending_treks(
    store: &dyn TrendingStore,
    date: Option<NaiveDate>,
    limit: Option<i64>,
) -> Vec<TrendingRecord> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let limit = limit.unwrap_or(DEFAULT_TRENDING_LIMIT);
    match store.trending_for_date(date, limit).await {
        Ok(records) => records,
        Err(err) => {
            warn!(%date, error = %err, "could not read trending records");
            Vec::new()
        }
    }
}
