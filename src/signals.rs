use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;
use tracing::warn;

use crate::models::TrekRecord;
use crate::store::{with_timeout, TrendingStore};
use crate::variation::{cowave, slug_hash, wave};

// Tunable heuristic parameters. The wave frequencies and amplitudes are
// design constants, not derived values; changing any of them changes the
// daily fluctuation of every persisted score.

pub const SEARCH_WINDOW_DAYS: i64 = 7;
pub const SEARCH_BOOKING_BOOST: f64 = 10.0;
pub const SEARCH_WISHLIST_BOOST: f64 = 5.0;
pub const SEARCH_WAVE_FREQ: f64 = 0.1;
pub const SEARCH_WAVE_AMPLITUDE: f64 = 30.0;
pub const SEARCH_WAVE_OFFSET: f64 = 50.0;
pub const SEARCH_FALLBACK_MAX: f64 = 50.0;

pub const ENGAGEMENT_BOOKING_WEIGHT: f64 = 2.0;
pub const ENGAGEMENT_PARTICIPANT_WEIGHT: f64 = 1.0;
pub const ENGAGEMENT_WISHLIST_WEIGHT: f64 = 3.0;
pub const FEATURED_BONUS: f64 = 20.0;
pub const RATING_BASELINE: f64 = 3.0;
pub const RATING_WEIGHT: f64 = 10.0;
pub const WEEKEND_BONUS: f64 = 15.0;
pub const ENGAGEMENT_WAVE_FREQ: f64 = 0.2;
pub const ENGAGEMENT_WAVE_AMPLITUDE: f64 = 20.0;
pub const ENGAGEMENT_FALLBACK_MAX: f64 = 40.0;

pub const BOOKING_WINDOW_DAYS: i64 = 30;
pub const ACTIVE_BOOKING_STATUSES: &[&str] = &["confirmed", "pending", "pending_approval"];

pub const PAGE_BASE_SCORE: f64 = 30.0;
pub const PAGE_WAVE_FREQ: f64 = 0.15;
pub const PAGE_WAVE_AMPLITUDE: f64 = 25.0;
pub const PAGE_DRIFT_FREQ: f64 = 0.05;
pub const PAGE_DRIFT_AMPLITUDE: f64 = 15.0;
pub const PAGE_MIN_SCORE: f64 = 10.0;
pub const PAGE_FALLBACK_MIN: f64 = 20.0;
pub const PAGE_FALLBACK_MAX: f64 = 80.0;

/// Internal search interest, 0-100. Recent booking and wishlist counts
/// boost a hash-seeded daily wave.
pub async fn internal_search_activity(
    store: &dyn TrendingStore,
    slug: &str,
    today: NaiveDate,
) -> f64 {
    let hash = slug_hash(slug);
    let result: anyhow::Result<f64> = async {
        let since = today - Duration::days(SEARCH_WINDOW_DAYS);
        let bookings = with_timeout(store.booking_stats(slug, Some(since), None)).await?;
        let wishlists = with_timeout(store.wishlist_count(Some(since))).await?;

        let boost = bookings.count as f64 * SEARCH_BOOKING_BOOST
            + wishlists as f64 * SEARCH_WISHLIST_BOOST;
        let base =
            wave(today.ordinal(), hash, SEARCH_WAVE_FREQ, SEARCH_WAVE_AMPLITUDE) + SEARCH_WAVE_OFFSET;
        Ok((base + boost).clamp(0.0, 100.0))
    }
    .await;

    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(trek = slug, error = %err, "search activity unavailable, using fallback");
            rand::thread_rng().gen_range(0.0..SEARCH_FALLBACK_MAX)
        }
    }
}

/// User engagement, 0-100. All-time booking volume, the global wishlist
/// count, trek attributes and a monthly wave.
pub async fn user_engagement(store: &dyn TrendingStore, slug: &str, today: NaiveDate) -> f64 {
    let hash = slug_hash(slug);
    let result: anyhow::Result<f64> = async {
        let trek = with_timeout(store.trek_by_slug(slug)).await?;
        let bookings = with_timeout(store.booking_stats(slug, None, None)).await?;
        let wishlists = with_timeout(store.wishlist_count(None)).await?;

        let mut score = bookings.count as f64 * ENGAGEMENT_BOOKING_WEIGHT
            + bookings.total_participants as f64 * ENGAGEMENT_PARTICIPANT_WEIGHT
            + wishlists as f64 * ENGAGEMENT_WISHLIST_WEIGHT;
        if trek.featured {
            score += FEATURED_BONUS;
        }
        if let Some(rating) = trek.rating {
            score += (rating - RATING_BASELINE) * RATING_WEIGHT;
        }
        if weekend_window(today.weekday()) {
            score += WEEKEND_BONUS;
        }
        score += wave(today.day(), hash, ENGAGEMENT_WAVE_FREQ, ENGAGEMENT_WAVE_AMPLITUDE);
        Ok(score.clamp(0.0, 100.0))
    }
    .await;

    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(trek = slug, error = %err, "engagement data unavailable, using fallback");
            rand::thread_rng().gen_range(0.0..ENGAGEMENT_FALLBACK_MAX)
        }
    }
}

/// Raw participant sum over the trailing 30 days, limited to bookings in
/// confirmed, pending or pending-approval status. Not normalized to the
/// 0-100 scale of the other signals.
pub async fn booking_activity(store: &dyn TrendingStore, slug: &str, today: NaiveDate) -> i64 {
    let since = today - Duration::days(BOOKING_WINDOW_DAYS);
    match with_timeout(store.booking_stats(slug, Some(since), Some(ACTIVE_BOOKING_STATUSES))).await
    {
        Ok(stats) => stats.total_participants,
        Err(err) => {
            warn!(trek = slug, error = %err, "booking activity unavailable, counting zero");
            0
        }
    }
}

/// Page interest estimate, 10-100. Seasonal keyword bonus, difficulty and
/// price accessibility bonuses, and two stacked waves.
pub async fn page_activity(store: &dyn TrendingStore, slug: &str, today: NaiveDate) -> f64 {
    let hash = slug_hash(slug);
    let result: anyhow::Result<f64> = async {
        let trek = with_timeout(store.trek_by_slug(slug)).await?;

        let mut score = PAGE_BASE_SCORE;
        score += seasonal_bonus(&trek, today.month());
        score += difficulty_bonus(trek.difficulty.as_deref());
        score += price_bonus(trek.price);
        score += wave(today.ordinal(), hash, PAGE_WAVE_FREQ, PAGE_WAVE_AMPLITUDE);
        score += cowave(today.ordinal(), hash, PAGE_DRIFT_FREQ, PAGE_DRIFT_AMPLITUDE);
        Ok(score.clamp(PAGE_MIN_SCORE, 100.0))
    }
    .await;

    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(trek = slug, error = %err, "page activity unavailable, using fallback");
            rand::thread_rng().gen_range(PAGE_FALLBACK_MIN..PAGE_FALLBACK_MAX)
        }
    }
}

fn weekend_window(day: Weekday) -> bool {
    matches!(day, Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

/// Quarter-of-year keyword sets matched against the trek name and region.
/// A trek outside every set gets no seasonal bonus for that quarter.
fn seasonal_bonus(trek: &TrekRecord, month: u32) -> f64 {
    let haystack = format!("{} {}", trek.name, trek.region.as_deref().unwrap_or_default())
        .to_lowercase();
    let (keywords, bonus): (&[&str], f64) = match month {
        4..=6 => (&["uttarakhand", "himachal"], 25.0),
        7..=9 => (&["valley of flowers", "roopkund"], 30.0),
        10..=12 => (&["nepal", "everest"], 20.0),
        _ => (&["chadar", "winter"], 35.0),
    };
    if keywords.iter().any(|keyword| haystack.contains(keyword)) {
        bonus
    } else {
        0.0
    }
}

fn difficulty_bonus(difficulty: Option<&str>) -> f64 {
    let Some(difficulty) = difficulty else {
        return 0.0;
    };
    let difficulty = difficulty.to_lowercase();
    if difficulty.contains("easy") || difficulty.contains("moderate") {
        15.0
    } else if difficulty.contains("difficult") || difficulty.contains("expert") {
        10.0
    } else {
        0.0
    }
}

fn price_bonus(price: Option<i64>) -> f64 {
    match price {
        Some(price) if price < 15000 => 10.0,
        Some(price) if price > 30000 => 5.0,
        _ => 0.0,
    }
}
