use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct TrekRecord {
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub difficulty: Option<String>,
    pub price: Option<i64>,
    pub rating: Option<f64>,
    pub featured: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BookingStats {
    pub count: i64,
    pub total_participants: i64,
}

/// Diagnostic payload stored alongside each trending score.
///
/// The field labels are kept verbatim for the dashboard consumers that
/// already read this column: `socialMedia` carries the user-engagement
/// score and `searchVolume` the internal-search signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSources {
    Fallback {
        fallback: bool,
    },
    Signals {
        #[serde(rename = "searchVolume")]
        search_volume: f64,
        #[serde(rename = "socialMedia")]
        social_media: f64,
        #[serde(rename = "bookingActivity")]
        booking_activity: f64,
        #[serde(rename = "websiteViews")]
        website_views: f64,
    },
}

impl DataSources {
    pub fn fallback() -> Self {
        Self::Fallback { fallback: true }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { fallback: true })
    }
}

/// One trending score per trek per calendar day, upserted on
/// `(trek_slug, date_calculated)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingRecord {
    pub trek_slug: String,
    pub trending_score: f64,
    pub search_volume: i64,
    pub social_mentions: i64,
    pub website_views: i64,
    pub booking_activity: i64,
    pub data_sources: DataSources,
    pub date_calculated: NaiveDate,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub success: bool,
    pub updated: usize,
    pub errors: usize,
}
