use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{BookingStats, TrekRecord, TrendingRecord};
use crate::store::TrendingStore;

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed [`TrendingStore`] over the platform schema.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn trek_from_row(row: &PgRow) -> TrekRecord {
    TrekRecord {
        slug: row.get("slug"),
        name: row.get("name"),
        region: row.get("region"),
        difficulty: row.get("difficulty"),
        price: row.get("price"),
        rating: row.get("rating"),
        featured: row.get("featured"),
    }
}

#[async_trait]
impl TrendingStore for PgStore {
    async fn active_treks(&self) -> Result<Vec<TrekRecord>> {
        let rows = sqlx::query(
            "SELECT slug, name, region, difficulty, price, rating, featured \
             FROM trek_trending.treks WHERE status = 'active' ORDER BY slug",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list active treks")?;

        Ok(rows.iter().map(trek_from_row).collect())
    }

    async fn trek_by_slug(&self, slug: &str) -> Result<TrekRecord> {
        let row = sqlx::query(
            "SELECT slug, name, region, difficulty, price, rating, featured \
             FROM trek_trending.treks WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(trek_from_row)
            .ok_or_else(|| anyhow!("trek {slug} not found"))
    }

    async fn booking_stats(
        &self,
        slug: &str,
        since: Option<NaiveDate>,
        statuses: Option<&[&str]>,
    ) -> Result<BookingStats> {
        let mut query = String::from(
            "SELECT COUNT(*) AS booking_count, \
             COALESCE(SUM(participants), 0)::BIGINT AS total_participants \
             FROM trek_trending.bookings WHERE trek_slug = $1",
        );

        let mut next_param = 2;
        if since.is_some() {
            query.push_str(&format!(" AND created_at >= ${next_param}"));
            next_param += 1;
        }
        if statuses.is_some() {
            query.push_str(&format!(" AND status = ANY(${next_param})"));
        }

        let mut rows = sqlx::query(&query).bind(slug);
        if let Some(since) = since {
            rows = rows.bind(midnight(since));
        }
        if let Some(statuses) = statuses {
            let statuses: Vec<String> = statuses.iter().map(|status| status.to_string()).collect();
            rows = rows.bind(statuses);
        }

        let row = rows.fetch_one(&self.pool).await?;
        Ok(BookingStats {
            count: row.get("booking_count"),
            total_participants: row.get("total_participants"),
        })
    }

    async fn wishlist_count(&self, since: Option<NaiveDate>) -> Result<i64> {
        let mut query =
            String::from("SELECT COUNT(*) AS wishlist_count FROM trek_trending.wishlists");
        if since.is_some() {
            query.push_str(" WHERE created_at >= $1");
        }

        let mut rows = sqlx::query(&query);
        if let Some(since) = since {
            rows = rows.bind(midnight(since));
        }

        let row = rows.fetch_one(&self.pool).await?;
        Ok(row.get("wishlist_count"))
    }

    async fn upsert_trending(&self, record: &TrendingRecord) -> Result<()> {
        let data_sources = serde_json::to_value(&record.data_sources)
            .context("failed to encode data sources payload")?;

        sqlx::query(
            r#"
            INSERT INTO trek_trending.trending_treks
            (trek_slug, trending_score, search_volume, social_mentions, website_views,
             booking_activity, data_sources, date_calculated, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (trek_slug, date_calculated) DO UPDATE
            SET trending_score = EXCLUDED.trending_score,
                search_volume = EXCLUDED.search_volume,
                social_mentions = EXCLUDED.social_mentions,
                website_views = EXCLUDED.website_views,
                booking_activity = EXCLUDED.booking_activity,
                data_sources = EXCLUDED.data_sources,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(&record.trek_slug)
        .bind(record.trending_score)
        .bind(record.search_volume)
        .bind(record.social_mentions)
        .bind(record.website_views)
        .bind(record.booking_activity)
        .bind(data_sources)
        .bind(record.date_calculated)
        .bind(record.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn trending_for_date(&self, date: NaiveDate, limit: i64) -> Result<Vec<TrendingRecord>> {
        let rows = sqlx::query(
            "SELECT trek_slug, trending_score, search_volume, social_mentions, website_views, \
             booking_activity, data_sources, date_calculated, last_updated \
             FROM trek_trending.trending_treks \
             WHERE date_calculated = $1 \
             ORDER BY trending_score DESC \
             LIMIT $2",
        )
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let data_sources: serde_json::Value = row.get("data_sources");
            records.push(TrendingRecord {
                trek_slug: row.get("trek_slug"),
                trending_score: row.get("trending_score"),
                search_volume: row.get("search_volume"),
                social_mentions: row.get("social_mentions"),
                website_views: row.get("website_views"),
                booking_activity: row.get("booking_activity"),
                data_sources: serde_json::from_value(data_sources)
                    .context("malformed data sources payload")?,
                date_calculated: row.get("date_calculated"),
                last_updated: row.get("last_updated"),
            });
        }

        Ok(records)
    }
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let treks = vec![
        (
            Uuid::parse_str("5a1f7c2e-8d34-4b6a-9f21-c0d3e5a7b901")?,
            "valley-of-flowers",
            "Valley of Flowers Trek",
            "Uttarakhand",
            "moderate",
            12500i64,
            4.6f64,
            true,
            "active",
        ),
        (
            Uuid::parse_str("0b8c6d4e-2f17-4a5b-8c3d-917e6f2a4b05")?,
            "chadar-frozen-river",
            "Chadar Frozen River Trek",
            "Ladakh",
            "difficult",
            32500,
            4.4,
            false,
            "active",
        ),
        (
            Uuid::parse_str("e2d94b7a-61c8-4f3e-b5a2-084c7d1e9f36")?,
            "everest-base-camp",
            "Everest Base Camp Trek",
            "Nepal",
            "difficult",
            68000,
            4.8,
            true,
            "active",
        ),
        (
            Uuid::parse_str("9f3a5c1d-7e82-4d6b-a490-b2c8e1f54a73")?,
            "hampta-pass",
            "Hampta Pass Trek",
            "Himachal Pradesh",
            "easy to moderate",
            9500,
            4.2,
            false,
            "active",
        ),
        (
            Uuid::parse_str("4c7b2e9f-d051-4a38-86de-5f1a3c9b7e24")?,
            "roopkund-lake",
            "Roopkund Mystery Lake Trek",
            "Uttarakhand",
            "expert",
            14500,
            4.1,
            false,
            "archived",
        ),
    ];

    for (id, slug, name, region, difficulty, price, rating, featured, status) in treks {
        sqlx::query(
            r#"
            INSERT INTO trek_trending.treks
            (id, slug, name, region, difficulty, price, rating, featured, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, region = EXCLUDED.region,
                difficulty = EXCLUDED.difficulty, price = EXCLUDED.price,
                rating = EXCLUDED.rating, featured = EXCLUDED.featured,
                status = EXCLUDED.status
            "#,
        )
        .bind(id)
        .bind(slug)
        .bind(name)
        .bind(region)
        .bind(difficulty)
        .bind(price)
        .bind(rating)
        .bind(featured)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let bookings = vec![
        ("seed-001", "valley-of-flowers", 4, "confirmed", 2),
        ("seed-002", "valley-of-flowers", 2, "pending", 6),
        ("seed-003", "valley-of-flowers", 3, "cancelled", 4),
        ("seed-004", "chadar-frozen-river", 3, "pending_approval", 12),
        ("seed-005", "everest-base-camp", 5, "confirmed", 20),
        ("seed-006", "hampta-pass", 6, "completed", 45),
    ];

    for (source_key, slug, participants, status, days_ago) in bookings {
        sqlx::query(
            r#"
            INSERT INTO trek_trending.bookings
            (id, trek_slug, participants, status, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(slug)
        .bind(participants)
        .bind(status)
        .bind(Utc::now() - Duration::days(days_ago))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let wishlists = vec![
        ("c4e8a2d6-1f9b-4c73-a50e-8d2b6f4a9c17", "valley-of-flowers", 1),
        ("7d2f9b4c-e6a1-4d58-b3c7-1a9e5f8d2b60", "everest-base-camp", 3),
        ("f1a6c8e2-4b7d-49f3-8e5a-c2d904b6a178", "chadar-frozen-river", 9),
        ("2b9d4f7a-8c31-4e6b-95d2-e7f0a3c81b45", "hampta-pass", 21),
    ];

    for (id, slug, days_ago) in wishlists {
        sqlx::query(
            r#"
            INSERT INTO trek_trending.wishlists (id, trek_slug, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(slug)
        .bind(Utc::now() - Duration::days(days_ago))
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        trek_slug: String,
        participants: i32,
        status: String,
        booked_on: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let known = sqlx::query("SELECT slug FROM trek_trending.treks WHERE slug = $1")
            .bind(&row.trek_slug)
            .fetch_optional(pool)
            .await?;
        if known.is_none() {
            tracing::warn!(trek = %row.trek_slug, "skipping booking for unknown trek");
            continue;
        }

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO trek_trending.bookings
            (id, trek_slug, participants, status, created_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.trek_slug)
        .bind(row.participants)
        .bind(&row.status)
        .bind(midnight(row.booked_on))
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
