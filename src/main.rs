use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::store::TrendingStore;

mod db;
mod models;
mod report;
mod signals;
mod store;
mod trending;
mod variation;

#[cfg(test)]
mod testutil;

#[derive(Parser)]
#[command(name = "trek-trending")]
#[command(about = "Daily trending-score engine for the trek booking platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import bookings from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Recompute and upsert trending scores for all active treks
    Update {
        #[arg(long, default_value_t = 5)]
        batch_size: usize,
        #[arg(long, default_value_t = 1000)]
        batch_delay_ms: u64,
    },
    /// Compute a single trek's trending record and print it as JSON
    Collect {
        #[arg(long)]
        slug: String,
    },
    /// Show the top trending treks for a date
    Top {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Generate a markdown trending report
    Report {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 10)]
        limit: i64,
        #[arg(long, default_value = "trending-report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trek_trending=info".parse()?))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the platform Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = db::PgStore::new(pool.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} bookings from {}.", csv.display());
        }
        Commands::Update {
            batch_size,
            batch_delay_ms,
        } => {
            let config = trending::UpdateConfig {
                batch_size,
                batch_delay_ms,
            };
            let today = Utc::now().date_naive();
            let summary = trending::update_all_trending(&store, &config, today).await;
            if !summary.success {
                anyhow::bail!("trending update aborted: could not list active treks");
            }
            println!(
                "Trending update for {today}: {} updated, {} errors.",
                summary.updated, summary.errors
            );
        }
        Commands::Collect { slug } => {
            let trek = store.trek_by_slug(&slug).await?;
            let today = Utc::now().date_naive();
            let record =
                trending::collect_trek_trending(&store, &trek.slug, &trek.name, today).await;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Top { date, limit } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let records = trending::trending_treks(&store, Some(date), Some(limit)).await;

            if records.is_empty() {
                println!("No trending data for {date}.");
                return Ok(());
            }

            println!("Top trending treks for {date}:");
            for record in &records {
                println!(
                    "- {} score {:.2} ({} participants booked, {} estimated views)",
                    record.trek_slug,
                    record.trending_score,
                    record.booking_activity,
                    record.website_views
                );
            }
        }
        Commands::Report { date, limit, out } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let records = trending::trending_treks(&store, Some(date), Some(limit)).await;
            let report = report::build_report(date, &records);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
