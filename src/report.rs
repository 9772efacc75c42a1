use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::TrendingRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalAverages {
    pub search_volume: f64,
    pub social_mentions: f64,
    pub website_views: f64,
    pub booking_activity: f64,
}

pub fn signal_averages(records: &[TrendingRecord]) -> SignalAverages {
    if records.is_empty() {
        return SignalAverages::default();
    }
    let count = records.len() as f64;
    SignalAverages {
        search_volume: records.iter().map(|r| r.search_volume as f64).sum::<f64>() / count,
        social_mentions: records.iter().map(|r| r.social_mentions as f64).sum::<f64>() / count,
        website_views: records.iter().map(|r| r.website_views as f64).sum::<f64>() / count,
        booking_activity: records.iter().map(|r| r.booking_activity as f64).sum::<f64>() / count,
    }
}

pub fn build_report(date: NaiveDate, records: &[TrendingRecord]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Trending Treks Report");
    let _ = writeln!(output, "Scores calculated for {date}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Treks");

    if records.is_empty() {
        let _ = writeln!(output, "No trending data recorded for this date.");
    } else {
        for (rank, record) in records.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} score {:.2} ({} participants booked, {} estimated views)",
                rank + 1,
                record.trek_slug,
                record.trending_score,
                record.booking_activity,
                record.website_views
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Signal Mix");

    if records.is_empty() {
        let _ = writeln!(output, "No signals recorded for this date.");
    } else {
        let averages = signal_averages(records);
        let _ = writeln!(output, "- average search volume: {:.1}", averages.search_volume);
        let _ = writeln!(output, "- average social mentions: {:.1}", averages.social_mentions);
        let _ = writeln!(output, "- average website views: {:.1}", averages.website_views);
        let _ = writeln!(
            output,
            "- average booking activity: {:.1}",
            averages.booking_activity
        );
    }

    let degraded = records
        .iter()
        .filter(|record| record.data_sources.is_fallback())
        .count();
    if degraded > 0 {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "{degraded} of {} records were computed without live platform data.",
            records.len()
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataSources;
    use chrono::Utc;

    fn record(slug: &str, score: f64, fallback: bool) -> TrendingRecord {
        TrendingRecord {
            trek_slug: slug.to_string(),
            trending_score: score,
            search_volume: 40,
            social_mentions: 30,
            website_views: 60,
            booking_activity: 8,
            data_sources: if fallback {
                DataSources::fallback()
            } else {
                DataSources::Signals {
                    search_volume: 40.0,
                    social_media: 30.0,
                    booking_activity: 8.0,
                    website_views: 60.0,
                }
            },
            date_calculated: date(),
            last_updated: Utc::now(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 15).expect("valid date")
    }

    #[test]
    fn report_lists_treks_in_given_order() {
        let records = vec![
            record("everest-base-camp", 82.5, false),
            record("valley-of-flowers", 67.25, false),
        ];
        let report = build_report(date(), &records);
        let everest = report.find("1. everest-base-camp score 82.50").expect("rank 1");
        let valley = report.find("2. valley-of-flowers score 67.25").expect("rank 2");
        assert!(everest < valley);
        assert!(!report.contains("without live platform data"));
    }

    #[test]
    fn report_flags_degraded_records() {
        let records = vec![
            record("everest-base-camp", 82.5, false),
            record("chadar-frozen-river", 41.0, true),
        ];
        let report = build_report(date(), &records);
        assert!(report.contains("1 of 2 records were computed without live platform data."));
    }

    #[test]
    fn report_handles_an_empty_day() {
        let report = build_report(date(), &[]);
        assert!(report.contains("No trending data recorded for this date."));
        assert!(report.contains("No signals recorded for this date."));
    }

    #[test]
    fn averages_are_per_record_means() {
        let mut high = record("everest-base-camp", 82.5, false);
        high.search_volume = 80;
        high.booking_activity = 12;
        let low = record("valley-of-flowers", 67.25, false);

        let averages = signal_averages(&[high, low]);
        assert_eq!(averages.search_volume, 60.0);
        assert_eq!(averages.booking_activity, 10.0);
        assert_eq!(signal_averages(&[]), SignalAverages::default());
    }
}
