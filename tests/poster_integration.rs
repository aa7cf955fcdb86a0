//! End-to-end tests for the report pipeline.
//!
//! These go from raw events through aggregation and apportionment to the
//! composed poster and its PNG rendering, using only the public API.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use seismo::aggregation::{histogram_by_level, rolling_day_buckets, tag_intensity_matrix};
use seismo::apportion::apportion;
use seismo::config::PosterConfig;
use seismo::demo::sample_events;
use seismo::model::{Category, Event, IntensityLevel};
use seismo::poster::{Poster, Slogan, compose_poster};
use seismo::raster::{RasterOptions, rasterize_png_async};
use seismo::{ReportError, parliament};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

fn event(id: &str, level: i32, hours_ago: i64, tags: &[&str], category: Category) -> Event {
    Event {
        id: id.to_string(),
        intensity_level: level,
        content: String::new(),
        is_echo: false,
        timestamp: now().timestamp_millis() - hours_ago * 3_600_000,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category,
    }
}

fn scenario() -> Vec<Event> {
    let mut events = Vec::new();
    for (i, level) in [1, 1, 2, 3, 6, 6].into_iter().enumerate() {
        events.push(event(&format!("w{i}"), level, i as i64 + 1, &["work"], Category::Primary));
    }
    for (i, level) in [4, 5, 5, 6].into_iter().enumerate() {
        events.push(event(&format!("s{i}"), level, i as i64 + 20, &["sleep"], Category::Secondary));
    }
    events
}

fn poster_at<Tz>(events: &[Event], now: &DateTime<Tz>) -> Poster
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    compose_poster(events, now, &Slogan::Seeded(0), &PosterConfig::default()).unwrap()
}

fn level(n: i32) -> IntensityLevel {
    IntensityLevel::new(n).unwrap()
}

#[test]
fn test_work_sleep_scenario() {
    let events = scenario();

    let matrix = tag_intensity_matrix(&events).unwrap();
    assert_eq!(matrix.count("work", level(1)), 2);
    assert_eq!(matrix.total_for_tag("work"), 6);
    assert_eq!(matrix.total_for_tag("sleep"), 4);
    assert_eq!(matrix.max_cell(), 2);

    let weights: Vec<(String, f64)> = matrix
        .rows()
        .iter()
        .map(|row| (row.tag.clone(), row.total() as f64))
        .collect();
    let seats = apportion(&weights).unwrap();
    assert_eq!(seats.get("work"), Some(60));
    assert_eq!(seats.get("sleep"), Some(40));

    let levels = histogram_by_level(&events).unwrap();
    assert_eq!(levels.total(), 10);
    assert_eq!(levels.get(level(6)), 3);

    let buckets = rolling_day_buckets(&events, 7, &now()).unwrap();
    assert_eq!(buckets.len(), 7);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 10);
}

#[test]
fn test_out_of_range_level_fails_everything() {
    let mut events = scenario();
    events.push(event("bad", 7, 2, &[], Category::Primary));

    assert_eq!(
        histogram_by_level(&events).unwrap_err(),
        ReportError::IntensityOutOfRange {
            event_id: "bad".to_string(),
            level: 7
        }
    );
    assert!(compose_poster(&events, &now(), &Slogan::Seeded(0), &PosterConfig::default()).is_err());
    assert!(parliament::convene(&events, &now()).is_err());
}

#[test]
fn test_poster_is_byte_identical() {
    let events = sample_events(&mut StdRng::seed_from_u64(3), &now(), 150);
    let config = PosterConfig::default();

    let a = compose_poster(&events, &now(), &Slogan::Seeded(42), &config).unwrap();
    let b = compose_poster(&events, &now(), &Slogan::Seeded(42), &config).unwrap();
    assert_eq!(a.svg, b.svg);
    assert_eq!(a.slogan, b.slogan);
    assert_eq!(a, b);
}

#[test]
fn test_poster_document_contract() {
    let events = scenario();
    let config = PosterConfig::default();
    let poster = compose_poster(
        &events,
        &now(),
        &Slogan::Fixed("Steady <ground> & sky".to_string()),
        &config,
    )
    .unwrap();

    assert_eq!(poster.width, 1080.0);
    assert_eq!(poster.height, 1920.0);
    assert!(poster.svg.contains(r#"width="1080.00" height="1920.00""#));
    assert!(poster.svg.contains("Steady &lt;ground&gt; &amp; sky"));
    assert!(poster.svg.contains("generated 2024-03-10 12:00"));
    // Self-contained: no external references of any kind.
    assert!(!poster.svg.contains("href"));
    assert!(!poster.svg.contains("url("));

    // 24 wedges per cohort ring.
    assert_eq!(poster.svg.matches("<path ").count(), 48);
    assert!(!poster.svg.contains(">No data</text>"));
    assert!(!poster.is_crowded());
}

#[test]
fn test_events_from_json() {
    let ts = now().timestamp_millis() - 3_600_000;
    let raw = json!([
        {
            "id": "a",
            "intensityLevel": 2,
            "content": "rough morning",
            "isEcho": true,
            "timestamp": ts,
            "tags": ["work", " work ", ""],
            "category": "secondary"
        },
        {
            "id": "b",
            "intensityLevel": 5,
            "timestamp": ts
        }
    ]);
    let events: Vec<Event> = serde_json::from_value(raw).unwrap();
    assert_eq!(events[0].category, Category::Secondary);
    assert!(events[0].is_echo);
    assert_eq!(events[1].category, Category::Primary);
    assert!(events[1].tags.is_empty());

    let poster = poster_at(&events, &now());
    assert_eq!(poster.summaries[1].echo_count, 1);
    assert_eq!(poster.summaries[1].tag_matrix.total_for_tag("work"), 1);
    assert_eq!(poster.summaries[0].tag_matrix.len(), 0);
}

#[test]
fn test_local_zone_shifts_hours_not_totals() {
    let events = scenario();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let now_tokyo = now().with_timezone(&tokyo);

    let utc = poster_at(&events, &now());
    let local = poster_at(&events, &now_tokyo);

    assert_eq!(utc.summaries[0].total, local.summaries[0].total);
    let peak_utc = utc.summaries[0].hour_histogram.peak_hour().unwrap();
    let peak_local = local.summaries[0].hour_histogram.peak_hour().unwrap();
    assert_eq!((peak_utc + 9) % 24, peak_local);
}

#[tokio::test]
async fn test_poster_rasterizes() {
    let poster = poster_at(&scenario(), &now());
    let options = RasterOptions {
        scale: 0.25,
        system_fonts: false,
    };
    let png = rasterize_png_async(poster.svg, options, Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(&png[..4], b"\x89PNG");
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    assert_eq!((width, height), (270, 480));
}
