//! Seismo - renders a mood-journal poster from an event log.
//!
//! # Usage
//!
//! Configuration comes from the environment (see [`seismo::config`]):
//!
//! ```text
//! SEISMO_EVENTS=events.json SEISMO_OUTPUT=poster.svg SEISMO_PNG=poster.png seismo
//! ```
//!
//! Without `SEISMO_EVENTS` a seeded demo journal is rendered instead.
//!
//! # Outputs
//!
//! - SVG poster (always)
//! - PNG rendering of the poster (`SEISMO_PNG`)
//! - JSON dump of both cohort summaries and the weekly parliament (`SEISMO_SUMMARY`)

use std::fmt::Display;

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use seismo::config::RunConfig;
use seismo::demo;
use seismo::model::{AggregateSummary, Event};
use seismo::parliament::{Parliament, convene};
use seismo::poster::{Slogan, compose_poster};
use seismo::raster::{RasterOptions, rasterize_png_async};

/// Everything written to the optional summary file.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDump<'a> {
    generated_at: String,
    cohorts: &'a [AggregateSummary],
    parliament: Parliament,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("seismo=info".parse()?))
        .init();

    let config = RunConfig::from_env();

    match config.fixed_offset() {
        Some(offset) => run(&config, Utc::now().with_timezone(&offset)).await,
        None => run(&config, Local::now()).await,
    }
}

async fn run<Tz>(config: &RunConfig, now: DateTime<Tz>) -> anyhow::Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    info!(
        window_days = config.window.days(),
        seed = config.seed,
        now = %now.to_rfc3339(),
        "Starting Seismo"
    );

    let events = load_events(config, &now).await?;
    info!(events = events.len(), "Events loaded");

    let poster = compose_poster(
        &events,
        &now,
        &Slogan::Seeded(config.seed),
        &config.poster_config(),
    )?;

    tokio::fs::write(&config.output_path, &poster.svg)
        .await
        .with_context(|| format!("writing SVG to {}", config.output_path.display()))?;
    info!(path = %config.output_path.display(), crowded = poster.is_crowded(), "SVG written");

    if let Some(path) = &config.summary_path {
        let dump = ReportDump {
            generated_at: now.to_rfc3339(),
            cohorts: &poster.summaries,
            parliament: convene(&events, &now)?,
        };
        let json = serde_json::to_string_pretty(&dump)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing summary to {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }

    if let Some(path) = &config.png_path {
        let png = rasterize_png_async(
            poster.svg.clone(),
            RasterOptions::default(),
            config.raster_timeout,
        )
        .await?;
        tokio::fs::write(path, &png)
            .await
            .with_context(|| format!("writing PNG to {}", path.display()))?;
        info!(path = %path.display(), bytes = png.len(), "PNG written");
    }

    Ok(())
}

async fn load_events<Tz: TimeZone>(
    config: &RunConfig,
    now: &DateTime<Tz>,
) -> anyhow::Result<Vec<Event>> {
    match &config.events_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading events from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing events from {}", path.display()))
        }
        None => {
            info!(count = config.demo_events, "No event file configured; using demo data");
            let mut rng = StdRng::seed_from_u64(config.seed);
            Ok(demo::sample_events(&mut rng, now, config.demo_events))
        }
    }
}
