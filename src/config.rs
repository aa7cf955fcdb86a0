//! Configuration for poster rendering and for the command-line driver.
//!
//! [`PosterConfig`] carries every geometric constant the composer uses, with
//! defaults for the reference 1080×1920 canvas. [`RunConfig`] is the driver's
//! environment-derived configuration:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `SEISMO_EVENTS` | unset | JSON array of events; unset renders seeded demo data |
//! | `SEISMO_OUTPUT` | `poster.svg` | SVG output path |
//! | `SEISMO_PNG` | unset | Optional PNG output path |
//! | `SEISMO_SUMMARY` | unset | Optional JSON dump of summaries and the parliament |
//! | `SEISMO_SEED` | `0` | Seed for the slogan and demo data |
//! | `SEISMO_WINDOW_DAYS` | `30` | Report window: 3, 7, 30 or 365 |
//! | `SEISMO_UTC_OFFSET_MINUTES` | unset | Fixed zone; unset uses local time |
//! | `SEISMO_RASTER_TIMEOUT_SECS` | `30` | PNG rasterization timeout |
//! | `SEISMO_DEMO_EVENTS` | `120` | Number of demo events to generate |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use tracing::warn;

use crate::layout::{HeatmapLayoutConfig, RingConfig};
use crate::model::ReportWindow;

/// Default SVG output path.
const DEFAULT_OUTPUT: &str = "poster.svg";

/// Default rasterization timeout in seconds.
const DEFAULT_RASTER_TIMEOUT_SECS: u64 = 30;

/// Default number of generated demo events.
const DEFAULT_DEMO_EVENTS: usize = 120;

/// Geometry and labels of the poster.
///
/// The four section fractions split the canvas height top to bottom and are
/// expected to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterConfig {
    pub width: f64,
    pub height: f64,
    pub header_fraction: f64,
    pub top_fraction: f64,
    pub heatmap_fraction: f64,
    pub footer_fraction: f64,
    /// Horizontal page margin.
    pub margin: f64,
    /// Space between cards, panels and sections.
    pub gap: f64,
    /// Inner padding of cards and heatmap panels.
    pub padding: f64,
    pub window: ReportWindow,
    pub title: String,
    pub ring: RingConfig,
    pub heatmap: HeatmapLayoutConfig,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1920.0,
            header_fraction: 0.12,
            top_fraction: 0.36,
            heatmap_fraction: 0.48,
            footer_fraction: 0.04,
            margin: 48.0,
            gap: 24.0,
            padding: 20.0,
            window: ReportWindow::Month,
            title: "Seismo".to_string(),
            ring: RingConfig {
                inner_radius: 64.0,
                outer_radius: 112.0,
                base_alpha: 0.15,
            },
            heatmap: HeatmapLayoutConfig {
                // Panel title plus the level caption row.
                header_height: 64.0,
                ..HeatmapLayoutConfig::default()
            },
        }
    }
}

impl PosterConfig {
    pub fn header_height(&self) -> f64 {
        self.height * self.header_fraction
    }

    pub fn top_height(&self) -> f64 {
        self.height * self.top_fraction
    }

    pub fn heatmap_height(&self) -> f64 {
        self.height * self.heatmap_fraction
    }

    pub fn footer_height(&self) -> f64 {
        self.height * self.footer_fraction
    }
}

/// Driver configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub events_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub png_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub seed: u64,
    pub window: ReportWindow,
    pub utc_offset_minutes: Option<i32>,
    pub raster_timeout: Duration,
    pub demo_events: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            events_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            png_path: None,
            summary_path: None,
            seed: 0,
            window: ReportWindow::Month,
            utc_offset_minutes: None,
            raster_timeout: Duration::from_secs(DEFAULT_RASTER_TIMEOUT_SECS),
            demo_events: DEFAULT_DEMO_EVENTS,
        }
    }
}

impl RunConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let window = match parsed::<u32>(&lookup, "SEISMO_WINDOW_DAYS") {
            Some(days) => ReportWindow::from_days(days).unwrap_or_else(|| {
                warn!(days, "Unsupported report window; using default");
                defaults.window
            }),
            None => defaults.window,
        };

        Self {
            events_path: path("SEISMO_EVENTS"),
            output_path: path("SEISMO_OUTPUT").unwrap_or(defaults.output_path),
            png_path: path("SEISMO_PNG"),
            summary_path: path("SEISMO_SUMMARY"),
            seed: parsed(&lookup, "SEISMO_SEED").unwrap_or(defaults.seed),
            window,
            utc_offset_minutes: parsed(&lookup, "SEISMO_UTC_OFFSET_MINUTES"),
            raster_timeout: parsed(&lookup, "SEISMO_RASTER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.raster_timeout),
            demo_events: parsed(&lookup, "SEISMO_DEMO_EVENTS").unwrap_or(defaults.demo_events),
        }
    }

    /// Fixed zone requested by the environment, if any and if valid.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }

    /// Poster configuration for this run.
    pub fn poster_config(&self) -> PosterConfig {
        PosterConfig {
            window: self.window,
            ..PosterConfig::default()
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_section_fractions_cover_canvas() {
        let config = PosterConfig::default();
        let sum = config.header_height()
            + config.top_height()
            + config.heatmap_height()
            + config.footer_height();
        assert!((sum - config.height).abs() < 1e-9);
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RunConfig::from_lookup(lookup(&[]));
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.output_path, PathBuf::from("poster.svg"));
        assert!(config.fixed_offset().is_none());
    }

    #[test]
    fn test_values_are_read() {
        let config = RunConfig::from_lookup(lookup(&[
            ("SEISMO_EVENTS", "events.json"),
            ("SEISMO_PNG", "out.png"),
            ("SEISMO_SEED", "42"),
            ("SEISMO_WINDOW_DAYS", "7"),
            ("SEISMO_UTC_OFFSET_MINUTES", "480"),
            ("SEISMO_RASTER_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.events_path, Some(PathBuf::from("events.json")));
        assert_eq!(config.png_path, Some(PathBuf::from("out.png")));
        assert_eq!(config.seed, 42);
        assert_eq!(config.window, ReportWindow::Week);
        assert_eq!(config.raster_timeout, Duration::from_secs(5));
        assert_eq!(config.fixed_offset(), FixedOffset::east_opt(8 * 3600));
        assert_eq!(config.poster_config().window, ReportWindow::Week);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = RunConfig::from_lookup(lookup(&[
            ("SEISMO_SEED", "many"),
            ("SEISMO_WINDOW_DAYS", "10"),
            ("SEISMO_OUTPUT", "  "),
        ]));
        assert_eq!(config.seed, 0);
        assert_eq!(config.window, ReportWindow::Month);
        assert_eq!(config.output_path, PathBuf::from("poster.svg"));
    }

    #[test]
    fn test_out_of_range_offset_is_ignored() {
        let config = RunConfig::from_lookup(lookup(&[("SEISMO_UTC_OFFSET_MINUTES", "100000")]));
        assert_eq!(config.utc_offset_minutes, Some(100_000));
        assert!(config.fixed_offset().is_none());
    }
}
