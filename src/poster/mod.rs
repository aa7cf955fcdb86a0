//! Poster composer.
//!
//! Builds one fixed-size SVG document from an event collection:
//!
//! ```text
//! +-------------------------------------------+
//! | header: title, slogan, window, timestamp  |  header_fraction
//! +---------------------+---------------------+
//! | primary card        | secondary card      |  top_fraction
//! |  ring, level bars,  |  ring, level bars,  |
//! |  numbers, tag mix   |  numbers, tag mix   |
//! +---------------------+---------------------+
//! | primary heatmap                           |  heatmap_fraction
//! +-------------------------------------------+
//! | secondary heatmap                         |
//! +-------------------------------------------+
//! | footer                                    |  footer_fraction
//! +-------------------------------------------+
//! ```
//!
//! Both cohorts go through the same card and heatmap renderers. A cohort
//! without events still gets its full card and panel, filled with a "No data"
//! placeholder, so the vertical layout never shifts.
//!
//! The output is a pure function of the events, `now`, the slogan and the
//! configuration: identical input yields byte-identical markup.

pub mod palette;
pub mod svg;

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use kurbo::{Point, Rect, Size};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{info, instrument, warn};

use crate::aggregation::summarize;
use crate::apportion::{SeatAllocation, TOTAL_SEATS};
use crate::config::PosterConfig;
use crate::error::ReportResult;
use crate::layout::{
    HeatmapLayout, RingConfig, circadian_ring, heatmap_layout, max_feasible_tags,
    polar_to_cartesian, shrink,
};
use crate::model::{AggregateSummary, Category, Event, IntensityLevel, LEVEL_COUNT};
use crate::parliament::tag_mix;

use palette::Rgb;
use svg::{Anchor, SvgDocument, TextStyle, truncate_to_width};

/// Header slogans picked by [`Slogan::Seeded`].
pub const SLOGANS: &[&str] = &[
    "Every tremor is data.",
    "Small quakes, steady ground.",
    "Feel it, log it, let it pass.",
    "The seismograph never judges.",
    "Aftershocks fade. Records remain.",
    "Mapping the fault lines of an ordinary month.",
];

const CARD_RADIUS: f64 = 24.0;
const CARD_HEADER: f64 = 68.0;
const SECTION_GAP: f64 = 16.0;
const LEVEL_ROW: f64 = 26.0;
const NUMBERS_HEIGHT: f64 = 72.0;
const MIX_HEIGHT: f64 = 52.0;
const RING_LABEL_PAD: f64 = 18.0;
const PANEL_TITLE: f64 = 24.0;

/// Source of the header slogan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slogan {
    /// Pick from [`SLOGANS`] with a PRNG seeded by this value.
    Seeded(u64),
    /// Use this text verbatim.
    Fixed(String),
}

impl Slogan {
    pub fn resolve(&self) -> String {
        match self {
            Slogan::Fixed(text) => text.clone(),
            Slogan::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(*seed);
                SLOGANS
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(SLOGANS[0])
                    .to_string()
            }
        }
    }
}

/// What one heatmap panel ended up showing.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPanel {
    pub category: Category,
    /// Distinct tags in the cohort.
    pub tag_count: usize,
    /// Tags drawn, most frequent first.
    pub shown_tags: usize,
    /// Tags left out because the panel could not fit them at the minimum
    /// cell size.
    pub hidden_tags: usize,
    pub layout: HeatmapLayout,
}

/// A composed poster.
#[derive(Debug, Clone, PartialEq)]
pub struct Poster {
    pub svg: String,
    pub width: f64,
    pub height: f64,
    pub slogan: String,
    pub summaries: Vec<AggregateSummary>,
    pub panels: Vec<HeatmapPanel>,
}

impl Poster {
    /// True when any heatmap had to hide tags.
    pub fn is_crowded(&self) -> bool {
        self.panels.iter().any(|panel| panel.hidden_tags > 0)
    }
}

/// Everything the renderers need for one cohort.
struct Cohort {
    category: Category,
    summary: AggregateSummary,
    mix: SeatAllocation<String>,
}

fn slug(category: Category) -> &'static str {
    match category {
        Category::Primary => "primary",
        Category::Secondary => "secondary",
    }
}

/// Compose the poster for all events in `config.window` ending at `now`.
///
/// Fails only on data-integrity errors from aggregation. Empty cohorts and
/// crowded heatmaps are handled inside the document.
///
/// # Arguments
///
/// * `events` - The whole journal; it is split into cohorts by category
/// * `now` - Reference instant; its zone places day and hour boundaries
/// * `slogan` - Fixed slogan text or the seed that picks one
/// * `config` - Canvas size, section fractions and report window
///
/// # Returns
///
/// A `Poster` holding the SVG markup, both cohort summaries and the heatmap
/// panels as drawn.
#[instrument(skip_all, fields(window_days = config.window.days()))]
pub fn compose_poster<'a, I, Tz>(
    events: I,
    now: &DateTime<Tz>,
    slogan: &Slogan,
    config: &PosterConfig,
) -> ReportResult<Poster>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let events: Vec<&Event> = events.into_iter().collect();
    let cohorts = Category::ALL
        .iter()
        .map(|&category| -> ReportResult<Cohort> {
            let summary = summarize(
                events.iter().copied().filter(|e| e.category == category),
                config.window,
                now,
            )?;
            let mix = tag_mix(&summary.tag_matrix)?;
            Ok(Cohort {
                category,
                summary,
                mix,
            })
        })
        .collect::<ReportResult<Vec<_>>>()?;

    let slogan = slogan.resolve();
    let timestamp = now.format("%Y-%m-%d %H:%M").to_string();

    let mut doc = SvgDocument::new(config.width, config.height, &palette::BACKGROUND.hex());

    let header_h = config.header_height();
    let top_h = config.top_height();
    let heat_h = config.heatmap_height();
    let half_gap = config.gap / 2.0;

    let header = Rect::new(0.0, 0.0, config.width, header_h);
    let top = Rect::new(
        config.margin,
        header.y1 + half_gap,
        config.width - config.margin,
        header.y1 + top_h - half_gap,
    );
    let heat_y = header.y1 + top_h;
    let heat = Rect::new(
        config.margin,
        heat_y + half_gap,
        config.width - config.margin,
        heat_y + heat_h - half_gap,
    );
    let footer = Rect::new(0.0, heat_y + heat_h, config.width, config.height);

    let total: u64 = cohorts.iter().map(|c| c.summary.total).sum();
    render_header(&mut doc, header, &slogan, &timestamp, total, config);

    let card_w = (top.width() - config.gap) / 2.0;
    let panel_h = (heat.height() - config.gap) / 2.0;
    let mut panels = Vec::with_capacity(cohorts.len());

    for (i, cohort) in cohorts.iter().enumerate() {
        let offset = i as f64;
        let card = Rect::new(
            top.x0 + offset * (card_w + config.gap),
            top.y0,
            top.x0 + offset * (card_w + config.gap) + card_w,
            top.y1,
        );
        render_card(&mut doc, card, cohort, config);

        let panel = Rect::new(
            heat.x0,
            heat.y0 + offset * (panel_h + config.gap),
            heat.x1,
            heat.y0 + offset * (panel_h + config.gap) + panel_h,
        );
        panels.push(render_heatmap(&mut doc, panel, cohort, config));
    }

    render_footer(&mut doc, footer, total, config);

    let poster = Poster {
        svg: doc.finish(),
        width: config.width,
        height: config.height,
        slogan,
        summaries: cohorts.into_iter().map(|c| c.summary).collect(),
        panels,
    };

    info!(
        events = total,
        bytes = poster.svg.len(),
        crowded = poster.is_crowded(),
        "Poster composed"
    );

    Ok(poster)
}

fn render_header(
    doc: &mut SvgDocument,
    rect: Rect,
    slogan: &str,
    timestamp: &str,
    total: u64,
    config: &PosterConfig,
) {
    let ink = palette::INK.hex();
    let muted = palette::MUTED.hex();
    let left = config.margin;
    let right = config.width - config.margin;
    let h = rect.height();

    doc.open_group("header");
    doc.text(
        Point::new(left, rect.y0 + h * 0.42),
        &config.title,
        &TextStyle::new(60.0, ink.clone()).bold(),
    );
    doc.text(
        Point::new(right, rect.y0 + h * 0.42),
        &format!("{total} events"),
        &TextStyle::new(28.0, ink).bold().anchor(Anchor::End),
    );
    doc.text(
        Point::new(left, rect.y0 + h * 0.66),
        &truncate_to_width(slogan, 26.0, right - left),
        &TextStyle::new(26.0, muted.clone()).italic(),
    );
    doc.text(
        Point::new(left, rect.y0 + h * 0.86),
        &format!("{} | generated {timestamp}", config.window.caption()),
        &TextStyle::new(20.0, muted),
    );
    doc.close_group();
}

fn render_footer(doc: &mut SvgDocument, rect: Rect, total: u64, config: &PosterConfig) {
    let center = rect.center();
    doc.open_group("footer");
    doc.text(
        Point::new(center.x, center.y + 6.0),
        &format!(
            "{} | {total} events | {}",
            config.title,
            config.window.caption()
        ),
        &TextStyle::new(16.0, palette::MUTED.hex()).anchor(Anchor::Middle),
    );
    doc.close_group();
}

/// Dashed placeholder stating that a cohort has nothing to show.
fn render_no_data(doc: &mut SvgDocument, rect: Rect, config: &PosterConfig) {
    let center = rect.center();
    doc.rect(rect, 16.0, &palette::TRACK.hex());
    doc.outline(rect, 16.0, &palette::BORDER.hex(), 1.5, true);
    doc.text(
        Point::new(center.x, center.y),
        "No data",
        &TextStyle::new(28.0, palette::MUTED.hex())
            .bold()
            .anchor(Anchor::Middle),
    );
    doc.text(
        Point::new(center.x, center.y + 28.0),
        &format!("Nothing recorded in the last {} days", config.window.days()),
        &TextStyle::new(16.0, palette::MUTED.hex()).anchor(Anchor::Middle),
    );
}

fn render_card(doc: &mut SvgDocument, rect: Rect, cohort: &Cohort, config: &PosterConfig) {
    let accent = palette::accent(cohort.category);
    let summary = &cohort.summary;
    let inner = shrink(rect, config.padding);

    doc.open_group(&format!("card-{}", slug(cohort.category)));
    doc.rect(rect, CARD_RADIUS, &palette::CARD.hex());
    doc.outline(rect, CARD_RADIUS, &palette::BORDER.hex(), 1.5, false);

    doc.rect(
        Rect::new(inner.x0, inner.y0 + 6.0, inner.x0 + 6.0, inner.y0 + 36.0),
        3.0,
        &accent.hex(),
    );
    doc.text(
        Point::new(inner.x0 + 16.0, inner.y0 + 32.0),
        cohort.category.label(),
        &TextStyle::new(28.0, palette::INK.hex()).bold(),
    );
    doc.text(
        Point::new(inner.x1, inner.y0 + 32.0),
        &format!("{} events", summary.total),
        &TextStyle::new(20.0, palette::MUTED.hex()).anchor(Anchor::End),
    );
    doc.text(
        Point::new(inner.x0 + 16.0, inner.y0 + 56.0),
        &summary.window.caption(),
        &TextStyle::new(16.0, palette::MUTED.hex()),
    );

    let body = Rect::new(inner.x0, inner.y0 + CARD_HEADER, inner.x1, inner.y1);
    if summary.is_empty() {
        render_no_data(doc, body, config);
        doc.close_group();
        return;
    }

    // Stack fixed-height sections from the bottom; the ring takes the rest.
    let mix = Rect::new(body.x0, body.y1 - MIX_HEIGHT, body.x1, body.y1);
    let numbers = Rect::new(
        body.x0,
        mix.y0 - SECTION_GAP - NUMBERS_HEIGHT,
        body.x1,
        mix.y0 - SECTION_GAP,
    );
    let bars_h = LEVEL_ROW * f64::from(LEVEL_COUNT);
    let bars = Rect::new(
        body.x0,
        numbers.y0 - SECTION_GAP - bars_h,
        body.x1,
        numbers.y0 - SECTION_GAP,
    );
    let ring = Rect::new(body.x0, body.y0, body.x1, (bars.y0 - SECTION_GAP).max(body.y0));

    render_ring(doc, ring, accent, summary, &config.ring);
    render_level_bars(doc, bars, summary);
    render_numbers(doc, numbers, summary);
    render_tag_mix(doc, mix, cohort);
    doc.close_group();
}

fn render_ring(
    doc: &mut SvgDocument,
    rect: Rect,
    accent: Rgb,
    summary: &AggregateSummary,
    ring: &RingConfig,
) {
    let center = rect.center();
    let outer = ring
        .outer_radius
        .min(rect.height() / 2.0 - RING_LABEL_PAD)
        .min(rect.width() / 2.0 - RING_LABEL_PAD)
        .max(0.0);
    let scale = if ring.outer_radius > 0.0 {
        outer / ring.outer_radius
    } else {
        0.0
    };
    let scaled = RingConfig {
        inner_radius: ring.inner_radius * scale,
        outer_radius: outer,
        base_alpha: ring.base_alpha,
    };

    let fill = accent.hex();
    let segments = circadian_ring(&summary.hour_histogram, &scaled);
    for segment in &segments {
        doc.path(&segment.path_data(center), &fill, segment.alpha);
    }

    let label = TextStyle::new(12.0, palette::MUTED.hex()).anchor(Anchor::Middle);
    for segment in segments.iter().step_by(6) {
        let at = polar_to_cartesian(center, outer + 10.0, segment.start_angle);
        doc.text(
            Point::new(at.x, at.y + 4.0),
            &segment.hour.to_string(),
            &label,
        );
    }

    if let Some(peak) = summary.hour_histogram.peak_hour() {
        doc.text(
            Point::new(center.x, center.y - 4.0),
            "peak",
            &TextStyle::new(13.0, palette::MUTED.hex()).anchor(Anchor::Middle),
        );
        doc.text(
            Point::new(center.x, center.y + 20.0),
            &format!("{peak:02}:00"),
            &TextStyle::new(22.0, palette::INK.hex())
                .bold()
                .anchor(Anchor::Middle),
        );
    }
}

fn render_level_bars(doc: &mut SvgDocument, rect: Rect, summary: &AggregateSummary) {
    const LABEL_WIDTH: f64 = 150.0;
    const COUNT_WIDTH: f64 = 48.0;

    let row_h = rect.height() / f64::from(LEVEL_COUNT);
    let max = summary.level_counts.max();
    let track_color = palette::TRACK.hex();

    for (i, (level, count)) in summary.level_counts.iter().enumerate() {
        let y = rect.y0 + i as f64 * row_h;
        let baseline = y + row_h * 0.5 + 5.0;
        doc.text(
            Point::new(rect.x0, baseline),
            &format!("L{} {}", level.get(), level.label()),
            &TextStyle::new(14.0, palette::INK.hex()),
        );

        let track = Rect::new(
            rect.x0 + LABEL_WIDTH,
            y + row_h * 0.3,
            rect.x1 - COUNT_WIDTH,
            y + row_h * 0.7,
        );
        let radius = track.height() / 2.0;
        doc.rect(track, radius, &track_color);
        if count > 0 && max > 0 {
            let share = (count as f64 / max as f64).max(0.02);
            let bar = Rect::new(track.x0, track.y0, track.x0 + track.width() * share, track.y1);
            doc.rect(bar, radius, &palette::level(level).hex());
        }

        doc.text(
            Point::new(rect.x1, baseline),
            &count.to_string(),
            &TextStyle::new(14.0, palette::INK.hex())
                .bold()
                .anchor(Anchor::End),
        );
    }
}

fn render_numbers(doc: &mut SvgDocument, rect: Rect, summary: &AggregateSummary) {
    let stats = [
        (summary.total.to_string(), "events"),
        (format!("{:.1}", summary.activity_rate), "per day"),
        (summary.echo_count.to_string(), "echoes"),
        (
            format!("{:.2}", summary.level_counts.mean_weight()),
            "mean weight",
        ),
    ];
    let column = rect.width() / stats.len() as f64;

    doc.rect(rect, 12.0, &palette::TRACK.hex());
    for (i, (value, caption)) in stats.iter().enumerate() {
        let x = rect.x0 + column * (i as f64 + 0.5);
        doc.text(
            Point::new(x, rect.y0 + 38.0),
            value,
            &TextStyle::new(28.0, palette::INK.hex())
                .bold()
                .anchor(Anchor::Middle),
        );
        doc.text(
            Point::new(x, rect.y0 + 60.0),
            caption,
            &TextStyle::new(13.0, palette::MUTED.hex()).anchor(Anchor::Middle),
        );
    }
}

fn render_tag_mix(doc: &mut SvgDocument, rect: Rect, cohort: &Cohort) {
    let muted = palette::MUTED.hex();
    doc.text(
        Point::new(rect.x0, rect.y0 + 14.0),
        "Tag mix",
        &TextStyle::new(13.0, muted.clone()),
    );
    let strip = Rect::new(rect.x0, rect.y0 + 22.0, rect.x1, rect.y0 + 38.0);

    if cohort.mix.is_empty() {
        doc.rect(strip, 4.0, &palette::TRACK.hex());
        doc.text(
            Point::new(strip.x0 + 8.0, strip.y1 + 14.0),
            "No tags",
            &TextStyle::new(12.0, muted),
        );
        return;
    }

    let mut x = strip.x0;
    for (i, (tag, seats)) in cohort.mix.iter().enumerate() {
        let width = strip.width() * f64::from(seats) / f64::from(TOTAL_SEATS);
        let segment = Rect::new(x, strip.y0, x + width, strip.y1);
        doc.rect(segment, 0.0, &palette::mix_shade(cohort.category, i).hex());
        if width >= 24.0 {
            doc.text(
                Point::new(x + 2.0, strip.y1 + 14.0),
                &truncate_to_width(&format!("{tag} {seats}%"), 12.0, width - 4.0),
                &TextStyle::new(12.0, palette::INK.hex()),
            );
        }
        x += width;
    }
}

fn render_heatmap(
    doc: &mut SvgDocument,
    rect: Rect,
    cohort: &Cohort,
    config: &PosterConfig,
) -> HeatmapPanel {
    let matrix = &cohort.summary.tag_matrix;
    let inner = shrink(rect, config.padding);
    let origin = inner.origin().to_vec2();
    let bounds = Size::new(inner.width(), inner.height());
    let tag_count = matrix.len();

    doc.open_group(&format!("heatmap-{}", slug(cohort.category)));
    doc.rect(rect, CARD_RADIUS, &palette::CARD.hex());
    doc.outline(rect, CARD_RADIUS, &palette::BORDER.hex(), 1.5, false);
    doc.text(
        Point::new(inner.x0, inner.y0 + PANEL_TITLE),
        &format!("{}: tags by intensity", cohort.category.label()),
        &TextStyle::new(22.0, palette::INK.hex()).bold(),
    );

    if tag_count == 0 {
        let body = Rect::new(inner.x0, inner.y0 + PANEL_TITLE + SECTION_GAP, inner.x1, inner.y1);
        render_no_data(doc, body, config);
        doc.close_group();
        return HeatmapPanel {
            category: cohort.category,
            tag_count,
            shown_tags: 0,
            hidden_tags: 0,
            layout: heatmap_layout(0, bounds, &config.heatmap),
        };
    }

    let capacity = max_feasible_tags(bounds, &config.heatmap);
    let shown = tag_count.min(capacity);
    let hidden = tag_count - shown;
    if hidden > 0 {
        warn!(
            category = slug(cohort.category),
            tag_count,
            shown,
            "Heatmap crowded; least frequent tags hidden"
        );
        doc.text(
            Point::new(inner.x1, inner.y0 + PANEL_TITLE),
            &format!("+{hidden} more"),
            &TextStyle::new(16.0, palette::MUTED.hex()).anchor(Anchor::End),
        );
    }

    let layout = heatmap_layout(shown, bounds, &config.heatmap);
    let levels: Vec<IntensityLevel> = IntensityLevel::all().collect();
    let cell = layout.cell_size;

    let caption = TextStyle::new(12.0, palette::MUTED.hex()).anchor(Anchor::Middle);
    for column in 0..layout.columns {
        for (j, level) in levels.iter().enumerate() {
            let x = origin.x + layout.cell_x(column, j) + cell / 2.0;
            doc.text(
                Point::new(x, origin.y + layout.header_height - 8.0),
                &format!("L{}", level.get()),
                &caption,
            );
        }
    }

    let label_size = (cell * 0.6).clamp(10.0, 16.0);
    let label_style = TextStyle::new(label_size, palette::INK.hex());
    let max_cell = matrix.max_cell();
    for (i, row) in matrix.rows().iter().take(shown).enumerate() {
        let row_origin = layout.row_origin(i) + origin;
        doc.text(
            Point::new(row_origin.x, row_origin.y + cell / 2.0 + label_size * 0.35),
            &truncate_to_width(&row.tag, label_size, layout.label_width - 4.0),
            &label_style,
        );

        for (j, &level) in levels.iter().enumerate() {
            let count = row.get(level);
            let fill = palette::heat(palette::level(level), count, max_cell);
            let cell_rect = layout.cell_rect(i, j) + origin;
            doc.rect(cell_rect, 3.0, &fill.hex());
            if count > 0 && cell >= 18.0 {
                let dark = max_cell > 0 && count as f64 / max_cell as f64 > 0.55;
                let text_color = if dark { palette::CARD } else { palette::INK };
                let size = cell * 0.4;
                let center = cell_rect.center();
                doc.text(
                    Point::new(center.x, center.y + size * 0.35),
                    &count.to_string(),
                    &TextStyle::new(size, text_color.hex()).anchor(Anchor::Middle),
                );
            }
        }
    }
    doc.close_group();

    HeatmapPanel {
        category: cohort.category,
        tag_count,
        shown_tags: shown,
        hidden_tags: hidden,
        layout,
    }
}
