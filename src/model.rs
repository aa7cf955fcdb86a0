//! Data models for Seismo.
//!
//! # Data contract
//!
//! Events are created and persisted by a CRUD collaborator and handed to the
//! engine as an already-collected, read-only slice. The engine never mutates,
//! stores or fetches them. Every summary type in this module is derived fresh
//! from that slice on each call.
//!
//! Intensity levels use an **inverted** severity scale: level 1 is the most
//! extreme, level [`LEVEL_COUNT`] the mildest. Anything that weights events by
//! severity goes through [`IntensityLevel::weight`] so the inversion is applied
//! in exactly one place.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

/// Number of valid intensity levels.
pub const LEVEL_COUNT: u8 = 6;

/// Number of hour-of-day buckets.
pub const HOURS_PER_DAY: usize = 24;

/// One journal entry.
///
/// The `intensity_level` is kept as the raw stored integer so that a
/// corrupted value can be reported with its event id instead of failing at
/// deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Opaque unique identifier.
    pub id: String,

    /// Raw severity, valid in `1..=LEVEL_COUNT`.
    pub intensity_level: i32,

    /// Free text, never interpreted by the engine.
    #[serde(default)]
    pub content: String,

    /// Marks the event as an echo of an earlier one. Echoes are counted like
    /// any other event.
    #[serde(default)]
    pub is_echo: bool,

    /// Epoch milliseconds.
    pub timestamp: i64,

    /// Free-text tags; duplicates are collapsed before counting.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Cohort the event belongs to.
    #[serde(default)]
    pub category: Category,
}

impl Event {
    /// Validated intensity level of this event.
    pub fn level(&self) -> ReportResult<IntensityLevel> {
        IntensityLevel::new(self.intensity_level).ok_or_else(|| ReportError::IntensityOutOfRange {
            event_id: self.id.clone(),
            level: self.intensity_level,
        })
    }

    /// Tags with surrounding whitespace removed, empty tags skipped and
    /// duplicates collapsed. First-seen order is preserved.
    pub fn unique_tags(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen
    }
}

/// The two cohorts a dataset is partitioned into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Negative framing: things that shook you.
    #[default]
    Primary,

    /// Positive framing: things that steadied you.
    Secondary,
}

impl Category {
    /// Both cohorts in display order.
    pub const ALL: [Category; 2] = [Category::Primary, Category::Secondary];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Primary => "Tremors",
            Category::Secondary => "Glimmers",
        }
    }
}

/// A validated intensity level in `1..=LEVEL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IntensityLevel(u8);

impl IntensityLevel {
    /// Level 1.
    pub const MOST_SEVERE: IntensityLevel = IntensityLevel(1);

    /// Level `LEVEL_COUNT`.
    pub const MILDEST: IntensityLevel = IntensityLevel(LEVEL_COUNT);

    /// Validate a raw level; `None` when out of range.
    pub fn new(raw: i32) -> Option<Self> {
        u8::try_from(raw)
            .ok()
            .filter(|v| (1..=LEVEL_COUNT).contains(v))
            .map(IntensityLevel)
    }

    /// All levels from most severe to mildest.
    pub fn all() -> impl Iterator<Item = IntensityLevel> {
        (1..=LEVEL_COUNT).map(IntensityLevel)
    }

    /// Raw numeric value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index for array-backed tables.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Severity weight: `(LEVEL_COUNT + 1) - level`, so level 1 weighs most.
    pub fn weight(self) -> u64 {
        u64::from(LEVEL_COUNT + 1 - self.0)
    }

    /// Display name of the level.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Cataclysm",
            2 => "Meltdown",
            3 => "Shockwave",
            4 => "Disruption",
            5 => "Noise",
            _ => "Mosquito",
        }
    }

    /// Fixed display color of the level.
    pub fn color(self) -> &'static str {
        match self.0 {
            1 => "#dc2626",
            2 => "#ea580c",
            3 => "#eab308",
            4 => "#3b82f6",
            5 => "#14b8a6",
            _ => "#94a3b8",
        }
    }
}

/// Trailing window sizes offered by the report surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportWindow {
    ThreeDays,
    Week,
    Month,
    Year,
}

impl ReportWindow {
    /// Number of local days covered.
    pub fn days(self) -> u32 {
        match self {
            ReportWindow::ThreeDays => 3,
            ReportWindow::Week => 7,
            ReportWindow::Month => 30,
            ReportWindow::Year => 365,
        }
    }

    /// Window for a day count, if it is one of the offered sizes.
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            3 => Some(ReportWindow::ThreeDays),
            7 => Some(ReportWindow::Week),
            30 => Some(ReportWindow::Month),
            365 => Some(ReportWindow::Year),
            _ => None,
        }
    }

    /// Short caption such as "Last 7 days".
    pub fn caption(self) -> String {
        format!("Last {} days", self.days())
    }
}

/// Event counts per intensity level. All levels are present, zero or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    counts: [u64; LEVEL_COUNT as usize],
}

impl LevelCounts {
    pub(crate) fn record(&mut self, level: IntensityLevel) {
        self.counts[level.index()] += 1;
    }

    /// Count for one level.
    pub fn get(&self, level: IntensityLevel) -> u64 {
        self.counts[level.index()]
    }

    /// `(level, count)` pairs from most severe to mildest.
    pub fn iter(&self) -> impl Iterator<Item = (IntensityLevel, u64)> + '_ {
        IntensityLevel::all().map(|level| (level, self.get(level)))
    }

    /// Sum over all levels.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest single level count.
    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Sum of severity weights of all counted events.
    pub fn weighted_sum(&self) -> u64 {
        self.iter().map(|(level, count)| level.weight() * count).sum()
    }

    /// Mean severity weight, 0 when empty.
    pub fn mean_weight(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.weighted_sum() as f64 / total as f64
        }
    }
}

/// One local day in a rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    /// Short month/day label, e.g. "10/19".
    pub label: String,

    /// Local midnight that opens the bucket, epoch milliseconds.
    pub start_ms: i64,

    /// Next local midnight (exclusive), epoch milliseconds.
    pub end_ms: i64,

    /// Number of events in `[start_ms, end_ms)`.
    pub count: u64,

    /// Sum of severity weights of those events.
    pub weighted_intensity_sum: u64,
}

/// Per-level counts for a single tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub tag: String,
    counts: [u64; LEVEL_COUNT as usize],
}

impl TagRow {
    pub(crate) fn new(tag: String) -> Self {
        Self {
            tag,
            counts: [0; LEVEL_COUNT as usize],
        }
    }

    pub(crate) fn record(&mut self, level: IntensityLevel) {
        self.counts[level.index()] += 1;
    }

    /// Co-occurrence count with one level.
    pub fn get(&self, level: IntensityLevel) -> u64 {
        self.counts[level.index()]
    }

    /// Sum across levels.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest cell in the row.
    pub fn max_cell(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Tag × intensity co-occurrence counts.
///
/// Rows are sorted by [`TagRow::total`] descending; ties keep the order in
/// which the tags were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagIntensityMatrix {
    rows: Vec<TagRow>,
    max_cell: u64,
}

impl TagIntensityMatrix {
    pub(crate) fn from_rows(rows: Vec<TagRow>) -> Self {
        let max_cell = rows.iter().map(TagRow::max_cell).max().unwrap_or(0);
        Self { rows, max_cell }
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[TagRow] {
        &self.rows
    }

    /// Row for a tag.
    pub fn row(&self, tag: &str) -> Option<&TagRow> {
        self.rows.iter().find(|row| row.tag == tag)
    }

    /// Count for one cell, 0 for unknown tags.
    pub fn count(&self, tag: &str, level: IntensityLevel) -> u64 {
        self.row(tag).map(|row| row.get(level)).unwrap_or(0)
    }

    /// Total across levels for a tag, 0 for unknown tags.
    pub fn total_for_tag(&self, tag: &str) -> u64 {
        self.row(tag).map(TagRow::total).unwrap_or(0)
    }

    /// Largest single cell in the whole matrix, used for color normalization.
    pub fn max_cell(&self) -> u64 {
        self.max_cell
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Event counts by local hour of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourHistogram {
    pub hours: [u64; HOURS_PER_DAY],
    pub max_hour: u64,
    pub total: u64,
}

impl HourHistogram {
    /// Busiest hour; the earliest one wins ties. `None` when empty.
    pub fn peak_hour(&self) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        self.hours.iter().position(|&count| count == self.max_hour)
    }
}

/// Everything the report surfaces need for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub window: ReportWindow,
    pub total: u64,
    pub echo_count: u64,
    pub level_counts: LevelCounts,
    pub day_buckets: Vec<DayBucket>,
    pub tag_matrix: TagIntensityMatrix,
    pub hour_histogram: HourHistogram,
    /// Events per day since the oldest event in the window.
    pub activity_rate: f64,
}

impl AggregateSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(level: i32, tags: &[&str]) -> Event {
        Event {
            id: "e1".to_string(),
            intensity_level: level,
            content: String::new(),
            is_echo: false,
            timestamp: 0,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: Category::Primary,
        }
    }

    #[test]
    fn test_intensity_level_range() {
        assert!(IntensityLevel::new(0).is_none());
        assert!(IntensityLevel::new(7).is_none());
        assert!(IntensityLevel::new(-1).is_none());
        assert_eq!(IntensityLevel::new(1), Some(IntensityLevel::MOST_SEVERE));
        assert_eq!(IntensityLevel::new(6), Some(IntensityLevel::MILDEST));
        assert_eq!(IntensityLevel::all().count(), LEVEL_COUNT as usize);
    }

    #[test]
    fn test_weight_is_inverted() {
        assert_eq!(IntensityLevel::MOST_SEVERE.weight(), 6);
        assert_eq!(IntensityLevel::MILDEST.weight(), 1);
    }

    #[test]
    fn test_event_level_rejects_out_of_range() {
        let err = event(7, &[]).level().unwrap_err();
        assert_eq!(
            err,
            ReportError::IntensityOutOfRange {
                event_id: "e1".to_string(),
                level: 7
            }
        );
    }

    #[test]
    fn test_unique_tags_dedupes_and_trims() {
        let e = event(3, &["work", " work ", "", "sleep", "work"]);
        assert_eq!(e.unique_tags(), vec!["work", "sleep"]);
    }

    #[test]
    fn test_event_json_uses_camel_case() {
        let json = r#"{
            "id": "a",
            "intensityLevel": 2,
            "content": "meeting",
            "isEcho": true,
            "timestamp": 1700000000000,
            "tags": ["work"],
            "category": "secondary"
        }"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert_eq!(e.intensity_level, 2);
        assert!(e.is_echo);
        assert_eq!(e.category, Category::Secondary);
    }

    #[test]
    fn test_event_json_defaults() {
        let json = r#"{"id": "b", "intensityLevel": 5, "timestamp": 0}"#;
        let e: Event = serde_json::from_str(json).unwrap();
        assert!(!e.is_echo);
        assert!(e.tags.is_empty());
        assert_eq!(e.category, Category::Primary);
    }

    #[test]
    fn test_report_window_days() {
        assert_eq!(ReportWindow::from_days(7), Some(ReportWindow::Week));
        assert_eq!(ReportWindow::from_days(8), None);
        assert_eq!(ReportWindow::Year.days(), 365);
    }

    #[test]
    fn test_hour_histogram_peak() {
        let mut hist = HourHistogram::default();
        assert_eq!(hist.peak_hour(), None);
        hist.hours[9] = 3;
        hist.hours[21] = 3;
        hist.max_hour = 3;
        hist.total = 6;
        assert_eq!(hist.peak_hour(), Some(9));
    }
}
