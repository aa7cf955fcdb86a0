//! Aggregation of raw events into report summaries.
//!
//! Every function here is a pure pass over an event collection. Validation
//! happens before anything is counted: a single out-of-range intensity aborts
//! the whole computation with [`ReportError::IntensityOutOfRange`], so no
//! partially populated summary ever escapes.
//!
//! Time bucketing is done in the zone carried by the `now` argument. Pass
//! `chrono::Local` for the observer's wall clock or a fixed offset for
//! reproducible output.

use std::collections::HashMap;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use tracing::{debug, instrument};

use crate::error::{ReportError, ReportResult};
use crate::model::{
    AggregateSummary, DayBucket, Event, HOURS_PER_DAY, HourHistogram, LevelCounts, ReportWindow,
    TagIntensityMatrix, TagRow,
};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Longest accepted rolling window, a little over a century of days.
pub const MAX_WINDOW_DAYS: u32 = 36_600;

/// Check every event's intensity level, failing on the first bad one.
pub fn validate<'a, I>(events: I) -> ReportResult<()>
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().try_for_each(|event| event.level().map(|_| ()))
}

/// Count events per intensity level in a single pass.
///
/// All levels are present in the result even when zero.
pub fn histogram_by_level<'a, I>(events: I) -> ReportResult<LevelCounts>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut counts = LevelCounts::default();
    for event in events {
        counts.record(event.level()?);
    }
    Ok(counts)
}

/// Sum of severity weights over all events.
pub fn weighted_intensity_sum<'a, I>(events: I) -> ReportResult<u64>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .try_fold(0u64, |acc, event| Ok(acc + event.level()?.weight()))
}

/// Build `window_days` consecutive local-day buckets ending with the day that
/// contains `now`.
///
/// An event exactly on a midnight belongs to the day that midnight opens.
/// Events are sorted once and walked with a single cursor, so the cost does
/// not grow with the window length beyond the bucket count itself.
///
/// # Arguments
///
/// * `events` - Events to bucket; those outside the window are ignored
/// * `window_days` - Number of buckets, `1..=MAX_WINDOW_DAYS`
/// * `now` - Current instant; its zone decides where local midnights fall
///
/// # Errors
///
/// [`ReportError::EmptyWindow`] for a zero-day window,
/// [`ReportError::WindowOutOfRange`] when the window is too long or reaches
/// before the earliest calendar date, and
/// [`ReportError::IntensityOutOfRange`] for any corrupt event.
pub fn rolling_day_buckets<'a, I, Tz>(
    events: I,
    window_days: u32,
    now: &DateTime<Tz>,
) -> ReportResult<Vec<DayBucket>>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    if window_days == 0 {
        return Err(ReportError::EmptyWindow);
    }

    let tz = now.timezone();
    let first_day = first_window_day(now.date_naive(), window_days)?;

    let mut buckets = Vec::with_capacity(window_days as usize);
    let mut day = first_day;
    let mut start_ms = local_midnight_ms(&tz, day);
    for _ in 0..window_days {
        let next = next_day(day);
        let end_ms = local_midnight_ms(&tz, next);
        buckets.push(DayBucket {
            label: day.format("%-m/%-d").to_string(),
            start_ms,
            end_ms,
            count: 0,
            weighted_intensity_sum: 0,
        });
        day = next;
        start_ms = end_ms;
    }

    let window_start = buckets.first().map(|b| b.start_ms).unwrap_or(i64::MIN);
    let window_end = buckets.last().map(|b| b.end_ms).unwrap_or(i64::MIN);

    let mut in_window: Vec<(i64, u64)> = Vec::new();
    for event in events {
        let weight = event.level()?.weight();
        if (window_start..window_end).contains(&event.timestamp) {
            in_window.push((event.timestamp, weight));
        }
    }
    in_window.sort_unstable_by_key(|&(ts, _)| ts);

    let mut cursor = 0;
    for (ts, weight) in in_window {
        while ts >= buckets[cursor].end_ms {
            cursor += 1;
        }
        let bucket = &mut buckets[cursor];
        bucket.count += 1;
        bucket.weighted_intensity_sum += weight;
    }

    Ok(buckets)
}

/// Count co-occurrences of each tag with each intensity level.
///
/// Duplicate tags on one event count once. Rows come back sorted by total
/// descending with first-seen order breaking ties.
pub fn tag_intensity_matrix<'a, I>(events: I) -> ReportResult<TagIntensityMatrix>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<TagRow> = Vec::new();

    for event in events {
        let level = event.level()?;
        for tag in event.unique_tags() {
            let slot = match index.get(tag) {
                Some(&slot) => slot,
                None => {
                    rows.push(TagRow::new(tag.to_string()));
                    index.insert(tag.to_string(), rows.len() - 1);
                    rows.len() - 1
                }
            };
            rows[slot].record(level);
        }
    }

    // `sort_by` is stable, which is what makes first-seen the tie-break.
    rows.sort_by(|a, b| b.total().cmp(&a.total()));
    Ok(TagIntensityMatrix::from_rows(rows))
}

/// Count events by hour of day in the zone of `tz`.
pub fn hour_histogram<'a, I, Tz>(events: I, tz: &Tz) -> ReportResult<HourHistogram>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let mut hist = HourHistogram::default();
    for event in events {
        event.level()?;
        let local = tz.timestamp_millis_opt(event.timestamp).single().ok_or_else(|| {
            ReportError::TimestampOutOfRange {
                event_id: event.id.clone(),
                timestamp: event.timestamp,
            }
        })?;
        hist.hours[local.hour() as usize % HOURS_PER_DAY] += 1;
        hist.total += 1;
    }
    hist.max_hour = hist.hours.iter().copied().max().unwrap_or(0);
    Ok(hist)
}

/// Events per day since the oldest event, never dividing by less than a day.
pub fn activity_rate<'a, I, Tz>(events: I, now: &DateTime<Tz>) -> f64
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let mut count = 0u64;
    let mut oldest = i64::MAX;
    for event in events {
        count += 1;
        oldest = oldest.min(event.timestamp);
    }
    if count == 0 {
        return 0.0;
    }
    let span_days = (now.timestamp_millis() - oldest) as f64 / MS_PER_DAY as f64;
    count as f64 / span_days.max(1.0)
}

/// Events whose timestamp falls inside the trailing window ending with the
/// local day of `now`.
pub fn events_in_window<'a, I, Tz>(
    events: I,
    window_days: u32,
    now: &DateTime<Tz>,
) -> ReportResult<Vec<&'a Event>>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let (start, end) = window_bounds_ms(window_days, now)?;
    Ok(events
        .into_iter()
        .filter(|event| (start..end).contains(&event.timestamp))
        .collect())
}

/// `[start, end)` in epoch milliseconds of a trailing window of local days.
///
/// A zero-day window is treated as one day.
pub fn window_bounds_ms<Tz: TimeZone>(
    window_days: u32,
    now: &DateTime<Tz>,
) -> ReportResult<(i64, i64)> {
    let tz = now.timezone();
    let today = now.date_naive();
    let first_day = first_window_day(today, window_days.max(1))?;
    Ok((
        local_midnight_ms(&tz, first_day),
        local_midnight_ms(&tz, next_day(today)),
    ))
}

/// Build the full summary for one cohort over a trailing window.
///
/// The whole collection is validated first, so a corrupt event outside the
/// window still fails the call. Every aggregate is then computed from the
/// same in-window subset.
#[instrument(skip_all, fields(window_days = window.days()))]
pub fn summarize<'a, I, Tz>(
    events: I,
    window: ReportWindow,
    now: &DateTime<Tz>,
) -> ReportResult<AggregateSummary>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let all: Vec<&Event> = events.into_iter().collect();
    validate(all.iter().copied())?;
    let selected = events_in_window(all, window.days(), now)?;

    let level_counts = histogram_by_level(selected.iter().copied())?;
    let day_buckets = rolling_day_buckets(selected.iter().copied(), window.days(), now)?;
    let tag_matrix = tag_intensity_matrix(selected.iter().copied())?;
    let hour_histogram = hour_histogram(selected.iter().copied(), &now.timezone())?;
    let echo_count = selected.iter().filter(|event| event.is_echo).count() as u64;
    let activity_rate = activity_rate(selected.iter().copied(), now);

    debug!(
        total = selected.len(),
        tags = tag_matrix.len(),
        echoes = echo_count,
        "Cohort summarized"
    );

    Ok(AggregateSummary {
        window,
        total: selected.len() as u64,
        echo_count,
        level_counts,
        day_buckets,
        tag_matrix,
        hour_histogram,
        activity_rate,
    })
}

/// First day of a `window_days` window that ends with `today`.
pub(crate) fn first_window_day(today: NaiveDate, window_days: u32) -> ReportResult<NaiveDate> {
    if window_days > MAX_WINDOW_DAYS {
        return Err(ReportError::WindowOutOfRange { days: window_days });
    }
    today
        .checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
        .ok_or(ReportError::WindowOutOfRange { days: window_days })
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(day)
}

/// Epoch milliseconds of the first instant of `day` in `tz`.
///
/// When midnight is skipped by a DST jump the first valid instant after it is
/// used; when it is repeated the earlier one is used.
pub(crate) fn local_midnight_ms<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> i64 {
    let midnight = day.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.timestamp_millis();
    }
    tz.from_local_datetime(&(midnight + Duration::hours(1)))
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight).timestamp_millis())
}
