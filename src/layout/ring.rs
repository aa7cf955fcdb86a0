//! Circadian ring: 24 annular wedges, one per hour of the day.
//!
//! Hour 0 starts at 12 o'clock and the ring runs clockwise in screen
//! coordinates (y grows downward), so hour `h` spans
//! `[(h / 24)·2π − π/2, ((h + 1) / 24)·2π − π/2]`.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write as _;

use kurbo::Point;

use super::num;
use crate::model::{HOURS_PER_DAY, HourHistogram};

#[derive(Debug, Clone, PartialEq)]
pub struct RingConfig {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Opacity of an hour with no events.
    pub base_alpha: f64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            inner_radius: 60.0,
            outer_radius: 120.0,
            base_alpha: 0.15,
        }
    }
}

/// One hour's wedge.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSegment {
    pub hour: u32,
    pub count: u64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Fill opacity in `[base_alpha, 1]`, proportional to `count / max`.
    pub alpha: f64,
}

impl RingSegment {
    /// SVG path data for this wedge around `center`.
    pub fn path_data(&self, center: Point) -> String {
        annular_wedge_path(
            center,
            self.inner_radius,
            self.outer_radius,
            self.start_angle,
            self.end_angle,
        )
    }

    /// Point halfway along the wedge, between both radii.
    pub fn centroid(&self, center: Point) -> Point {
        polar_to_cartesian(
            center,
            (self.inner_radius + self.outer_radius) / 2.0,
            (self.start_angle + self.end_angle) / 2.0,
        )
    }
}

const HOURS: u32 = HOURS_PER_DAY as u32;

fn hour_angle(hour: u32) -> f64 {
    f64::from(hour) / f64::from(HOURS) * TAU - FRAC_PI_2
}

/// Build the 24 wedges for an hour histogram.
///
/// Opacity scales linearly from `base_alpha` (no events) to 1 (the busiest
/// hour). An empty histogram yields 24 wedges at `base_alpha`.
pub fn circadian_ring(histogram: &HourHistogram, config: &RingConfig) -> Vec<RingSegment> {
    let max = histogram.max_hour;
    (0..HOURS)
        .map(|hour| {
            let count = histogram.hours[hour as usize];
            let alpha = if max == 0 {
                config.base_alpha
            } else {
                config.base_alpha + (count as f64 / max as f64) * (1.0 - config.base_alpha)
            };
            RingSegment {
                hour,
                count,
                inner_radius: config.inner_radius,
                outer_radius: config.outer_radius,
                start_angle: hour_angle(hour),
                end_angle: hour_angle(hour + 1),
                alpha,
            }
        })
        .collect()
}

pub fn polar_to_cartesian(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

/// SVG path data for an annular wedge, clockwise from `start` to `end`.
///
/// The large-arc flag is set when the sweep exceeds π. A zero inner radius
/// produces a pie slice. A full turn is drawn as two half arcs, since a
/// single SVG arc between coincident points renders nothing.
pub fn annular_wedge_path(center: Point, inner: f64, outer: f64, start: f64, end: f64) -> String {
    let span = end - start;
    if span >= TAU {
        let mid = start + PI;
        let mut d = String::new();
        let o0 = polar_to_cartesian(center, outer, start);
        let o1 = polar_to_cartesian(center, outer, mid);
        let _ = write!(
            d,
            "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
            num(o0.x),
            num(o0.y),
            num(o1.x),
            num(o1.y),
            num(o0.x),
            num(o0.y),
            r = num(outer),
        );
        if inner > 0.0 {
            let i0 = polar_to_cartesian(center, inner, start);
            let i1 = polar_to_cartesian(center, inner, mid);
            let _ = write!(
                d,
                " M {} {} A {r} {r} 0 1 0 {} {} A {r} {r} 0 1 0 {} {} Z",
                num(i0.x),
                num(i0.y),
                num(i1.x),
                num(i1.y),
                num(i0.x),
                num(i0.y),
                r = num(inner),
            );
        }
        return d;
    }

    let large_arc = u8::from(span > PI);
    let outer_start = polar_to_cartesian(center, outer, start);
    let outer_end = polar_to_cartesian(center, outer, end);

    let mut d = format!(
        "M {} {} A {r} {r} 0 {large_arc} 1 {} {}",
        num(outer_start.x),
        num(outer_start.y),
        num(outer_end.x),
        num(outer_end.y),
        r = num(outer),
    );

    if inner > 0.0 {
        let inner_end = polar_to_cartesian(center, inner, end);
        let inner_start = polar_to_cartesian(center, inner, start);
        let _ = write!(
            d,
            " L {} {} A {r} {r} 0 {large_arc} 0 {} {} Z",
            num(inner_end.x),
            num(inner_end.y),
            num(inner_start.x),
            num(inner_start.y),
            r = num(inner),
        );
    } else {
        let _ = write!(d, " L {} {} Z", num(center.x), num(center.y));
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn histogram(hours: [u64; 24]) -> HourHistogram {
        let max_hour = hours.iter().copied().max().unwrap_or(0);
        HourHistogram {
            hours,
            max_hour,
            total: hours.iter().sum(),
        }
    }

    #[test]
    fn test_segments_tile_the_circle() {
        let segments = circadian_ring(&histogram([1; 24]), &RingConfig::default());
        assert_eq!(segments.len(), 24);
        let swept: f64 = segments.iter().map(|s| s.end_angle - s.start_angle).sum();
        assert!((swept - TAU).abs() < EPS);
        for pair in segments.windows(2) {
            assert!((pair[0].end_angle - pair[1].start_angle).abs() < EPS);
        }
        assert!((segments[23].end_angle - (segments[0].start_angle + TAU)).abs() < EPS);
    }

    #[test]
    fn test_hour_zero_starts_at_top() {
        let segments = circadian_ring(&histogram([0; 24]), &RingConfig::default());
        let first = &segments[0];
        assert!((first.start_angle + FRAC_PI_2).abs() < EPS);
        let center = Point::new(200.0, 200.0);
        let top = polar_to_cartesian(center, 100.0, first.start_angle);
        assert!((top.x - 200.0).abs() < EPS);
        assert!((top.y - 100.0).abs() < EPS);

        // Hour 6 starts at three o'clock.
        let right = polar_to_cartesian(center, 100.0, segments[6].start_angle);
        assert!((right.x - 300.0).abs() < EPS);
    }

    #[test]
    fn test_alpha_scales_with_count() {
        let mut hours = [0; 24];
        hours[3] = 4;
        hours[22] = 2;
        let config = RingConfig::default();
        let segments = circadian_ring(&histogram(hours), &config);
        assert!((segments[3].alpha - 1.0).abs() < EPS);
        assert!((segments[22].alpha - (0.15 + 0.5 * 0.85)).abs() < EPS);
        assert!((segments[0].alpha - config.base_alpha).abs() < EPS);
    }

    #[test]
    fn test_empty_histogram_uses_base_alpha() {
        let config = RingConfig::default();
        let segments = circadian_ring(&histogram([0; 24]), &config);
        assert!(segments.iter().all(|s| s.alpha == config.base_alpha));
    }

    #[test]
    fn test_hour_wedge_uses_small_arc() {
        let segments = circadian_ring(&histogram([0; 24]), &RingConfig::default());
        let d = segments[0].path_data(Point::new(0.0, 0.0));
        assert!(d.starts_with("M 0.00 -120.00 A 120.00 120.00 0 0 1 "));
        assert!(d.contains(" A 60.00 60.00 0 0 0 0.00 -60.00 Z"));
    }

    #[test]
    fn test_large_arc_flag() {
        let center = Point::new(0.0, 0.0);
        let three_quarters = annular_wedge_path(center, 10.0, 20.0, 0.0, 1.5 * PI);
        assert!(three_quarters.contains("A 20.00 20.00 0 1 1"));
        assert!(three_quarters.contains("A 10.00 10.00 0 1 0"));

        let quarter = annular_wedge_path(center, 10.0, 20.0, 0.0, FRAC_PI_2);
        assert!(quarter.contains("A 20.00 20.00 0 0 1"));
    }

    #[test]
    fn test_zero_inner_radius_is_pie_slice() {
        let d = annular_wedge_path(Point::new(5.0, 5.0), 0.0, 10.0, 0.0, FRAC_PI_2);
        assert!(d.ends_with("L 5.00 5.00 Z"));
        assert_eq!(d.matches(" A ").count(), 1);
    }

    #[test]
    fn test_full_turn_splits_arcs() {
        let d = annular_wedge_path(Point::new(0.0, 0.0), 10.0, 20.0, 0.0, TAU);
        assert_eq!(d.matches(" A ").count(), 4);
    }
}
