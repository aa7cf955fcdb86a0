//! Pure geometry for the report charts.
//!
//! Layout functions take sizes and counts and return plain descriptors. They
//! never draw anything; the poster composer turns descriptors into markup.
//!
//! - [`heatmap`]: multi-column tag × level grid that fits a bounding box
//! - [`ring`]: 24-slice circadian ring of annular wedges

pub mod heatmap;
pub mod ring;

pub use heatmap::{HeatmapLayout, HeatmapLayoutConfig, heatmap_layout, max_feasible_tags};
pub use ring::{RingConfig, RingSegment, annular_wedge_path, circadian_ring, polar_to_cartesian};

use kurbo::Rect;

/// Format a coordinate with two decimals, never printing `-0.00`.
///
/// All markup numbers go through here so identical geometry always yields
/// identical text.
pub fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00".to_string()
    } else {
        format!("{rounded:.2}")
    }
}

/// Shrink a rectangle by `pad` on every side, collapsing to zero size rather
/// than inverting.
pub fn shrink(rect: Rect, pad: f64) -> Rect {
    let x1 = (rect.x1 - pad).max(rect.x0 + pad);
    let y1 = (rect.y1 - pad).max(rect.y0 + pad);
    Rect::new(rect.x0 + pad, rect.y0 + pad, x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_is_stable() {
        assert_eq!(num(1.0), "1.00");
        assert_eq!(num(-0.001), "0.00");
        assert_eq!(num(2.345_678), "2.35");
        assert_eq!(num(-12.5), "-12.50");
    }

    #[test]
    fn test_shrink() {
        let r = shrink(Rect::new(0.0, 0.0, 100.0, 50.0), 10.0);
        assert_eq!(r, Rect::new(10.0, 10.0, 90.0, 40.0));

        let tiny = shrink(Rect::new(0.0, 0.0, 10.0, 10.0), 8.0);
        assert_eq!(tiny.width(), 0.0);
        assert_eq!(tiny.height(), 0.0);
    }
}
