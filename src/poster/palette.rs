//! Poster colors.
//!
//! Colors are blended in integer RGB and always emitted as `#rrggbb`, so the
//! markup stays byte-stable and renders identically in every rasterizer.

use crate::model::{Category, IntensityLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

pub const BACKGROUND: Rgb = Rgb::new(0xf8, 0xfa, 0xfc);
pub const CARD: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const BORDER: Rgb = Rgb::new(0xe2, 0xe8, 0xf0);
pub const TRACK: Rgb = Rgb::new(0xf1, 0xf5, 0xf9);
pub const INK: Rgb = Rgb::new(0x1e, 0x29, 0x3b);
pub const MUTED: Rgb = Rgb::new(0x94, 0xa3, 0xb8);
pub const EMPTY_CELL: Rgb = Rgb::new(0xf1, 0xf5, 0xf9);

/// Accent color of a cohort.
pub fn accent(category: Category) -> Rgb {
    match category {
        Category::Primary => Rgb::new(0xe1, 0x1d, 0x48),
        Category::Secondary => Rgb::new(0x0d, 0x94, 0x88),
    }
}

pub fn level(level: IntensityLevel) -> Rgb {
    Rgb::from_hex(level.color()).unwrap_or(MUTED)
}

/// Heatmap cell color: empty-cell gray blended towards the level color by
/// `count / max`. Any non-zero count gets at least a visible tint.
pub fn heat(level_color: Rgb, count: u64, max: u64) -> Rgb {
    if count == 0 || max == 0 {
        return EMPTY_CELL;
    }
    let t = 0.2 + 0.8 * (count as f64 / max as f64);
    EMPTY_CELL.mix(level_color, t)
}

/// Colors for the tag-mix strip, cycling through shades of the accent.
pub fn mix_shade(category: Category, index: usize) -> Rgb {
    const STEPS: [f64; 5] = [0.0, 0.25, 0.45, 0.6, 0.72];
    accent(category).mix(CARD, STEPS[index % STEPS.len()])
}
