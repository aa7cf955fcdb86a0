//! Minimal SVG writer.
//!
//! Emits a self-contained document: no external images, fonts or
//! stylesheets, only generic font families. Every number is printed through
//! [`num`] so identical geometry always yields identical bytes.
//!
//! # Text metrics
//!
//! There is no font shaping here. Text width is estimated with a fixed-width
//! assumption: 0.6 em per ASCII character and 1 em for anything else. Labels
//! are truncated against that estimate, which can leave slack (or, for very
//! wide glyphs, a little overhang) once a real font is applied.

use std::borrow::Cow;
use std::fmt::Write as _;

use kurbo::{Point, Rect};

use crate::layout::num;

const FONT_FAMILY: &str = "sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub weight: u16,
    pub fill: String,
    pub anchor: Anchor,
    pub italic: bool,
}

impl TextStyle {
    pub fn new(size: f64, fill: impl Into<String>) -> Self {
        Self {
            size,
            weight: 400,
            fill: fill.into(),
            anchor: Anchor::Start,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = 700;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Accumulates elements into one SVG document.
#[derive(Debug)]
pub struct SvgDocument {
    buf: String,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64, background: &str) -> Self {
        let mut buf = String::with_capacity(64 * 1024);
        let _ = writeln!(
            buf,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(width),
            h = num(height),
        );
        let _ = writeln!(
            buf,
            r#"<rect x="0.00" y="0.00" width="{}" height="{}" fill="{background}"/>"#,
            num(width),
            num(height),
        );
        Self { buf }
    }

    pub fn open_group(&mut self, id: &str) {
        let _ = writeln!(self.buf, r#"<g id="{}">"#, escape(id));
    }

    pub fn close_group(&mut self) {
        self.buf.push_str("</g>\n");
    }

    /// Filled rectangle with rounded corners.
    pub fn rect(&mut self, rect: Rect, radius: f64, fill: &str) {
        let _ = write!(
            self.buf,
            r#"<rect x="{}" y="{}" width="{}" height="{}""#,
            num(rect.x0),
            num(rect.y0),
            num(rect.width().max(0.0)),
            num(rect.height().max(0.0)),
        );
        if radius > 0.0 {
            let _ = write!(self.buf, r#" rx="{}""#, num(radius));
        }
        let _ = writeln!(self.buf, r#" fill="{fill}"/>"#);
    }

    /// Unfilled rectangle outline, optionally dashed.
    pub fn outline(&mut self, rect: Rect, radius: f64, stroke: &str, width: f64, dashed: bool) {
        let _ = write!(
            self.buf,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="none" stroke="{stroke}" stroke-width="{}""#,
            num(rect.x0),
            num(rect.y0),
            num(rect.width().max(0.0)),
            num(rect.height().max(0.0)),
            num(radius),
            num(width),
        );
        if dashed {
            self.buf.push_str(r#" stroke-dasharray="8 6""#);
        }
        self.buf.push_str("/>\n");
    }

    pub fn path(&mut self, d: &str, fill: &str, opacity: f64) {
        let _ = writeln!(
            self.buf,
            r#"<path d="{d}" fill="{fill}" fill-opacity="{}"/>"#,
            num(opacity)
        );
    }

    /// Text with its baseline at `pos`.
    pub fn text(&mut self, pos: Point, content: &str, style: &TextStyle) {
        let _ = write!(
            self.buf,
            r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" fill="{}""#,
            num(pos.x),
            num(pos.y),
            num(style.size),
            style.fill,
        );
        if style.weight != 400 {
            let _ = write!(self.buf, r#" font-weight="{}""#, style.weight);
        }
        if style.italic {
            self.buf.push_str(r#" font-style="italic""#);
        }
        if style.anchor != Anchor::Start {
            let _ = write!(self.buf, r#" text-anchor="{}""#, style.anchor.as_str());
        }
        let _ = writeln!(self.buf, ">{}</text>", escape(content));
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str("</svg>\n");
        self.buf
    }
}

/// Escape text for element content and attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn char_width(ch: char, size: f64) -> f64 {
    if ch.is_ascii() { size * 0.6 } else { size }
}

/// Estimated rendered width of `text` at font size `size`.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().map(|ch| char_width(ch, size)).sum()
}

/// Cut `text` so its estimated width fits `max_width`, appending an
/// ellipsis when anything was removed.
pub fn truncate_to_width(text: &str, size: f64, max_width: f64) -> String {
    if text_width(text, size) <= max_width {
        return text.to_string();
    }
    let ellipsis = '…';
    let budget = max_width - char_width(ellipsis, size);
    let mut used = 0.0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = char_width(ch, size);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push(ellipsis);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_text_width_is_fixed_width() {
        assert_eq!(text_width("abcd", 10.0), 24.0);
        assert_eq!(text_width("工作", 10.0), 20.0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("short", 10.0, 100.0), "short");
        let cut = truncate_to_width("a very long tag name", 10.0, 60.0);
        assert!(cut.ends_with('…'));
        assert!(text_width(&cut, 10.0) <= 60.0);
        assert_eq!(cut, "a very l…");
    }

    #[test]
    fn test_document_shape() {
        let mut doc = SvgDocument::new(100.0, 50.0, "#ffffff");
        doc.open_group("card");
        doc.rect(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0, "#000000");
        doc.text(Point::new(1.0, 2.0), "x<y", &TextStyle::new(12.0, "#111111").bold());
        doc.close_group();
        let svg = doc.finish();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100.00\""));
        assert!(svg.contains("<g id=\"card\">"));
        assert!(svg.contains(
            r##"<rect x="0.00" y="0.00" width="10.00" height="10.00" rx="2.00" fill="#000000"/>"##
        ));
        assert!(svg.contains("font-weight=\"700\">x&lt;y</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
