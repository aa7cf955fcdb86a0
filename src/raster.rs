//! PNG rasterization of composed posters.
//!
//! Rendering is CPU-bound and can take a while for large canvases, so the
//! async entry point runs it on the blocking pool and bounds it with a
//! timeout. The request is all-or-nothing: either a complete PNG comes back
//! or a [`RasterError`].

use std::sync::Arc;
use std::time::Duration;

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Largest accepted output edge, in pixels.
const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),

    #[error("invalid output size {width}x{height}")]
    Canvas { width: u32, height: u32 },

    #[error("failed to encode PNG: {0}")]
    Encode(String),

    #[error("rasterization timed out after {0:?}")]
    Timeout(Duration),

    #[error("rasterization task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per SVG unit.
    pub scale: f32,
    /// Resolve `sans-serif` and friends against the system fonts. Without
    /// fonts, text is left out of the image.
    pub system_fonts: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            system_fonts: true,
        }
    }
}

fn usvg_options(options: &RasterOptions) -> usvg::Options<'static> {
    let mut db = usvg::fontdb::Database::new();
    if options.system_fonts {
        db.load_system_fonts();
    }
    usvg::Options {
        fontdb: Arc::new(db),
        ..Default::default()
    }
}

/// Render an SVG document to PNG bytes on the current thread.
pub fn rasterize_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>, RasterError> {
    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg_options(options))?;

    let size = tree.size();
    let to_px = |v: f32| -> u32 {
        let px = (v * options.scale).ceil();
        if px.is_finite() && px >= 1.0 { px as u32 } else { 0 }
    };
    let (width, height) = (to_px(size.width()), to_px(size.height()));
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::Canvas { width, height });
    }

    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Canvas { width, height })?;
    resvg::render(
        &tree,
        Transform::from_scale(options.scale, options.scale),
        &mut pixmap.as_mut(),
    );

    let png = pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    debug!(width, height, bytes = png.len(), "Rasterized SVG");
    Ok(png)
}

/// Render on the blocking thread pool, giving up after `timeout`.
///
/// On timeout the render thread is left to finish on its own and its result
/// is discarded.
#[instrument(skip_all, fields(bytes = svg.len(), timeout_ms = timeout.as_millis() as u64))]
pub async fn rasterize_png_async(
    svg: String,
    options: RasterOptions,
    timeout: Duration,
) -> Result<Vec<u8>, RasterError> {
    let task = tokio::task::spawn_blocking(move || rasterize_png(&svg, &options));
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined?,
        Err(_) => {
            warn!(?timeout, "Rasterization timed out");
            Err(RasterError::Timeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20" viewBox="0 0 10 20"><rect width="10" height="20" fill="#ff0000"/></svg>"##;

    fn no_fonts(scale: f32) -> RasterOptions {
        RasterOptions {
            scale,
            system_fonts: false,
        }
    }

    fn png_size(png: &[u8]) -> (u32, u32) {
        let w = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let h = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (w, h)
    }

    #[test]
    fn test_rasterize_png_signature_and_size() {
        let png = rasterize_png(RED, &no_fonts(1.0)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(png_size(&png), (10, 20));
    }

    #[test]
    fn test_scale_multiplies_size() {
        let png = rasterize_png(RED, &no_fonts(2.0)).unwrap();
        assert_eq!(png_size(&png), (20, 40));
    }

    #[test]
    fn test_invalid_svg() {
        let err = rasterize_png("not svg", &no_fonts(1.0)).unwrap_err();
        assert!(matches!(err, RasterError::Parse(_)));
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let err = rasterize_png(RED, &no_fonts(0.0)).unwrap_err();
        assert!(matches!(err, RasterError::Canvas { width: 0, height: 0 }));
    }

    #[test]
    fn test_timeout_message() {
        let err = RasterError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "rasterization timed out after 3s");
    }

    #[tokio::test]
    async fn test_async_rasterize() {
        let png = rasterize_png_async(RED.to_string(), no_fonts(1.0), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(png_size(&png), (10, 20));
    }

    #[tokio::test]
    async fn test_async_propagates_parse_error() {
        let err = rasterize_png_async("<svg".to_string(), no_fonts(1.0), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RasterError::Parse(_)));
    }
}
