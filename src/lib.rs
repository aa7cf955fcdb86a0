//! Seismo - analytics and report rendering for a personal mood journal.
//!
//! # Overview
//!
//! Users record timestamped "intensity" events, optionally tagged and
//! optionally marked as echoes of an earlier event. Seismo turns a read-only
//! collection of those events into report data and a shareable poster:
//!
//! ```text
//! events -> aggregation -> { apportion, layout::heatmap, layout::ring } -> poster -> raster
//! ```
//!
//! Everything up to the poster is pure, synchronous computation over
//! immutable input. Rasterization is the only asynchronous boundary.
//!
//! # Determinism
//!
//! For a fixed event collection, `now` and slogan seed, every summary, seat
//! allocation, layout and the poster markup itself is byte-for-byte
//! reproducible. Randomness only enters through explicitly seeded RNGs.
//!
//! # Modules
//!
//! - [`model`]: Events, intensity levels and summary types
//! - [`error`]: Data-integrity errors
//! - [`aggregation`]: Level histogram, day buckets, tag matrix, hour histogram
//! - [`apportion`]: Largest-remainder seat apportionment
//! - [`parliament`]: Weekly party seats and tag-mix summaries
//! - [`layout`]: Heatmap grid and circadian ring geometry
//! - [`poster`]: Fixed-size SVG poster composer
//! - [`raster`]: PNG rasterization with a timeout
//! - [`demo`]: Seeded sample events
//! - [`config`]: Poster geometry and driver environment

pub mod aggregation;
pub mod apportion;
pub mod config;
pub mod demo;
pub mod error;
pub mod layout;
pub mod model;
pub mod parliament;
pub mod poster;
pub mod raster;

pub use error::{ReportError, ReportResult};
