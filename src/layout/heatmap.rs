//! Tag × level heatmap grid layout.
//!
//! The number of tags is only known at render time, so the grid flows into as
//! many columns as it needs: start with one column, and while the resulting
//! cells are smaller than the configured minimum, add a column and try again.
//! The search is bounded by `max_columns`. When even the widest arrangement
//! cannot reach the minimum, the minimum is forced and the layout is marked
//! degraded. Rows never overflow the box vertically, in either mode.
//!
//! Tags flow column-major: the first column fills top to bottom before the
//! second one starts.

use kurbo::{Point, Rect, Size};
use tracing::debug;

use crate::model::LEVEL_COUNT;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayoutConfig {
    /// Cells per tag row.
    pub level_count: usize,
    pub min_cell: f64,
    pub max_cell: f64,
    pub max_columns: usize,
    /// Space after the label and between cells, horizontally and vertically.
    pub cell_gap: f64,
    pub column_gap: f64,
    /// Band above the first row reserved for level captions.
    pub header_height: f64,
    /// Share of a column's width given to the tag label before clamping.
    pub label_fraction: f64,
    pub min_label_width: f64,
    pub max_label_width: f64,
}

impl Default for HeatmapLayoutConfig {
    fn default() -> Self {
        Self {
            level_count: usize::from(LEVEL_COUNT),
            min_cell: 14.0,
            max_cell: 36.0,
            max_columns: 4,
            cell_gap: 3.0,
            column_gap: 24.0,
            header_height: 22.0,
            label_fraction: 0.34,
            min_label_width: 56.0,
            max_label_width: 160.0,
        }
    }
}

/// Resolved grid geometry, relative to the bounding box origin.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    pub columns: usize,
    pub rows_per_column: usize,
    pub cell_size: f64,
    pub label_width: f64,
    pub column_width: f64,
    pub column_gap: f64,
    pub cell_gap: f64,
    pub header_height: f64,
    /// The minimum cell size could not be met within the column cap.
    pub degraded: bool,
}

impl HeatmapLayout {
    fn empty(config: &HeatmapLayoutConfig) -> Self {
        Self {
            columns: 0,
            rows_per_column: 0,
            cell_size: 0.0,
            label_width: 0.0,
            column_width: 0.0,
            column_gap: config.column_gap,
            cell_gap: config.cell_gap,
            header_height: config.header_height,
            degraded: false,
        }
    }

    /// Vertical distance between consecutive rows.
    pub fn row_pitch(&self) -> f64 {
        self.cell_size + self.cell_gap
    }

    /// Number of tag slots the grid offers.
    pub fn capacity(&self) -> usize {
        self.columns * self.rows_per_column
    }

    /// `(column, row)` of the n-th tag.
    pub fn slot(&self, tag_index: usize) -> (usize, usize) {
        if self.rows_per_column == 0 {
            return (0, 0);
        }
        (
            tag_index / self.rows_per_column,
            tag_index % self.rows_per_column,
        )
    }

    /// Left edge of a column.
    pub fn column_x(&self, column: usize) -> f64 {
        column as f64 * (self.column_width + self.column_gap)
    }

    /// Top-left corner of the n-th tag's row, where its label starts.
    pub fn row_origin(&self, tag_index: usize) -> Point {
        let (column, row) = self.slot(tag_index);
        Point::new(
            self.column_x(column),
            self.header_height + row as f64 * self.row_pitch(),
        )
    }

    /// Left edge of a level's cells within a column.
    pub fn cell_x(&self, column: usize, level_index: usize) -> f64 {
        self.column_x(column)
            + self.label_width
            + self.cell_gap
            + level_index as f64 * (self.cell_size + self.cell_gap)
    }

    /// Square occupied by one cell.
    pub fn cell_rect(&self, tag_index: usize, level_index: usize) -> Rect {
        let (column, _) = self.slot(tag_index);
        let origin = self.row_origin(tag_index);
        let x = self.cell_x(column, level_index);
        Rect::new(x, origin.y, x + self.cell_size, origin.y + self.cell_size)
    }

    /// Height used by the header band and all rows.
    pub fn content_height(&self) -> f64 {
        if self.rows_per_column == 0 {
            return 0.0;
        }
        self.header_height + self.rows_per_column as f64 * self.row_pitch() - self.cell_gap
    }

    /// Width used by all columns.
    pub fn content_width(&self) -> f64 {
        if self.columns == 0 {
            return 0.0;
        }
        self.columns as f64 * self.column_width + (self.columns - 1) as f64 * self.column_gap
    }
}

fn column_width(bounds: Size, columns: usize, config: &HeatmapLayoutConfig) -> f64 {
    let gaps = columns.saturating_sub(1) as f64 * config.column_gap;
    ((bounds.width - gaps) / columns as f64).max(0.0)
}

fn label_width(column_width: f64, config: &HeatmapLayoutConfig) -> f64 {
    (column_width * config.label_fraction)
        .max(config.min_label_width)
        .min(config.max_label_width)
        .min(column_width * 0.5)
}

/// Largest cell that fits horizontally in a column of the given width.
fn cell_by_width(column_width: f64, label_width: f64, config: &HeatmapLayoutConfig) -> f64 {
    let levels = config.level_count.max(1) as f64;
    (column_width - label_width - levels * config.cell_gap) / levels
}

fn rows_that_fit(available_height: f64, cell: f64, config: &HeatmapLayoutConfig) -> usize {
    let pitch = cell + config.cell_gap;
    if pitch <= 0.0 {
        return 0;
    }
    // The last row needs no trailing gap.
    ((available_height + config.cell_gap) / pitch + EPSILON).floor().max(0.0) as usize
}

/// Lay out `tag_count` rows of `level_count` cells inside `bounds`.
///
/// Guarantees `columns * rows_per_column >= tag_count`, with zero columns for
/// zero tags. Unless `degraded` is set the cell size is at least
/// `config.min_cell` and the grid fits the box in both directions. A degraded
/// layout forces the minimum cell size and still fits vertically, but may need
/// more columns than `max_columns` and so more width than the box offers.
///
/// # Arguments
///
/// * `tag_count` - Number of rows to place
/// * `bounds` - Size of the panel, header band included
/// * `config` - Cell limits, gaps and label sizing
pub fn heatmap_layout(
    tag_count: usize,
    bounds: Size,
    config: &HeatmapLayoutConfig,
) -> HeatmapLayout {
    if tag_count == 0 {
        return HeatmapLayout::empty(config);
    }

    let available_height = (bounds.height - config.header_height).max(0.0);
    let max_columns = config.max_columns.max(1);

    for columns in 1..=max_columns {
        let rows = tag_count.div_ceil(columns);
        let col_width = column_width(bounds, columns, config);
        let label = label_width(col_width, config);
        let by_width = cell_by_width(col_width, label, config);
        let by_height = (available_height + config.cell_gap) / rows as f64 - config.cell_gap;
        let cell = by_width.min(by_height).min(config.max_cell);

        if cell + EPSILON >= config.min_cell {
            return HeatmapLayout {
                columns,
                rows_per_column: rows,
                cell_size: cell.floor().max(config.min_cell),
                label_width: label.floor(),
                column_width: col_width,
                column_gap: config.column_gap,
                cell_gap: config.cell_gap,
                header_height: config.header_height,
                degraded: false,
            };
        }
    }

    // Forced minimum: keep rows inside the box, let the columns multiply.
    let rows = rows_that_fit(available_height, config.min_cell, config)
        .max(1)
        .min(tag_count);
    let columns = tag_count.div_ceil(rows);
    let col_width = column_width(bounds, columns, config);
    let levels = config.level_count as f64;
    let label = label_width(col_width, config)
        .min((col_width - levels * (config.min_cell + config.cell_gap)).max(0.0));

    debug!(
        tag_count,
        columns,
        rows,
        min_cell = config.min_cell,
        "Heatmap layout degraded to minimum cell size"
    );

    HeatmapLayout {
        columns,
        rows_per_column: rows,
        cell_size: config.min_cell,
        label_width: label.floor(),
        column_width: col_width,
        column_gap: config.column_gap,
        cell_gap: config.cell_gap,
        header_height: config.header_height,
        degraded: true,
    }
}

/// Largest tag count that [`heatmap_layout`] can place in `bounds` without
/// degrading.
pub fn max_feasible_tags(bounds: Size, config: &HeatmapLayoutConfig) -> usize {
    let available_height = (bounds.height - config.header_height).max(0.0);
    let rows = rows_that_fit(available_height, config.min_cell, config);
    (1..=config.max_columns.max(1))
        .filter(|&columns| {
            let col_width = column_width(bounds, columns, config);
            let label = label_width(col_width, config);
            cell_by_width(col_width, label, config) + EPSILON >= config.min_cell
        })
        .map(|columns| columns * rows)
        .max()
        .unwrap_or(0)
}
