//! Greedy consolidation of adjacent active cells into larger zones.
//!
//! Each pass reduces the active-cell matrix to one histogram per row (the
//! number of consecutive active cells ending at that row in each column),
//! finds the largest rectangle under any histogram, and consumes it. Passes
//! repeat until no active cell remains. Every pass consumes at least one
//! cell, so the loop always terminates.

use safe_maps_crime_models::{AvoidArea, CrimeDensity};
use safe_maps_geo_models::GeoRectangle;

use crate::cell::DensityGrid;

/// Inclusive row/column index bounds of a block of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpan {
    /// First row (northernmost).
    pub top: usize,
    /// First column (westernmost).
    pub left: usize,
    /// Last row (southernmost).
    pub bottom: usize,
    /// Last column (easternmost).
    pub right: usize,
}

impl GridSpan {
    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.right - self.left + 1
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.height() * self.width()
    }

    /// Whether `(row, col)` lies inside this span.
    #[must_use]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top && row <= self.bottom && col >= self.left && col <= self.right
    }
}

/// A merged rectangle covering one or more originally active cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolidatedZone {
    /// Geographic extent, from the top-left cell's north-west corner to the
    /// bottom-right cell's south-east corner.
    pub bounds: GeoRectangle,
    /// Mean crime count over the subsumed cells.
    pub crime_count: f64,
    /// Number of subsumed cells.
    pub cell_count: usize,
    /// Grid indices of the subsumed block.
    pub span: GridSpan,
}

impl CrimeDensity for ConsolidatedZone {
    fn crime_count(&self) -> f64 {
        self.crime_count
    }
}

impl From<ConsolidatedZone> for AvoidArea {
    fn from(zone: ConsolidatedZone) -> Self {
        Self {
            bounds: zone.bounds,
            crime_count: zone.crime_count,
            cell_count: zone.cell_count,
        }
    }
}

/// The largest rectangle found under a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramRectangle {
    /// `height * width`.
    pub area: usize,
    /// Leftmost bar index.
    pub left: usize,
    /// Number of bars spanned.
    pub width: usize,
    /// Shortest bar within the span.
    pub height: usize,
}

/// Merges every active cell of `grid` into maximal rectangular zones.
///
/// Consumed cells are left inactive, so on return `grid` has no active
/// cells. Zones are returned in the order they were carved out, largest
/// first.
pub fn consolidate(grid: &mut DensityGrid) -> Vec<ConsolidatedZone> {
    let active = grid.active_count();
    let mut zones = Vec::new();

    while let Some(span) = maximal_active_block(grid) {
        zones.push(absorb(grid, span));
    }

    log::debug!(
        "Consolidated {active} active cells into {} zones",
        zones.len()
    );

    zones
}

/// Finds the largest all-active rectangular block in `grid`.
///
/// Ties keep the block found first, scanning rows north to south.
#[must_use]
pub fn maximal_active_block(grid: &DensityGrid) -> Option<GridSpan> {
    let mut heights = vec![0usize; grid.cols()];
    let mut best: Option<(usize, GridSpan)> = None;

    for row in 0..grid.rows() {
        for (col, height) in heights.iter_mut().enumerate() {
            *height = if grid.is_active(row, col) {
                *height + 1
            } else {
                0
            };
        }

        let Some(bar) = largest_histogram_rectangle(&heights) else {
            continue;
        };

        if best.is_none_or(|(area, _)| bar.area > area) {
            best = Some((
                bar.area,
                GridSpan {
                    top: row + 1 - bar.height,
                    left: bar.left,
                    bottom: row,
                    right: bar.left + bar.width - 1,
                },
            ));
        }
    }

    best.map(|(_, span)| span)
}

/// Largest-rectangle-in-histogram by scanning every pair of bar bounds.
///
/// Quadratic in the number of bars, which is fine at city-grid widths.
/// Returns `None` when every bar is zero.
#[must_use]
pub fn largest_histogram_rectangle(heights: &[usize]) -> Option<HistogramRectangle> {
    let mut best: Option<HistogramRectangle> = None;

    for i in 0..heights.len() {
        let mut running_min = usize::MAX;
        for (j, &h) in heights.iter().enumerate().skip(i) {
            running_min = running_min.min(h);
            if running_min == 0 {
                break;
            }
            let width = j - i + 1;
            let area = running_min * width;
            if best.is_none_or(|b| area > b.area) {
                best = Some(HistogramRectangle {
                    area,
                    left: i,
                    width,
                    height: running_min,
                });
            }
        }
    }

    best
}

/// Deactivates every cell in `span` and summarizes it as one zone.
fn absorb(grid: &mut DensityGrid, span: GridSpan) -> ConsolidatedZone {
    let mut total = 0.0;
    let mut cell_count = 0usize;

    for row in span.top..=span.bottom {
        for col in span.left..=span.right {
            total += grid.deactivate(row, col).crime_count();
            cell_count += 1;
        }
    }

    let bounds = GeoRectangle::new(
        grid.cell(span.top, span.left).bounds().top_left(),
        grid.cell(span.bottom, span.right).bounds().bottom_right(),
    );

    #[allow(clippy::cast_precision_loss)]
    let crime_count = total / cell_count as f64;

    ConsolidatedZone {
        bounds,
        crime_count,
        cell_count,
        span,
    }
}

#[cfg(test)]
mod tests {
    use safe_maps_geo_models::GeoCoordinate;

    use super::*;
    use crate::builder::GridBuilder;
    use crate::cell::CrimeCell;

    const CELL: f64 = 0.0018;

    /// Builds a density grid over unit cells from a mask of counts; zero
    /// means inactive.
    fn grid_from(mask: &[&[u32]]) -> DensityGrid {
        let rows = mask.len();
        let cols = mask[0].len();
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, line) in mask.iter().enumerate() {
            for (c, &count) in line.iter().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let (lat, lon) = (-(r as f64), c as f64);
                let bounds = GeoRectangle::new(
                    GeoCoordinate::new(lat, lon),
                    GeoCoordinate::new(lat - 1.0, lon + 1.0),
                );
                let cell = CrimeCell::with_count(bounds, f64::from(count));
                cells.push(if count > 0 { cell.activated() } else { cell });
            }
        }
        DensityGrid::from_cells(rows, cols, cells).unwrap()
    }

    #[test]
    fn finds_largest_rectangle_in_histogram() {
        let best = largest_histogram_rectangle(&[2, 1, 5, 6, 2, 3]).unwrap();
        assert_eq!(
            best,
            HistogramRectangle {
                area: 10,
                left: 2,
                width: 2,
                height: 5
            }
        );

        let flat = largest_histogram_rectangle(&[1, 1, 1]).unwrap();
        assert_eq!((flat.area, flat.left, flat.width), (3, 0, 3));

        assert!(largest_histogram_rectangle(&[0, 0, 0]).is_none());
        assert!(largest_histogram_rectangle(&[]).is_none());
    }

    #[test]
    fn histogram_ties_keep_first_span() {
        let best = largest_histogram_rectangle(&[2, 0, 2]).unwrap();
        assert_eq!((best.area, best.left), (2, 0));
    }

    #[test]
    fn locates_maximal_block_with_top_row() {
        let grid = grid_from(&[
            &[0, 0, 0, 0],
            &[0, 1, 1, 1],
            &[0, 1, 1, 1],
            &[1, 0, 0, 0],
        ]);
        assert_eq!(
            maximal_active_block(&grid),
            Some(GridSpan {
                top: 1,
                left: 1,
                bottom: 2,
                right: 3
            })
        );
    }

    #[test]
    fn empty_grid_yields_no_zones() {
        let mut grid = grid_from(&[&[0, 0], &[0, 0]]);
        assert!(maximal_active_block(&grid).is_none());
        assert!(consolidate(&mut grid).is_empty());
    }

    #[test]
    fn merges_adjacent_monday_cells_into_mean_zone() {
        let bounds = GeoRectangle::new(
            GeoCoordinate::new(40.70, -74.00),
            GeoCoordinate::new(40.71, -73.99),
        );
        let lattice = GridBuilder::new(CELL).unwrap().build(&bounds).unwrap();
        let west = *lattice.cell(1, 2).unwrap();
        let east = *lattice.cell(1, 3).unwrap();

        let mut grid = lattice.classify(&[
            CrimeCell::with_count(west, 150.0).activated(),
            CrimeCell::with_count(east, 160.0).activated(),
        ]);

        let zones = consolidate(&mut grid);
        assert_eq!(zones.len(), 1);

        let zone = zones[0];
        assert!((zone.crime_count - 155.0).abs() < f64::EPSILON);
        assert_eq!(zone.cell_count, 2);
        assert_eq!(zone.bounds.top_left(), west.top_left());
        assert_eq!(zone.bounds.bottom_right(), east.bottom_right());
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn every_active_cell_lands_in_exactly_one_zone() {
        let mut grid = grid_from(&[
            &[5, 5, 0, 9, 9],
            &[5, 5, 0, 9, 0],
            &[0, 7, 7, 7, 0],
            &[3, 0, 0, 7, 1],
        ]);
        let original = grid.clone();
        let active = grid.active_count();

        let zones = consolidate(&mut grid);

        assert_eq!(grid.active_count(), 0);
        assert_eq!(zones.iter().map(|z| z.cell_count).sum::<usize>(), active);

        for row in 0..original.rows() {
            for col in 0..original.cols() {
                let covering = zones.iter().filter(|z| z.span.contains(row, col)).count();
                let expected = usize::from(original.is_active(row, col));
                assert_eq!(covering, expected, "cell ({row}, {col})");
            }
        }

        for zone in &zones {
            assert_eq!(zone.span.area(), zone.cell_count);
        }
    }

    #[test]
    fn zones_come_out_largest_first() {
        let mut grid = grid_from(&[&[1, 1, 1, 0, 2], &[1, 1, 1, 0, 0]]);
        let zones = consolidate(&mut grid);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].cell_count, 6);
        assert!((zones[0].crime_count - 1.0).abs() < f64::EPSILON);
        assert_eq!(zones[1].cell_count, 1);
        assert!((zones[1].crime_count - 2.0).abs() < f64::EPSILON);

        let area: AvoidArea = zones[0].into();
        assert_eq!(area.cell_count, 6);
        assert_eq!(area.top_left(), GeoCoordinate::new(0.0, 0.0));
        assert_eq!(area.bottom_right(), GeoCoordinate::new(-2.0, 3.0));
    }
}
