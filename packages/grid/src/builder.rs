//! Sliding-window grid generation.
//!
//! A one-cell window starts at the grid origin and is translated east one
//! cell at a time, emitting a cell per step, until its west edge reaches
//! the bounding box's east edge. The window then returns to the western
//! edge, steps one cell south, and starts the next row. Rows continue
//! until the window's north edge reaches the bounding box's south edge,
//! so the last row and column may overhang the box.

use safe_maps_geo_models::{GeoCoordinate, GeoRectangle, round_to_precision};

use crate::GridError;
use crate::cell::{CrimeCell, DensityGrid};

/// Default upper bound on the number of cells a single grid may hold.
pub const DEFAULT_MAX_CELLS: usize = 1_000_000;

/// Smallest cell edge representable at grid precision.
pub const MIN_CELL_SIZE: f64 = 1e-8;

/// Configures and builds [`Grid`]s of equal-size cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBuilder {
    cell_size: f64,
    anchor: Option<GeoCoordinate>,
    max_cells: usize,
}

impl GridBuilder {
    /// Creates a builder for square cells of `cell_size` degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCellSize`] if `cell_size` is not finite,
    /// is smaller than [`MIN_CELL_SIZE`], or has more than eight decimals.
    #[allow(clippy::float_cmp)]
    pub fn new(cell_size: f64) -> Result<Self, GridError> {
        if !cell_size.is_finite()
            || cell_size < MIN_CELL_SIZE
            || round_to_precision(cell_size) != cell_size
        {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            anchor: None,
            max_cells: DEFAULT_MAX_CELLS,
        })
    }

    /// Aligns generated grids to the lattice that has a cell corner at
    /// `anchor`.
    ///
    /// Without an anchor the grid starts exactly at the bounding box's
    /// north-west corner.
    #[must_use]
    pub const fn with_anchor(mut self, anchor: GeoCoordinate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Caps the number of cells a grid may contain.
    #[must_use]
    pub const fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    /// Cell edge length in degrees.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Generates the grid covering `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateBounds`] if `bounds` has no area at
    /// eight-decimal precision, or [`GridError::TooLarge`] if covering it
    /// would exceed the configured cell limit.
    pub fn build(&self, bounds: &GeoRectangle) -> Result<Grid, GridError> {
        let south = round_to_precision(bounds.south());
        let east = round_to_precision(bounds.east());

        if round_to_precision(bounds.north()) <= south || round_to_precision(bounds.west()) >= east {
            return Err(GridError::DegenerateBounds {
                message: format!(
                    "({}, {}) to ({}, {})",
                    bounds.north(),
                    bounds.west(),
                    south,
                    east
                ),
            });
        }

        let origin = self.origin_for(bounds);
        let (rows, cols) = self.estimate_shape(origin, south, east);
        if rows.saturating_mul(cols) > self.max_cells {
            return Err(GridError::TooLarge {
                rows,
                cols,
                max_cells: self.max_cells,
            });
        }

        let size = self.cell_size;
        let mut cells = Vec::with_capacity(rows * cols);
        let mut row_start = GeoRectangle::new(
            origin,
            GeoCoordinate::new(
                round_to_precision(origin.latitude - size),
                round_to_precision(origin.longitude + size),
            ),
        );

        // Rows and columns never exceed the estimate by more than one.
        let mut row_count = 0;
        while row_start.north() > south && row_count <= rows {
            let mut window = row_start;
            let mut col = 0;
            while window.west() < east && col <= cols {
                cells.push(window);
                window = translate(&window, 0.0, size);
                col += 1;
            }
            row_start = translate(&row_start, -size, 0.0);
            row_count += 1;
        }

        let col_count = if row_count == 0 {
            0
        } else {
            cells.len() / row_count
        };

        log::debug!(
            "Built {row_count}x{col_count} grid ({} cells) at {size} degrees",
            cells.len()
        );

        Ok(Grid {
            bounds: *bounds,
            cell_size: size,
            rows: row_count,
            cols: col_count,
            cells,
        })
    }

    /// North-west corner of the first cell.
    fn origin_for(&self, bounds: &GeoRectangle) -> GeoCoordinate {
        let Some(anchor) = self.anchor else {
            return bounds.top_left().rounded();
        };

        let size = self.cell_size;
        let rows_above = round_to_precision((anchor.latitude - bounds.north()) / size).floor();
        let cols_before = round_to_precision((bounds.west() - anchor.longitude) / size).floor();

        GeoCoordinate::new(
            round_to_precision(anchor.latitude - rows_above * size),
            round_to_precision(anchor.longitude + cols_before * size),
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn estimate_shape(&self, origin: GeoCoordinate, south: f64, east: f64) -> (usize, usize) {
        let rows = round_to_precision((origin.latitude - south) / self.cell_size).ceil();
        let cols = round_to_precision((east - origin.longitude) / self.cell_size).ceil();
        (rows.max(0.0) as usize, cols.max(0.0) as usize)
    }
}

/// Shifts every corner of `window` by the given deltas, rounding to grid
/// precision.
fn translate(window: &GeoRectangle, d_lat: f64, d_lon: f64) -> GeoRectangle {
    let shift = |c: GeoCoordinate| {
        GeoCoordinate::new(
            round_to_precision(c.latitude + d_lat),
            round_to_precision(c.longitude + d_lon),
        )
    };
    GeoRectangle::new(shift(window.top_left()), shift(window.bottom_right()))
}

/// A dense row-major lattice of equal-size cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    bounds: GeoRectangle,
    cell_size: f64,
    rows: usize,
    cols: usize,
    cells: Vec<GeoRectangle>,
}

impl Grid {
    /// The rectangle this grid was built to cover.
    #[must_use]
    pub const fn bounds(&self) -> &GeoRectangle {
        &self.bounds
    }

    /// Cell edge length in degrees.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[GeoRectangle] {
        &self.cells
    }

    /// The cell at `(row, col)`, if it is inside the grid.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&GeoRectangle> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Overlays crime cells onto this grid.
    ///
    /// Each grid cell takes the count and activation state of the first
    /// entry in `matches` whose rectangle is exactly equal to it. Grid cells
    /// with no match are inactive with a count of zero.
    #[must_use]
    pub fn classify(&self, matches: &[CrimeCell]) -> DensityGrid {
        let mut matched = 0usize;

        let cells: Vec<CrimeCell> = self
            .cells
            .iter()
            .map(|bounds| {
                matches.iter().find(|m| m.bounds() == bounds).map_or_else(
                    || CrimeCell::with_count(*bounds, 0.0),
                    |m| {
                        matched += 1;
                        let cell = CrimeCell::with_count(*bounds, m.count().unwrap_or(0.0));
                        if m.is_active() { cell.activated() } else { cell }
                    },
                )
            })
            .collect();

        if matched < matches.len() {
            log::debug!(
                "{} of {} crime cells did not align with the grid lattice",
                matches.len() - matched,
                matches.len()
            );
        }

        DensityGrid {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: f64 = 0.0018;

    fn coord(latitude: f64, longitude: f64) -> GeoCoordinate {
        GeoCoordinate::new(latitude, longitude)
    }

    fn scenario_bounds() -> GeoRectangle {
        GeoRectangle::new(coord(40.70, -74.00), coord(40.71, -73.99))
    }

    #[test]
    fn covers_scenario_box_with_ceil_rows_and_cols() {
        let grid = GridBuilder::new(CELL).unwrap().build(&scenario_bounds()).unwrap();
        assert_eq!(grid.rows(), 6);
        assert_eq!(grid.cols(), 6);
        assert_eq!(grid.cells().len(), 36);
        assert_eq!(grid.cell(0, 0).unwrap().top_left(), coord(40.71, -74.0));
        assert_eq!(
            grid.cell(0, 1).unwrap().top_left(),
            coord(40.71, -73.998_2)
        );
        assert_eq!(
            grid.cell(1, 0).unwrap().top_left(),
            coord(40.708_2, -74.0)
        );
    }

    #[test]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn row_and_column_counts_are_ceil_of_extent() {
        let cases = [
            (coord(40.677_162, -74.039_831), coord(40.889_096, -73.894_479), 0.0018),
            (coord(52.4, 13.3), coord(52.5, 13.45), 0.01),
            (coord(-33.9, 18.4), coord(-33.8, 18.5), 0.0025),
            (coord(0.0, 0.0), coord(0.0036, 0.0054), 0.0018),
        ];

        for (a, b, size) in cases {
            let bounds = GeoRectangle::new(a, b);
            let grid = GridBuilder::new(size).unwrap().build(&bounds).unwrap();
            let height = bounds.north() - bounds.south();
            let width = bounds.east() - bounds.west();
            let expected_rows = round_to_precision(height / size).ceil() as usize;
            let expected_cols = round_to_precision(width / size).ceil() as usize;
            assert_eq!(grid.rows(), expected_rows, "rows for {bounds:?}");
            assert_eq!(grid.cols(), expected_cols, "cols for {bounds:?}");
        }
    }

    #[test]
    fn cells_tile_the_box_without_gaps() {
        let bounds = scenario_bounds();
        let grid = GridBuilder::new(CELL).unwrap().build(&bounds).unwrap();

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let cell = grid.cell(row, col).unwrap();
                let dims = cell.dimensions_in_degrees();
                assert!((round_to_precision(dims.length) - CELL).abs() < 1e-9);
                assert!((round_to_precision(cell.east() - cell.west()) - CELL).abs() < 1e-9);

                if let Some(east) = grid.cell(row, col + 1) {
                    assert!((cell.east() - east.west()).abs() < f64::EPSILON);
                }
                if let Some(south) = grid.cell(row + 1, col) {
                    assert!((cell.south() - south.north()).abs() < f64::EPSILON);
                }
            }
        }

        let last = grid.cell(grid.rows() - 1, grid.cols() - 1).unwrap();
        assert!(last.south() <= bounds.south());
        assert!(last.east() >= bounds.east());
    }

    #[test]
    fn exact_multiple_has_no_overhang() {
        let bounds = GeoRectangle::new(coord(40.7, -74.0), coord(40.7036, -73.9946));
        let grid = GridBuilder::new(CELL).unwrap().build(&bounds).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
    }

    #[test]
    fn rejects_invalid_cell_sizes() {
        assert!(matches!(GridBuilder::new(0.0), Err(GridError::InvalidCellSize(_))));
        assert!(GridBuilder::new(-0.0018).is_err());
        assert!(GridBuilder::new(f64::NAN).is_err());
        assert!(GridBuilder::new(1e-12).is_err());
        assert!(GridBuilder::new(5e-9).is_err());
        assert!(GridBuilder::new(0.001_234_567_89).is_err());
        assert!(GridBuilder::new(MIN_CELL_SIZE).is_ok());
        assert!(GridBuilder::new(0.001_234_57).is_ok());
    }

    #[test]
    fn smallest_cell_size_builds_a_finite_grid() {
        let bounds = GeoRectangle::new(coord(40.7, -74.0), coord(40.699_999_98, -73.999_999_98));
        let grid = GridBuilder::new(MIN_CELL_SIZE).unwrap().build(&bounds).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.cells().len(), 4);
    }

    #[test]
    fn cells_have_the_configured_width() {
        let size = 0.001_234_57;
        let grid = GridBuilder::new(size).unwrap().build(&scenario_bounds()).unwrap();
        for cell in grid.cells() {
            let width = round_to_precision(cell.east() - cell.west());
            assert!((width - size).abs() < 1e-9, "{width}");
        }
    }

    #[test]
    fn rejects_degenerate_bounds() {
        let flat = GeoRectangle::new(coord(40.7, -74.0), coord(40.7, -73.9));
        assert!(matches!(
            GridBuilder::new(CELL).unwrap().build(&flat),
            Err(GridError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn rejects_oversized_grids() {
        let huge = GeoRectangle::new(coord(-60.0, -170.0), coord(70.0, 170.0));
        assert!(matches!(
            GridBuilder::new(CELL).unwrap().build(&huge),
            Err(GridError::TooLarge { .. })
        ));

        let small = GridBuilder::new(CELL).unwrap().with_max_cells(35);
        assert!(small.build(&scenario_bounds()).is_err());
    }

    #[test]
    fn anchored_grid_snaps_to_lattice() {
        let anchor = coord(40.889_096, -74.039_831);
        let bounds = scenario_bounds();
        let grid = GridBuilder::new(CELL)
            .unwrap()
            .with_anchor(anchor)
            .build(&bounds)
            .unwrap();

        let origin = grid.cell(0, 0).unwrap().top_left();
        assert!(origin.latitude >= bounds.north());
        assert!(origin.latitude - CELL < bounds.north());
        assert!(origin.longitude <= bounds.west());
        assert!(origin.longitude + CELL > bounds.west());

        let steps_down = round_to_precision((anchor.latitude - origin.latitude) / CELL);
        let steps_right = round_to_precision((origin.longitude - anchor.longitude) / CELL);
        assert!((steps_down - steps_down.round()).abs() < 1e-6);
        assert!((steps_right - steps_right.round()).abs() < 1e-6);

        let last = grid.cell(grid.rows() - 1, grid.cols() - 1).unwrap();
        assert!(last.south() <= bounds.south());
        assert!(last.east() >= bounds.east());
    }

    #[test]
    fn anchored_cells_equal_lattice_cells_from_anchor() {
        let anchor = coord(40.889_096, -74.039_831);
        let grid = GridBuilder::new(CELL)
            .unwrap()
            .with_anchor(anchor)
            .build(&scenario_bounds())
            .unwrap();

        // Walk the full-city lattice from the anchor the same way the
        // stored tables were generated.
        let mut lat = anchor.latitude;
        while lat > grid.cell(0, 0).unwrap().north() {
            lat = round_to_precision(lat - CELL);
        }
        let mut lon = anchor.longitude;
        while lon < grid.cell(0, 0).unwrap().west() {
            lon = round_to_precision(lon + CELL);
        }
        let lattice_cell = GeoRectangle::new(
            coord(lat, lon),
            coord(round_to_precision(lat - CELL), round_to_precision(lon + CELL)),
        );

        assert_eq!(grid.cell(0, 0), Some(&lattice_cell));
    }

    #[test]
    fn classify_matches_exact_cells_first_wins() {
        let grid = GridBuilder::new(CELL).unwrap().build(&scenario_bounds()).unwrap();
        let target = *grid.cell(2, 3).unwrap();

        let matches = [
            CrimeCell::with_count(target, 150.0).activated(),
            CrimeCell::with_count(target, 999.0).activated(),
            // Slightly off-lattice: never matches.
            CrimeCell::with_count(
                GeoRectangle::new(coord(40.71, -74.0), coord(40.708_1, -73.998_2)),
                500.0,
            )
            .activated(),
        ];

        let density = grid.classify(&matches);
        assert_eq!(density.rows(), grid.rows());
        assert_eq!(density.cols(), grid.cols());
        assert_eq!(density.active_count(), 1);

        let cell = density.get(2, 3).unwrap();
        assert!(cell.is_active());
        assert_eq!(cell.count(), Some(150.0));

        let untouched = density.get(0, 0).unwrap();
        assert!(!untouched.is_active());
        assert_eq!(untouched.count(), Some(0.0));
    }
}
