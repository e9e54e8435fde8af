//! Grid cells carrying crime counts, and the dense arena that holds them.

use safe_maps_crime_models::{AvoidArea, CrimeDensity};
use safe_maps_geo_models::GeoRectangle;

use crate::GridError;

/// A grid cell paired with its crime count and activation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrimeCell {
    bounds: GeoRectangle,
    crime_count: Option<f64>,
    active: bool,
}

impl CrimeCell {
    /// A freshly generated cell: inactive, with no known count.
    #[must_use]
    pub const fn new(bounds: GeoRectangle) -> Self {
        Self {
            bounds,
            crime_count: None,
            active: false,
        }
    }

    /// An inactive cell with a known count.
    #[must_use]
    pub const fn with_count(bounds: GeoRectangle, crime_count: f64) -> Self {
        Self {
            bounds,
            crime_count: Some(crime_count),
            active: false,
        }
    }

    /// Returns a copy of this cell marked active.
    #[must_use]
    pub const fn activated(self) -> Self {
        Self {
            active: true,
            ..self
        }
    }

    /// Returns a copy of this cell marked inactive.
    #[must_use]
    pub const fn deactivated(self) -> Self {
        Self {
            active: false,
            ..self
        }
    }

    /// The cell's rectangle.
    #[must_use]
    pub const fn bounds(&self) -> &GeoRectangle {
        &self.bounds
    }

    /// The cell's rectangle re-derived through the constructor, without
    /// count or activation state.
    #[must_use]
    pub fn rebuild(&self) -> GeoRectangle {
        self.bounds.rebuild()
    }

    /// The crime count, if one has been assigned.
    #[must_use]
    pub const fn count(&self) -> Option<f64> {
        self.crime_count
    }

    /// Whether this cell is currently marked dangerous.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Converts this single cell into an avoid-area.
    #[must_use]
    pub fn to_avoid_area(&self) -> AvoidArea {
        AvoidArea {
            bounds: self.bounds,
            crime_count: self.crime_count(),
            cell_count: 1,
        }
    }
}

impl CrimeDensity for CrimeCell {
    fn crime_count(&self) -> f64 {
        self.crime_count.unwrap_or(0.0)
    }
}

/// A dense, row-major arena of [`CrimeCell`]s addressed by `(row, col)`.
///
/// Row 0 is the northernmost row and column 0 the westernmost column.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) cells: Vec<CrimeCell>,
}

impl DensityGrid {
    /// Wraps a row-major cell vector.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if `cells.len() != rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<CrimeCell>) -> Result<Self, GridError> {
        let expected = rows * cols;
        if cells.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
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
    pub fn cells(&self) -> &[CrimeCell] {
        &self.cells
    }

    /// The cell at `(row, col)`, if it is inside the grid.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&CrimeCell> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Whether the cell at `(row, col)` exists and is active.
    #[must_use]
    pub fn is_active(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some_and(CrimeCell::is_active)
    }

    /// Number of active cells.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_active()).count()
    }

    /// Marks the cell at `(row, col)` inactive and returns it.
    pub(crate) fn deactivate(&mut self, row: usize, col: usize) -> CrimeCell {
        let idx = row * self.cols + col;
        self.cells[idx] = self.cells[idx].deactivated();
        self.cells[idx]
    }

    /// The cell at `(row, col)`.
    ///
    /// Callers must pass indices inside the grid.
    pub(crate) fn cell(&self, row: usize, col: usize) -> &CrimeCell {
        &self.cells[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use safe_maps_geo_models::GeoCoordinate;

    use super::*;

    fn unit(row: usize, col: usize) -> GeoRectangle {
        #[allow(clippy::cast_precision_loss)]
        let (r, c) = (row as f64, col as f64);
        GeoRectangle::new(
            GeoCoordinate::new(-r, c),
            GeoCoordinate::new(-r - 1.0, c + 1.0),
        )
    }

    #[test]
    fn rejects_mismatched_shape() {
        let cells = vec![CrimeCell::new(unit(0, 0)); 3];
        assert!(matches!(
            DensityGrid::from_cells(2, 2, cells),
            Err(GridError::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn addresses_cells_row_major() {
        let cells = (0..2)
            .flat_map(|r| (0..3).map(move |c| CrimeCell::with_count(unit(r, c), 1.0)))
            .collect();
        let grid = DensityGrid::from_cells(2, 3, cells).unwrap();

        assert_eq!(grid.get(1, 2).unwrap().bounds(), &unit(1, 2));
        assert!(grid.get(2, 0).is_none());
        assert!(grid.get(0, 3).is_none());
        assert!(!grid.is_active(0, 0));
        assert_eq!(grid.active_count(), 0);
    }

    #[test]
    fn activation_round_trips_and_keeps_count() {
        let cell = CrimeCell::with_count(unit(0, 0), 7.0).activated();
        assert!(cell.is_active());
        assert_eq!(cell.count(), Some(7.0));
        assert!(!cell.deactivated().is_active());
        assert_eq!(cell.rebuild(), *cell.bounds());
    }

    #[test]
    fn missing_count_ranks_as_zero() {
        let cell = CrimeCell::new(unit(0, 0));
        assert!(cell.crime_count().abs() < f64::EPSILON);
        assert_eq!(cell.to_avoid_area().cell_count, 1);
    }
}
