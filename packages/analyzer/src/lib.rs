#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selects high-crime rectangles for a bicycle trip.
//!
//! [`CrimeAnalyzer`] pads the box around a source/destination pair, loads
//! the pre-aggregated crime counts for that box and weekday from a
//! [`CrimeCountStore`], keeps the cells at or above the weekday threshold,
//! optionally merges adjacent cells into larger zones, and returns the
//! densest areas first.

pub mod bounds;
pub mod classify;
pub mod config;

use std::sync::Arc;

use safe_maps_crime_models::{AvoidArea, CellCrimeRecord, DayOfWeek};
use safe_maps_geo_models::{CoordinateError, GeoCoordinate, GeoRectangle};
use safe_maps_grid::{CrimeCell, GridBuilder, GridError, consolidate};
use thiserror::Error;

pub use config::{AnalyzerConfig, ConfigError};

/// Error type returned by [`CrimeCountStore`] implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while computing avoid-areas.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The requested day has no threshold.
    #[error("Invalid day of week: {day}")]
    InvalidDay {
        /// The day as requested.
        day: String,
    },

    /// A source or destination coordinate is unusable.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    /// The store returned a record that cannot be placed on the grid.
    #[error("Malformed cell data: {message}")]
    MalformedCellData {
        /// Description of what went wrong.
        message: String,
    },

    /// The crime count store failed.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),

    /// The consolidation grid could not be built.
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Read-only source of per-cell, per-weekday crime counts.
#[async_trait::async_trait]
pub trait CrimeCountStore: Send + Sync {
    /// Returns every stored cell whose corners both fall inside `bounds`.
    ///
    /// An empty result is valid.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store cannot be queried.
    async fn fetch_cell_counts(
        &self,
        bounds: &GeoRectangle,
        day: DayOfWeek,
    ) -> Result<Vec<CellCrimeRecord>, StoreError>;
}

/// Computes avoid-areas from stored crime counts.
pub struct CrimeAnalyzer {
    store: Arc<dyn CrimeCountStore>,
    config: AnalyzerConfig,
}

impl std::fmt::Debug for CrimeAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrimeAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CrimeAnalyzer {
    /// Creates an analyzer over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CrimeCountStore>, config: AnalyzerConfig) -> Self {
        Self { store, config }
    }

    /// The analyzer's settings.
    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Returns the densest crime areas around a trip, densest first.
    ///
    /// At most `max_areas` areas are returned. An empty list means no cell
    /// met the day's threshold.
    ///
    /// # Errors
    ///
    /// * [`AnalyzerError::InvalidDay`] if `day` has no threshold. Checked
    ///   before any I/O.
    /// * [`AnalyzerError::InvalidCoordinate`] if either endpoint is invalid.
    /// * [`AnalyzerError::Storage`] if the store query fails.
    /// * [`AnalyzerError::MalformedCellData`] if any stored record is bad.
    /// * [`AnalyzerError::Grid`] if the consolidation grid is too large.
    pub async fn get_areas_to_avoid(
        &self,
        source: GeoCoordinate,
        destination: GeoCoordinate,
        day: &str,
    ) -> Result<Vec<AvoidArea>, AnalyzerError> {
        let (day, threshold) = classify::threshold(&self.config.thresholds, day)?;
        source.validate()?;
        destination.validate()?;

        let query = bounds::query_bounds(
            source,
            destination,
            self.config.cell_size,
            self.config.biased_boxes,
        );

        let records = self
            .store
            .fetch_cell_counts(&query, day)
            .await
            .map_err(AnalyzerError::Storage)?;

        let cells = records
            .iter()
            .map(record_to_cell)
            .collect::<Result<Vec<_>, _>>()?;

        let active = classify::activate(&cells, threshold);

        log::debug!(
            "{} of {} cells meet the {day} threshold of {threshold}",
            active.len(),
            cells.len()
        );

        if active.is_empty() {
            return Ok(vec![]);
        }

        let areas = if self.config.consolidate {
            self.consolidated_areas(&query, &active)?
        } else {
            active.iter().map(CrimeCell::to_avoid_area).collect()
        };

        Ok(classify::rank(areas, self.config.max_areas))
    }

    /// Lays `active` onto a grid over `query` and merges adjacent cells.
    ///
    /// Active cells that do not sit on the grid lattice are kept as
    /// single-cell areas.
    fn consolidated_areas(
        &self,
        query: &GeoRectangle,
        active: &[CrimeCell],
    ) -> Result<Vec<AvoidArea>, AnalyzerError> {
        let mut builder =
            GridBuilder::new(self.config.cell_size)?.with_max_cells(self.config.max_grid_cells);
        if let Some(origin) = self.config.grid_origin {
            builder = builder.with_anchor(origin);
        }

        let grid = builder.build(query)?;
        let mut density = grid.classify(active);
        let zones = consolidate(&mut density);

        let mut areas: Vec<AvoidArea> = zones.into_iter().map(AvoidArea::from).collect();

        let unaligned: Vec<AvoidArea> = active
            .iter()
            .filter(|cell| !grid.cells().contains(cell.bounds()))
            .map(CrimeCell::to_avoid_area)
            .collect();

        if !unaligned.is_empty() {
            log::warn!(
                "{} active cells are off the grid lattice; keeping them unmerged",
                unaligned.len()
            );
            areas.extend(unaligned);
        }

        Ok(areas)
    }
}

/// Validates a stored record and turns it into an inactive counted cell.
fn record_to_cell(record: &CellCrimeRecord) -> Result<CrimeCell, AnalyzerError> {
    let bounds = record
        .to_rectangle()
        .map_err(|e| AnalyzerError::MalformedCellData {
            message: e.to_string(),
        })?;

    #[allow(clippy::cast_precision_loss)]
    let count = record.number_of_crimes as f64;

    Ok(CrimeCell::with_count(bounds, count))
}
