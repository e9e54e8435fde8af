#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fixed-size lat/long cell grids and maximal-rectangle consolidation.
//!
//! [`GridBuilder`] slides a one-cell window across a bounding rectangle to
//! produce a dense, row-major [`Grid`]. Matching crime-count cells onto
//! that grid yields a [`DensityGrid`], which [`consolidate`] repeatedly
//! carves into the largest all-active rectangular blocks.
//!
//! All coordinates are rounded to eight decimals after every translation
//! step so that long runs of additions do not drift away from the lattice
//! the stored crime tables were generated on.

pub mod builder;
pub mod cell;
pub mod consolidate;

pub use builder::{Grid, GridBuilder};
pub use cell::{CrimeCell, DensityGrid};
pub use consolidate::{ConsolidatedZone, GridSpan, consolidate};

use thiserror::Error;

/// Errors that can occur while building a grid.
#[derive(Debug, Error)]
pub enum GridError {
    /// Cell size is not finite, too small, or finer than grid precision.
    #[error("Invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// The bounding rectangle has no area at grid precision.
    #[error("Degenerate grid bounds: {message}")]
    DegenerateBounds {
        /// Description of what went wrong.
        message: String,
    },

    /// The bounding rectangle would produce more cells than allowed.
    #[error("Grid of {rows}x{cols} cells exceeds the limit of {max_cells}")]
    TooLarge {
        /// Estimated row count.
        rows: usize,
        /// Estimated column count.
        cols: usize,
        /// Configured cell limit.
        max_cells: usize,
    },

    /// Cell arena length does not match the requested shape.
    #[error("Expected {expected} cells for grid shape, got {actual}")]
    ShapeMismatch {
        /// `rows * cols`.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}
