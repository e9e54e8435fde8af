//! Analyzer settings loaded from TOML.
//!
//! The default configuration is baked into the binary from
//! `config/analyzer.toml`. Setting `SAFE_MAPS_CONFIG` to a file path
//! replaces it at runtime. Keys missing from a replacement file fall back to
//! the built-in defaults.

use std::path::{Path, PathBuf};

use safe_maps_crime_models::ThresholdTable;
use safe_maps_geo_models::GeoCoordinate;
use safe_maps_grid::GridBuilder;
use safe_maps_grid::builder::DEFAULT_MAX_CELLS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::DEFAULT_MAX_AREAS;

/// Environment variable naming a replacement config file.
pub const CONFIG_PATH_ENV: &str = "SAFE_MAPS_CONFIG";

/// Default config embedded at compile time.
const EMBEDDED_CONFIG: &str = include_str!("../config/analyzer.toml");

/// Errors that can occur while loading analyzer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid TOML or does not match the expected shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but holds unusable values.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Tunables for [`crate::CrimeAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Cell edge length in degrees.
    pub cell_size: f64,
    /// Cells of padding added around the source/destination box.
    pub biased_boxes: u32,
    /// Maximum number of avoid-areas returned.
    pub max_areas: usize,
    /// Whether adjacent dangerous cells are merged into larger zones.
    pub consolidate: bool,
    /// North-west corner of the stored lattice. Per-request grids snap to
    /// it so their cells line up exactly with stored cells.
    pub grid_origin: Option<GeoCoordinate>,
    /// Upper bound on cells in a per-request grid.
    pub max_grid_cells: usize,
    /// Per-weekday activation thresholds.
    pub thresholds: ThresholdTable,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cell_size: 0.0018,
            biased_boxes: 4,
            max_areas: DEFAULT_MAX_AREAS,
            consolidate: true,
            grid_origin: Some(GeoCoordinate::new(40.889_096, -74.039_831)),
            max_grid_cells: DEFAULT_MAX_CELLS,
            thresholds: ThresholdTable::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown weekday
    /// keys, and [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configuration embedded in the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed, which the tests rule out.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded analyzer.toml: {e}"))
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by `SAFE_MAPS_CONFIG`, or the embedded config
    /// when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the named file cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                log::info!("Loading analyzer config from {path}");
                Self::from_path(Path::new(path.trim()))
            }
            _ => Ok(Self::embedded()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        GridBuilder::new(self.cell_size).map_err(|e| ConfigError::Invalid {
            message: format!("cell_size: {e}"),
        })?;
        if self.max_grid_cells == 0 {
            return Err(ConfigError::Invalid {
                message: "max_grid_cells must be at least 1".to_string(),
            });
        }
        if let Some(origin) = &self.grid_origin {
            origin.validate().map_err(|e| ConfigError::Invalid {
                message: format!("grid_origin: {e}"),
            })?;
        }
        Ok(())
    }
}
