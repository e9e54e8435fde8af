#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Weekday thresholds, crime-count cell records, and avoid-area types.
//!
//! Crime counts are pre-aggregated per grid cell and per weekday. This
//! crate defines the weekday keys, the per-weekday activation thresholds,
//! the typed record the storage layer hands back, and the avoid-area
//! rectangles the engine produces for the routing layer.

use std::collections::BTreeMap;

use safe_maps_geo_models::{CoordinateError, GeoCoordinate, GeoRectangle};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Weekday key for aggregated crime tables, plus the `all` aggregate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayOfWeek {
    /// Aggregate over every day of the week.
    All,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::All,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// Minimum per-cell crime count, by weekday, for a cell to be considered
/// dangerous.
///
/// Deserializes from a flat table such as `monday = 121`. Days absent from
/// the table have no threshold; lookups for them fail rather than falling
/// back to another day. Unknown day names are rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, u32>",
    into = "BTreeMap<String, u32>"
)]
pub struct ThresholdTable(BTreeMap<DayOfWeek, u32>);

impl ThresholdTable {
    /// Creates a table from explicit entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (DayOfWeek, u32)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Returns the threshold for `day`, if the table has one.
    #[must_use]
    pub fn get(&self, day: DayOfWeek) -> Option<u32> {
        self.0.get(&day).copied()
    }

    /// Returns a copy with `day` set to `threshold`.
    #[must_use]
    pub fn with_threshold(mut self, day: DayOfWeek, threshold: u32) -> Self {
        self.0.insert(day, threshold);
        self
    }
}

impl TryFrom<BTreeMap<String, u32>> for ThresholdTable {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(day, threshold)| {
                day.parse::<DayOfWeek>()
                    .map(|day| (day, threshold))
                    .map_err(|_| format!("unknown day of week '{day}' in threshold table"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl From<ThresholdTable> for BTreeMap<String, u32> {
    fn from(table: ThresholdTable) -> Self {
        table
            .0
            .into_iter()
            .map(|(day, threshold)| (day.to_string(), threshold))
            .collect()
    }
}

impl Default for ThresholdTable {
    /// Thresholds tuned against NYC weekday aggregates at a `0.0018`
    /// degree cell size.
    fn default() -> Self {
        Self::new([
            (DayOfWeek::All, 911),
            (DayOfWeek::Monday, 121),
            (DayOfWeek::Tuesday, 132),
            (DayOfWeek::Wednesday, 137),
            (DayOfWeek::Thursday, 139),
            (DayOfWeek::Friday, 150),
            (DayOfWeek::Saturday, 138),
            (DayOfWeek::Sunday, 117),
        ])
    }
}

/// One pre-aggregated grid cell as returned by the crime count store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellCrimeRecord {
    /// North-west corner of the cell.
    pub upper_left: GeoCoordinate,
    /// South-east corner of the cell.
    pub lower_right: GeoCoordinate,
    /// Number of crimes aggregated into this cell for the weekday.
    pub number_of_crimes: i64,
}

impl CellCrimeRecord {
    /// Validates the record and returns its cell rectangle with corners
    /// rounded to the engine's coordinate precision.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRecordError`] if either corner is non-finite or
    /// out of range, or if the crime count is negative.
    pub fn to_rectangle(&self) -> Result<GeoRectangle, MalformedRecordError> {
        self.upper_left
            .validate()
            .map_err(MalformedRecordError::Coordinate)?;
        self.lower_right
            .validate()
            .map_err(MalformedRecordError::Coordinate)?;
        if self.number_of_crimes < 0 {
            return Err(MalformedRecordError::NegativeCount(self.number_of_crimes));
        }

        Ok(GeoRectangle::new(
            self.upper_left.rounded(),
            self.lower_right.rounded(),
        ))
    }
}

/// Error returned when a [`CellCrimeRecord`] cannot be used as grid data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MalformedRecordError {
    /// A corner coordinate is unusable.
    Coordinate(CoordinateError),
    /// The crime count is negative.
    NegativeCount(i64),
}

impl std::fmt::Display for MalformedRecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinate(e) => write!(f, "invalid cell corner: {e}"),
            Self::NegativeCount(count) => write!(f, "negative crime count {count}"),
        }
    }
}

impl std::error::Error for MalformedRecordError {}

/// Anything that carries a crime count and can be ranked by it.
pub trait CrimeDensity {
    /// The crime count used for ranking. Missing counts rank as zero.
    fn crime_count(&self) -> f64;
}

/// A rectangle the routing layer should route around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvoidArea {
    /// Geographic extent.
    pub bounds: GeoRectangle,
    /// Crime count for a single cell, or the mean over a consolidated zone.
    pub crime_count: f64,
    /// Number of grid cells this area covers.
    pub cell_count: usize,
}

impl AvoidArea {
    /// North-west corner, as sent to the routing API.
    #[must_use]
    pub const fn top_left(&self) -> GeoCoordinate {
        self.bounds.top_left()
    }

    /// South-east corner, as sent to the routing API.
    #[must_use]
    pub const fn bottom_right(&self) -> GeoCoordinate {
        self.bounds.bottom_right()
    }
}

impl CrimeDensity for AvoidArea {
    fn crime_count(&self) -> f64 {
        self.crime_count
    }
}
