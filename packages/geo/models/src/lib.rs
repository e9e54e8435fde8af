#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic coordinate and lat/long rectangle types.
//!
//! A [`GeoRectangle`] is axis-aligned in latitude/longitude space. It is not
//! necessarily square in meters. Every rectangle is normalized on
//! construction so its corner names always agree with compass directions,
//! regardless of which pair of opposing points it was built from.

use serde::{Deserialize, Serialize};

/// Number of decimal places used for all coordinate rounding and
/// comparisons in the grid engine.
pub const COORDINATE_PRECISION: i32 = 8;

/// Mean equatorial radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCoordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Creates a coordinate from a latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both components are finite and within WGS84 range.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] if the latitude is outside `[-90, 90]`,
    /// the longitude is outside `[-180, 180]`, or either is NaN/infinite.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NonFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Returns this coordinate with both components rounded to
    /// [`COORDINATE_PRECISION`] decimals.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            latitude: round_to_precision(self.latitude),
            longitude: round_to_precision(self.longitude),
        }
    }
}

/// Error returned when a coordinate is not a usable WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    /// Latitude or longitude is NaN or infinite.
    NonFinite {
        /// The offending latitude.
        latitude: f64,
        /// The offending longitude.
        longitude: f64,
    },
    /// Latitude is outside `[-90, 90]`.
    LatitudeOutOfRange(f64),
    /// Longitude is outside `[-180, 180]`.
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite {
                latitude,
                longitude,
            } => write!(f, "non-finite coordinate ({latitude}, {longitude})"),
            Self::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {lat} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(lon) => {
                write!(f, "longitude {lon} is outside [-180, 180]")
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

/// Length (north-south) and width (east-west) of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// North-south extent.
    pub length: f64,
    /// East-west extent.
    pub width: f64,
}

/// A rectangle in latitude/longitude space, described by its four corners.
///
/// Rectangles carry geometry only. Crime counts and activation state live
/// on the grid cell types that wrap them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRectangle {
    top_left: GeoCoordinate,
    top_right: GeoCoordinate,
    bottom_left: GeoCoordinate,
    bottom_right: GeoCoordinate,
}

impl GeoRectangle {
    /// Builds a rectangle from any two opposing corner points.
    ///
    /// The top edge takes the larger latitude and the left edge the smaller
    /// longitude, so `new(a, b) == new(b, a)`.
    #[must_use]
    pub fn new(pi: GeoCoordinate, pj: GeoCoordinate) -> Self {
        let north = pi.latitude.max(pj.latitude);
        let south = pi.latitude.min(pj.latitude);
        let west = pi.longitude.min(pj.longitude);
        let east = pi.longitude.max(pj.longitude);

        Self {
            top_left: GeoCoordinate::new(north, west),
            top_right: GeoCoordinate::new(north, east),
            bottom_left: GeoCoordinate::new(south, west),
            bottom_right: GeoCoordinate::new(south, east),
        }
    }

    /// North-west corner.
    #[must_use]
    pub const fn top_left(&self) -> GeoCoordinate {
        self.top_left
    }

    /// North-east corner.
    #[must_use]
    pub const fn top_right(&self) -> GeoCoordinate {
        self.top_right
    }

    /// South-west corner.
    #[must_use]
    pub const fn bottom_left(&self) -> GeoCoordinate {
        self.bottom_left
    }

    /// South-east corner.
    #[must_use]
    pub const fn bottom_right(&self) -> GeoCoordinate {
        self.bottom_right
    }

    /// Northern latitude boundary.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.top_left.latitude
    }

    /// Southern latitude boundary.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.bottom_left.latitude
    }

    /// Western longitude boundary.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.top_left.longitude
    }

    /// Eastern longitude boundary.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.top_right.longitude
    }

    /// Re-derives a rectangle from this one's top-left and bottom-right
    /// corners.
    #[must_use]
    pub fn rebuild(&self) -> Self {
        Self::new(self.top_left, self.bottom_right)
    }

    /// Returns a copy padded outward by `margin` degrees on every side.
    #[must_use]
    pub fn padded(&self, margin: f64) -> Self {
        Self::new(
            GeoCoordinate::new(self.south() - margin, self.west() - margin),
            GeoCoordinate::new(self.north() + margin, self.east() + margin),
        )
    }

    /// Returns this rectangle's extent in degrees.
    ///
    /// `width` is `|west| - |east|`, a signed difference of absolute
    /// longitudes. It is positive for rectangles in the western hemisphere
    /// and negative in the eastern hemisphere, and it is meaningless across
    /// the prime meridian or antimeridian. Stored grid tables were
    /// generated against this formula.
    #[must_use]
    pub fn dimensions_in_degrees(&self) -> Dimensions {
        Dimensions {
            length: self.top_left.latitude - self.bottom_left.latitude,
            width: self.top_left.longitude.abs() - self.top_right.longitude.abs(),
        }
    }

    /// Returns this rectangle's extent in meters, rounded to centimeters.
    ///
    /// Each degree delta is measured as a haversine distance displaced
    /// from `(0, 0)` along the equator, so the result ignores the
    /// rectangle's actual latitude.
    #[must_use]
    pub fn dimensions_in_meters(&self) -> Dimensions {
        let Dimensions { length, width } = self.dimensions_in_degrees();
        Dimensions {
            length: round_to(equatorial_distance_meters(length), 2),
            width: round_to(equatorial_distance_meters(width), 2),
        }
    }
}

/// Haversine distance between `(0, 0)` and `(0, degrees)`.
fn equatorial_distance_meters(degrees: f64) -> f64 {
    haversine_meters(GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0, degrees))
}

/// Great-circle distance between two points in meters using
/// [`EARTH_RADIUS_KM`].
#[must_use]
pub fn haversine_meters(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
    let d_lat = to.latitude.to_radians() - from.latitude.to_radians();
    let d_lon = to.longitude.to_radians() - from.longitude.to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c * 1000.0
}

/// Rounds `value` to `decimals` decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds `value` to [`COORDINATE_PRECISION`] decimal places.
#[must_use]
pub fn round_to_precision(value: f64) -> f64 {
    round_to(value, COORDINATE_PRECISION)
}
