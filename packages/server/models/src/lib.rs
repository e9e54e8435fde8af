#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safe maps server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine types so the API contract can evolve independently.

use safe_maps_crime_models::AvoidArea;
use safe_maps_geo_models::GeoCoordinate;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair as sent and received by the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCoordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<GeoCoordinate> for ApiCoordinate {
    fn from(c: GeoCoordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl From<ApiCoordinate> for GeoCoordinate {
    fn from(c: ApiCoordinate) -> Self {
        Self::new(c.latitude, c.longitude)
    }
}

/// Body of `POST /api/route`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRouteRequest {
    /// Trip start.
    pub source: ApiCoordinate,
    /// Trip end.
    pub destination: ApiCoordinate,
}

/// One rectangle the route was asked to avoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAreaToAvoid {
    /// North-west corner.
    pub top_left: ApiCoordinate,
    /// South-east corner.
    pub bottom_right: ApiCoordinate,
    /// Crime count (mean over the area's cells when merged).
    pub crime_count: f64,
}

impl From<&AvoidArea> for ApiAreaToAvoid {
    fn from(area: &AvoidArea) -> Self {
        Self {
            top_left: area.top_left().into(),
            bottom_right: area.bottom_right().into(),
            crime_count: area.crime_count,
        }
    }
}

/// Response of `POST /api/route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRouteResponse {
    /// Areas passed to the router, densest first.
    pub areas_to_avoid: Vec<ApiAreaToAvoid>,
    /// Route shape from source to destination.
    pub route_coordinates: Vec<ApiCoordinate>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use safe_maps_geo_models::GeoRectangle;

    use super::*;

    #[test]
    fn parses_route_request_body() {
        let req: ApiRouteRequest = serde_json::from_str(
            r#"{"source":{"latitude":52.5,"longitude":13.4},"destination":{"latitude":52.5,"longitude":13.45}}"#,
        )
        .unwrap();
        assert_eq!(GeoCoordinate::from(req.destination), GeoCoordinate::new(52.5, 13.45));
    }

    #[test]
    fn serializes_route_response_in_camel_case() {
        let area = AvoidArea {
            bounds: GeoRectangle::new(
                GeoCoordinate::new(40.7, -74.0),
                GeoCoordinate::new(40.6982, -73.9964),
            ),
            crime_count: 155.0,
            cell_count: 2,
        };
        let response = ApiRouteResponse {
            areas_to_avoid: vec![ApiAreaToAvoid::from(&area)],
            route_coordinates: vec![GeoCoordinate::new(40.7, -74.0).into()],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["areasToAvoid"][0]["topLeft"]["latitude"], 40.7);
        assert_eq!(json["areasToAvoid"][0]["bottomRight"]["longitude"], -73.9964);
        assert_eq!(json["areasToAvoid"][0]["crimeCount"], 155.0);
        assert_eq!(json["routeCoordinates"][0]["longitude"], -74.0);
    }
}
