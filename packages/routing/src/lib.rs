#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the HERE routing API.
//!
//! Requests the fastest bicycle route between two points, passing the
//! analyzer's avoid-areas as `avoidareas` rectangles, and decodes the
//! route's shape into coordinates.

use std::fmt::Write as _;

use safe_maps_crime_models::AvoidArea;
use safe_maps_geo_models::GeoCoordinate;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the HERE API key.
pub const API_KEY_ENV: &str = "SAFE_MAPS_API_KEY";

/// Environment variable overriding the routing endpoint.
pub const ROUTING_URL_ENV: &str = "SAFE_MAPS_ROUTING_URL";

/// HERE routing v7.2 `calculateroute` endpoint.
pub const DEFAULT_ROUTING_URL: &str =
    "https://route.ls.hereapi.com/routing/7.2/calculateroute.json";

/// Routing mode sent with every request.
const ROUTING_MODE: &str = "fastest;bicycle;traffic:disabled";

/// Errors that can occur while fetching a route.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing API answered with a non-success status.
    #[error("Routing API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response body is not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response contained no route or leg.
    #[error("Routing API returned no route")]
    NoRoute,

    /// A shape point is not a `"lat,lon"` pair.
    #[error("Invalid shape point: {point}")]
    Shape {
        /// The point as received.
        point: String,
    },

    /// The client is not configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

#[derive(Deserialize)]
struct CalculateRouteResponse {
    response: RouteResponse,
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    route: Vec<Route>,
}

#[derive(Deserialize)]
struct Route {
    #[serde(default)]
    leg: Vec<Leg>,
}

#[derive(Deserialize)]
struct Leg {
    #[serde(default)]
    shape: Vec<String>,
}

/// HERE routing API client.
pub struct RoutingClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for RoutingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RoutingClient {
    /// Creates a client for the default HERE endpoint.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_ROUTING_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates a client from `SAFE_MAPS_API_KEY`, honoring
    /// `SAFE_MAPS_ROUTING_URL` when set.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Config`] if the API key is unset or empty.
    pub fn from_env() -> Result<Self, RoutingError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RoutingError::Config {
                message: format!("{API_KEY_ENV} is not set"),
            })?;

        let client = Self::new(api_key);
        Ok(match std::env::var(ROUTING_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url.trim()),
            _ => client,
        })
    }

    /// Points the client at a different `calculateroute` endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the route from `source` to `destination` that avoids
    /// `areas`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the request fails, the API rejects it,
    /// or the response cannot be decoded.
    pub async fn get_route(
        &self,
        source: GeoCoordinate,
        destination: GeoCoordinate,
        areas: &[AvoidArea],
    ) -> Result<Vec<GeoCoordinate>, RoutingError> {
        let url = build_route_url(&self.base_url, &self.api_key, source, destination, areas);

        log::debug!("Requesting route avoiding {} areas", areas.len());

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let shape = parse_route_shape(&body)?;
        log::debug!("Route has {} shape points", shape.len());
        Ok(shape)
    }
}

/// Builds the `calculateroute` request URL.
///
/// `avoidareas` is only added when `areas` is non-empty. Each rectangle is
/// written as `top,left;bottom,right` and rectangles are joined by `!`.
#[must_use]
pub fn build_route_url(
    base_url: &str,
    api_key: &str,
    source: GeoCoordinate,
    destination: GeoCoordinate,
    areas: &[AvoidArea],
) -> String {
    let mut url = format!(
        "{base_url}?apiKey={api_key}&waypoint0=geo!{},{}&waypoint1=geo!{},{}&mode={ROUTING_MODE}&legAttributes=shape",
        source.latitude, source.longitude, destination.latitude, destination.longitude,
    );

    if !areas.is_empty() {
        url.push_str("&avoidareas=");
        for (i, area) in areas.iter().enumerate() {
            if i > 0 {
                url.push('!');
            }
            let tl = area.top_left();
            let br = area.bottom_right();
            let _ = write!(
                url,
                "{},{};{},{}",
                tl.latitude, tl.longitude, br.latitude, br.longitude
            );
        }
    }

    url
}

/// Decodes the first leg of the first route into coordinates.
///
/// # Errors
///
/// Returns [`RoutingError::Json`] on an unexpected body,
/// [`RoutingError::NoRoute`] if there is no route or leg, and
/// [`RoutingError::Shape`] on an unparseable point.
pub fn parse_route_shape(body: &str) -> Result<Vec<GeoCoordinate>, RoutingError> {
    let parsed: CalculateRouteResponse = serde_json::from_str(body)?;

    let leg = parsed
        .response
        .route
        .into_iter()
        .next()
        .and_then(|route| route.leg.into_iter().next())
        .ok_or(RoutingError::NoRoute)?;

    leg.shape
        .iter()
        .map(String::as_str)
        .map(parse_shape_point)
        .collect()
}

fn parse_shape_point(point: &str) -> Result<GeoCoordinate, RoutingError> {
    let invalid = || RoutingError::Shape {
        point: point.to_string(),
    };

    let (lat, lon) = point.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = lon.trim().parse().map_err(|_| invalid())?;

    let coordinate = GeoCoordinate::new(latitude, longitude);
    coordinate.validate().map_err(|_| invalid())?;
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use safe_maps_geo_models::GeoRectangle;

    use super::*;

    fn area(top: f64, left: f64, bottom: f64, right: f64) -> AvoidArea {
        AvoidArea {
            bounds: GeoRectangle::new(
                GeoCoordinate::new(top, left),
                GeoCoordinate::new(bottom, right),
            ),
            crime_count: 150.0,
            cell_count: 1,
        }
    }

    #[test]
    fn omits_avoidareas_when_there_are_none() {
        let url = build_route_url(
            DEFAULT_ROUTING_URL,
            "key",
            GeoCoordinate::new(52.5, 13.4),
            GeoCoordinate::new(52.5, 13.45),
            &[],
        );
        assert_eq!(
            url,
            "https://route.ls.hereapi.com/routing/7.2/calculateroute.json?apiKey=key\
             &waypoint0=geo!52.5,13.4&waypoint1=geo!52.5,13.45\
             &mode=fastest;bicycle;traffic:disabled&legAttributes=shape"
        );
    }

    #[test]
    fn joins_avoidareas_with_bang() {
        let url = build_route_url(
            "http://localhost/route",
            "key",
            GeoCoordinate::new(40.7, -74.0),
            GeoCoordinate::new(40.71, -73.99),
            &[
                area(40.7082, -74.0, 40.7064, -73.9964),
                area(40.7046, -73.9982, 40.7028, -73.9964),
            ],
        );
        assert!(url.ends_with(
            "&avoidareas=40.7082,-74;40.7064,-73.9964!40.7046,-73.9982;40.7028,-73.9964"
        ));
    }

    #[test]
    fn parses_first_leg_shape() {
        let body = r#"{"response":{"route":[{"leg":[{"shape":["52.5,13.4","52.5001,13.41"]},{"shape":["0,0"]}]}]}}"#;
        let shape = parse_route_shape(body).unwrap();
        assert_eq!(
            shape,
            vec![
                GeoCoordinate::new(52.5, 13.4),
                GeoCoordinate::new(52.5001, 13.41)
            ]
        );
    }

    #[test]
    fn missing_route_is_an_error() {
        assert!(matches!(
            parse_route_shape(r#"{"response":{"route":[]}}"#),
            Err(RoutingError::NoRoute)
        ));
        assert!(matches!(
            parse_route_shape(r#"{"response":{"route":[{"leg":[]}]}}"#),
            Err(RoutingError::NoRoute)
        ));
        assert!(matches!(
            parse_route_shape("not json"),
            Err(RoutingError::Json(_))
        ));
    }

    #[test]
    fn rejects_bad_shape_points() {
        for bad in ["52.5", "north,east", "95.0,13.4"] {
            let body = format!(r#"{{"response":{{"route":[{{"leg":[{{"shape":["{bad}"]}}]}}]}}}}"#);
            assert!(
                matches!(parse_route_shape(&body), Err(RoutingError::Shape { point }) if point == bad),
                "{bad}"
            );
        }
    }
}
