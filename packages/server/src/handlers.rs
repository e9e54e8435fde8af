//! HTTP handler functions for the safe maps API.

use actix_web::{HttpResponse, web};
use chrono::Datelike as _;
use safe_maps_analyzer::AnalyzerError;
use safe_maps_crime_models::DayOfWeek;
use safe_maps_geo_models::GeoCoordinate;
use safe_maps_server_models::{
    ApiAreaToAvoid, ApiCoordinate, ApiError, ApiHealth, ApiRouteRequest, ApiRouteResponse,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/route`
///
/// Computes avoid-areas for the current UTC weekday and returns the
/// bicycle route around them.
pub async fn route(state: web::Data<AppState>, body: web::Json<ApiRouteRequest>) -> HttpResponse {
    let source = GeoCoordinate::from(body.source);
    let destination = GeoCoordinate::from(body.destination);

    for (name, point) in [("source", source), ("destination", destination)] {
        if let Err(e) = point.validate() {
            return error_response(
                HttpResponse::BadRequest(),
                format!("Invalid {name}: {e}"),
            );
        }
    }

    let day = DayOfWeek::from(chrono::Utc::now().weekday()).to_string();

    let areas = match state
        .analyzer
        .get_areas_to_avoid(source, destination, &day)
        .await
    {
        Ok(areas) => areas,
        Err(e @ (AnalyzerError::InvalidDay { .. } | AnalyzerError::InvalidCoordinate(_))) => {
            return error_response(HttpResponse::BadRequest(), e.to_string());
        }
        Err(e) => {
            log::error!("Failed to compute areas to avoid: {e}");
            return error_response(
                HttpResponse::InternalServerError(),
                "Failed to compute areas to avoid".to_string(),
            );
        }
    };

    let route = match state.routing.get_route(source, destination, &areas).await {
        Ok(route) => route,
        Err(e) => {
            log::error!("Failed to fetch route: {e}");
            return error_response(
                HttpResponse::BadGateway(),
                "Failed to fetch route".to_string(),
            );
        }
    };

    HttpResponse::Ok().json(ApiRouteResponse {
        areas_to_avoid: areas.iter().map(ApiAreaToAvoid::from).collect(),
        route_coordinates: route.into_iter().map(ApiCoordinate::from).collect(),
    })
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, error: String) -> HttpResponse {
    builder.json(ApiError { error })
}
