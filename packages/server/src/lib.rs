#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for safe bicycle routing.
//!
//! `POST /api/route` computes today's avoid-areas between two points and
//! asks the routing API for a bicycle route around them.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safe_maps_analyzer::{AnalyzerConfig, CrimeAnalyzer};
use safe_maps_database::{DatabaseCrimeStore, db, run_migrations};
use safe_maps_routing::RoutingClient;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Avoid-area engine over the crime grid tables.
    pub analyzer: CrimeAnalyzer,
    /// Routing API client.
    pub routing: RoutingClient,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/route", web::post().to(handlers::route)),
    );
}

/// Starts the safe maps API server.
///
/// Connects to the database, runs migrations, loads the analyzer config and
/// routing credentials, and serves the API. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if startup fails or the HTTP server
/// fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {e}")))?;

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let config = AnalyzerConfig::from_env().map_err(std::io::Error::other)?;
    let routing = RoutingClient::from_env().map_err(std::io::Error::other)?;

    let store = DatabaseCrimeStore::new(Arc::from(db_conn));
    let state = web::Data::new(AppState {
        analyzer: CrimeAnalyzer::new(Arc::new(store), config),
        routing,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
