#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the safe maps crime grid.
//!
//! ```text
//! safe_maps_cli migrate
//! safe_maps_cli stats
//! safe_maps_cli areas --source 40.70,-74.00 --destination 40.71,-73.99 [--day monday] [--json]
//! safe_maps_cli route --source 40.70,-74.00 --destination 40.71,-73.99
//! safe_maps_cli serve
//! ```

use std::sync::Arc;

use chrono::Datelike as _;
use clap::{Parser, Subcommand};
use safe_maps_analyzer::{AnalyzerConfig, ConfigError, CrimeAnalyzer};
use safe_maps_crime_models::{AvoidArea, DayOfWeek};
use safe_maps_database::{DatabaseCrimeStore, db, queries, run_migrations};
use safe_maps_geo_models::GeoCoordinate;
use safe_maps_routing::RoutingClient;
use safe_maps_server_models::{ApiAreaToAvoid, ApiCoordinate, ApiRouteResponse};

#[derive(Parser)]
#[command(
    name = "safe_maps_cli",
    about = "Inspect crime grids and compute safe bicycle routes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Show how many cells each weekday table holds
    Stats,
    /// Print the areas to avoid between two points
    Areas {
        #[command(flatten)]
        trip: TripArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Fetch a route that avoids high-crime areas, printed as JSON
    Route {
        #[command(flatten)]
        trip: TripArgs,
    },
    /// Start the API server
    Serve,
}

#[derive(clap::Args)]
struct TripArgs {
    /// Start point as `LAT,LON`
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    source: GeoCoordinate,
    /// End point as `LAT,LON`
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    destination: GeoCoordinate,
    /// Day whose threshold applies (defaults to today, UTC)
    #[arg(long)]
    day: Option<String>,
}

impl TripArgs {
    fn day(&self) -> String {
        self.day
            .clone()
            .unwrap_or_else(|| DayOfWeek::from(chrono::Utc::now().weekday()).to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The server sets up its own logger.
    if !matches!(cli.command, Commands::Serve) {
        pretty_env_logger::init();
    }

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so it runs on a blocking
            // thread to avoid nesting runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(safe_maps_server::run_server())
            })
            .await??;
        }
        Commands::Migrate => {
            let db = db::connect_from_env().await?;
            run_migrations(db.as_ref()).await?;
            println!("Migrations applied.");
        }
        Commands::Stats => {
            let db = db::connect_from_env().await?;
            println!("{:<16} CELLS", "TABLE");
            for day in DayOfWeek::all() {
                let count = queries::count_cells(db.as_ref(), *day).await?;
                println!("{:<16} {count}", queries::grid_table(*day));
            }
        }
        Commands::Areas { trip, json } => {
            let store = DatabaseCrimeStore::new(Arc::from(db::connect_from_env().await?));
            let analyzer = analyzer(store)?;
            let areas = analyzer
                .get_areas_to_avoid(trip.source, trip.destination, &trip.day())
                .await?;

            if json {
                let api: Vec<ApiAreaToAvoid> = areas.iter().map(ApiAreaToAvoid::from).collect();
                println!("{}", serde_json::to_string_pretty(&api)?);
            } else if areas.is_empty() {
                println!("No areas to avoid.");
            } else {
                print_areas(&areas);
            }
        }
        Commands::Route { trip } => {
            let routing = RoutingClient::from_env()?;
            let store = DatabaseCrimeStore::new(Arc::from(db::connect_from_env().await?));
            let analyzer = analyzer(store)?;

            let areas = analyzer
                .get_areas_to_avoid(trip.source, trip.destination, &trip.day())
                .await?;
            let route = routing
                .get_route(trip.source, trip.destination, &areas)
                .await?;

            let response = ApiRouteResponse {
                areas_to_avoid: areas.iter().map(ApiAreaToAvoid::from).collect(),
                route_coordinates: route.into_iter().map(ApiCoordinate::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn analyzer(store: DatabaseCrimeStore) -> Result<CrimeAnalyzer, ConfigError> {
    let config = AnalyzerConfig::from_env()?;
    Ok(CrimeAnalyzer::new(Arc::new(store), config))
}

fn print_areas(areas: &[AvoidArea]) {
    println!(
        "{:<4} {:<26} {:<26} {:>10} {:>6}",
        "#", "TOP LEFT", "BOTTOM RIGHT", "CRIMES", "CELLS"
    );
    for (i, area) in areas.iter().enumerate() {
        let tl = area.top_left();
        let br = area.bottom_right();
        println!(
            "{:<4} {:<26} {:<26} {:>10.1} {:>6}",
            i + 1,
            format!("{:.6},{:.6}", tl.latitude, tl.longitude),
            format!("{:.6},{:.6}", br.latitude, br.longitude),
            area.crime_count,
            area.cell_count
        );
    }
}

/// Parses `LAT,LON` into a validated coordinate.
fn parse_coordinate(s: &str) -> Result<GeoCoordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{s}'"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;

    let coordinate = GeoCoordinate::new(latitude, longitude);
    coordinate.validate().map_err(|e| e.to_string())?;
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(
            parse_coordinate("40.70,-74.00").unwrap(),
            GeoCoordinate::new(40.7, -74.0)
        );
        assert_eq!(
            parse_coordinate(" 52.5 , 13.4 ").unwrap(),
            GeoCoordinate::new(52.5, 13.4)
        );
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(parse_coordinate("40.7").is_err());
        assert!(parse_coordinate("north,-74").is_err());
        assert!(parse_coordinate("91,0").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }
}
