//! [`CrimeCountStore`] backed by the crime grid tables.

use std::sync::Arc;

use safe_maps_analyzer::{CrimeCountStore, StoreError};
use safe_maps_crime_models::{CellCrimeRecord, DayOfWeek};
use safe_maps_geo_models::GeoRectangle;
use switchy_database::Database;

use crate::queries;

/// Reads per-weekday cell counts from the database.
#[derive(Clone)]
pub struct DatabaseCrimeStore {
    db: Arc<dyn Database>,
}

impl std::fmt::Debug for DatabaseCrimeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCrimeStore").finish_non_exhaustive()
    }
}

impl DatabaseCrimeStore {
    /// Wraps a shared database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl CrimeCountStore for DatabaseCrimeStore {
    async fn fetch_cell_counts(
        &self,
        bounds: &GeoRectangle,
        day: DayOfWeek,
    ) -> Result<Vec<CellCrimeRecord>, StoreError> {
        Ok(queries::get_cell_counts(self.db.as_ref(), bounds, day).await?)
    }
}
