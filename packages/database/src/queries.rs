//! Crime grid queries.
//!
//! Table names are derived from [`DayOfWeek`], never from request text, so
//! the only values bound at runtime are the query box coordinates.

use moosicbox_json_utils::database::ToValue as _;
use safe_maps_crime_models::{CellCrimeRecord, DayOfWeek};
use safe_maps_geo_models::{GeoCoordinate, GeoRectangle};
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

/// Name of the crime grid table for `day`.
#[must_use]
pub fn grid_table(day: DayOfWeek) -> String {
    format!("grid_{}", day.as_ref())
}

/// SQL selecting every cell of `day`'s table whose corners both lie inside
/// the box bound to `$1..$4` (south, north, west, east).
fn cell_counts_sql(day: DayOfWeek) -> String {
    format!(
        "SELECT upper_left_lat, upper_left_long, lower_right_lat, lower_right_long, number_of_crimes
         FROM {}
         WHERE upper_left_lat BETWEEN $1 AND $2
           AND lower_right_lat BETWEEN $1 AND $2
           AND upper_left_long BETWEEN $3 AND $4
           AND lower_right_long BETWEEN $3 AND $4",
        grid_table(day)
    )
}

/// Query parameters for [`cell_counts_sql`].
fn bounds_params(bounds: &GeoRectangle) -> [DatabaseValue; 4] {
    [
        DatabaseValue::Real64(bounds.south()),
        DatabaseValue::Real64(bounds.north()),
        DatabaseValue::Real64(bounds.west()),
        DatabaseValue::Real64(bounds.east()),
    ]
}

/// Returns the stored crime counts for every cell inside `bounds` on `day`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row has unexpected column
/// types.
pub async fn get_cell_counts(
    db: &dyn Database,
    bounds: &GeoRectangle,
    day: DayOfWeek,
) -> Result<Vec<CellCrimeRecord>, DbError> {
    let rows = db
        .query_raw_params(&cell_counts_sql(day), &bounds_params(bounds))
        .await?;

    log::debug!("Loaded {} cells from {}", rows.len(), grid_table(day));

    rows.iter().map(row_to_record).collect()
}

/// Counts the cells stored for `day`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_cells(db: &dyn Database, day: DayOfWeek) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT COUNT(*) AS cell_count FROM {}", grid_table(day)),
            &[],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(0);
    };

    row.to_value("cell_count").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse cell count for {day}: {e}"),
    })
}

fn row_to_record(row: &Row) -> Result<CellCrimeRecord, DbError> {
    let column = |name: &str| -> Result<f64, DbError> {
        row.to_value(name).map_err(|e| DbError::Conversion {
            message: format!("Failed to parse {name}: {e}"),
        })
    };

    let number_of_crimes: i32 = row
        .to_value("number_of_crimes")
        .map_err(|e| DbError::Conversion {
            message: format!("Failed to parse number_of_crimes: {e}"),
        })?;

    Ok(CellCrimeRecord {
        upper_left: GeoCoordinate::new(column("upper_left_lat")?, column("upper_left_long")?),
        lower_right: GeoCoordinate::new(column("lower_right_lat")?, column("lower_right_long")?),
        number_of_crimes: i64::from(number_of_crimes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_follow_weekdays() {
        assert_eq!(grid_table(DayOfWeek::All), "grid_all");
        assert_eq!(grid_table(DayOfWeek::Wednesday), "grid_wednesday");
        for day in DayOfWeek::all() {
            assert!(cell_counts_sql(*day).contains(&format!("FROM {}", grid_table(*day))));
        }
    }

    #[test]
    fn binds_box_edges_south_north_west_east() {
        let bounds = GeoRectangle::new(
            GeoCoordinate::new(40.719, -74.009),
            GeoCoordinate::new(40.691, -73.981),
        );
        let params = bounds_params(&bounds);
        assert!(matches!(params[0], DatabaseValue::Real64(v) if (v - 40.691).abs() < f64::EPSILON));
        assert!(matches!(params[1], DatabaseValue::Real64(v) if (v - 40.719).abs() < f64::EPSILON));
        assert!(matches!(params[2], DatabaseValue::Real64(v) if (v + 74.009).abs() < f64::EPSILON));
        assert!(matches!(params[3], DatabaseValue::Real64(v) if (v + 73.981).abs() < f64::EPSILON));
    }
}
