//! Threshold lookup, activation, and ranking of crime cells.

use safe_maps_crime_models::{CrimeDensity, DayOfWeek, ThresholdTable};
use safe_maps_grid::CrimeCell;

use crate::AnalyzerError;

/// Default cap on the number of avoid-areas returned.
pub const DEFAULT_MAX_AREAS: usize = 20;

/// Resolves `day` to a weekday and its activation threshold.
///
/// Day names are matched case-insensitively (`monday`, `Sunday`, `all`).
///
/// # Errors
///
/// Returns [`AnalyzerError::InvalidDay`] if `day` is not a weekday name or
/// the table has no entry for it.
pub fn threshold(table: &ThresholdTable, day: &str) -> Result<(DayOfWeek, u32), AnalyzerError> {
    let invalid = || AnalyzerError::InvalidDay {
        day: day.to_string(),
    };

    let parsed: DayOfWeek = day
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| invalid())?;

    let threshold = table.get(parsed).ok_or_else(invalid)?;

    Ok((parsed, threshold))
}

/// Keeps the cells whose crime count is at least `threshold`, marked
/// active.
#[must_use]
pub fn activate(cells: &[CrimeCell], threshold: u32) -> Vec<CrimeCell> {
    let threshold = f64::from(threshold);
    cells
        .iter()
        .filter(|cell| cell.crime_count() >= threshold)
        .map(|cell| cell.activated())
        .collect()
}

/// Orders `items` by descending crime count and keeps the first `limit`.
///
/// The sort is stable, so items with equal counts keep their input order.
#[must_use]
pub fn rank<T: CrimeDensity>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.sort_by(|a, b| b.crime_count().total_cmp(&a.crime_count()));
    items.truncate(limit);
    items
}
