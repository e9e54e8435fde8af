//! Query-box derivation for a source/destination pair.

use safe_maps_geo_models::{GeoCoordinate, GeoRectangle};

/// The rectangle whose crime cells are considered for a trip.
///
/// Encloses `source` and `destination`, then pads every side by
/// `(biased_boxes + 1) * cell_size` degrees so cells just off the direct
/// line are still candidates. Corners are rounded to grid precision.
#[must_use]
pub fn query_bounds(
    source: GeoCoordinate,
    destination: GeoCoordinate,
    cell_size: f64,
    biased_boxes: u32,
) -> GeoRectangle {
    let margin = f64::from(biased_boxes.saturating_add(1)) * cell_size;
    let padded = GeoRectangle::new(source, destination).padded(margin);
    GeoRectangle::new(padded.top_left().rounded(), padded.bottom_right().rounded())
}
