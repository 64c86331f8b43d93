mod boxes;
mod coords;

/// Bounding boxes and viewport bounds.
pub use boxes::*;
/// Longitude normalization and the map projection.
pub use coords::*;

/// A geographic coordinate: `x` is the longitude, `y` the latitude, both in degrees.
pub type Coord = geo_types::Coord<f64>;

/// Creates a coordinate from a longitude/latitude pair.
#[must_use]
pub fn lng_lat(lng: f64, lat: f64) -> Coord {
  Coord { x: lng, y: lat }
}
