use std::f64::consts::PI;

use super::Coord;

/// Moves western longitudes past the antimeridian so that regions crossing 180° stay
/// contiguous: every negative longitude is shifted by a full turn.
#[must_use]
pub fn normalize_lng(lng: f64) -> f64 {
  if lng < 0. { lng + 360. } else { lng }
}

/// Inverse of [`normalize_lng`] for displaying raw longitudes. Never used for rendering,
/// the renderer works in the shifted domain.
#[must_use]
pub fn fix_lng_back(lng: f64) -> f64 {
  if lng > 180. { lng - 360. } else { lng }
}

/// Normalizes the longitude of a single pair, the latitude passes through.
#[must_use]
pub fn normalize_coord(coord: Coord) -> Coord {
  Coord {
    x: normalize_lng(coord.x),
    y: coord.y,
  }
}

/// A position in the unit square of the Web Mercator projection.
///
/// Longitudes in the shifted domain map past `x = 1`, which is fine as long as the viewport
/// is built from the same domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorCoordinate {
  pub x: f64,
  pub y: f64,
}

impl From<Coord> for MercatorCoordinate {
  fn from(coord: Coord) -> Self {
    let lat = coord.y.to_radians();
    Self {
      x: (coord.x + 180.) / 360.,
      y: (1. - (lat.tan() + 1. / lat.cos()).ln() / PI) / 2.,
    }
  }
}
