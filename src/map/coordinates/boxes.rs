use serde::{Deserialize, Serialize};

use super::{Coord, lng_lat};

/// Axis aligned box over longitude/latitude degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  min_lng: f64,
  max_lng: f64,
  min_lat: f64,
  max_lat: f64,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::new()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn new() -> Self {
    Self::get_invalid()
  }

  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      min_lng: f64::MAX,
      max_lng: f64::MIN,
      min_lat: f64::MAX,
      max_lat: f64::MIN,
    }
  }

  pub fn from_iterator<I: IntoIterator<Item = Coord>>(coords: I) -> Self {
    let mut bb = Self::get_invalid();
    coords.into_iter().for_each(|c| bb.add_coordinate(c));
    bb
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.min_lng <= self.max_lng && self.min_lat <= self.max_lat
  }

  pub fn add_coordinate(&mut self, coord: Coord) {
    self.min_lng = self.min_lng.min(coord.x);
    self.max_lng = self.max_lng.max(coord.x);
    self.min_lat = self.min_lat.min(coord.y);
    self.max_lat = self.max_lat.max(coord.y);
  }

  #[must_use]
  pub fn extend(self, bb: &Self) -> Self {
    if !self.is_valid() {
      return *bb;
    }

    if !bb.is_valid() {
      return self;
    }

    Self {
      min_lng: self.min_lng.min(bb.min_lng),
      max_lng: self.max_lng.max(bb.max_lng),
      min_lat: self.min_lat.min(bb.min_lat),
      max_lat: self.max_lat.max(bb.max_lat),
    }
  }

  /// Center of the box, the anchor used for a region's heat point.
  #[must_use]
  pub fn center(&self) -> Coord {
    lng_lat(
      f64::midpoint(self.min_lng, self.max_lng),
      f64::midpoint(self.min_lat, self.max_lat),
    )
  }

  #[must_use]
  pub fn min(&self) -> Coord {
    lng_lat(self.min_lng, self.min_lat)
  }

  #[must_use]
  pub fn max(&self) -> Coord {
    lng_lat(self.max_lng, self.max_lat)
  }

  /// Grows the box by `frame` degrees on every side.
  pub fn frame(&mut self, frame: f64) {
    self.min_lng -= frame;
    self.min_lat -= frame;
    self.max_lng += frame;
    self.max_lat += frame;
  }
}

/// Viewport bounds in the normalized longitude domain, `[south, west]` to `[north, east]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
  pub south_west: [f64; 2],
  pub north_east: [f64; 2],
}

impl Default for LatLngBounds {
  /// Wide enough in both directions for regions that were shifted past the antimeridian.
  fn default() -> Self {
    Self {
      south_west: [-75., -210.],
      north_east: [82., 210.],
    }
  }
}

impl LatLngBounds {
  #[must_use]
  pub fn south(&self) -> f64 {
    self.south_west[0]
  }

  #[must_use]
  pub fn west(&self) -> f64 {
    self.south_west[1]
  }

  #[must_use]
  pub fn north(&self) -> f64 {
    self.north_east[0]
  }

  #[must_use]
  pub fn east(&self) -> f64 {
    self.north_east[1]
  }

  #[must_use]
  pub fn from_box(bb: &BoundingBox) -> Self {
    Self {
      south_west: [bb.min_lat, bb.min_lng],
      north_east: [bb.max_lat, bb.max_lng],
    }
  }

  /// Shrinks `self` so it lies within `outer`.
  #[must_use]
  pub fn clamped_to(&self, outer: &Self) -> Self {
    Self {
      south_west: [
        self.south().clamp(outer.south(), outer.north()),
        self.west().clamp(outer.west(), outer.east()),
      ],
      north_east: [
        self.north().clamp(outer.south(), outer.north()),
        self.east().clamp(outer.west(), outer.east()),
      ],
    }
  }

  #[must_use]
  pub fn contains(&self, coord: Coord) -> bool {
    (self.south()..=self.north()).contains(&coord.y) && (self.west()..=self.east()).contains(&coord.x)
  }
}
