use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An sRGB color with straight alpha, serialized as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Rgba {
  pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
  pub const GRAY: Rgba = Rgba::rgb(128, 128, 128);
  pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  #[must_use]
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self::new(r, g, b, 255)
  }

  /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and a few color names.
  #[must_use]
  pub fn parse(color_str: &str) -> Option<Self> {
    let color_str = color_str.trim();

    if let Some(hex) = color_str.strip_prefix('#') {
      return Self::parse_hex(hex);
    }

    if let Some(args) = color_str
      .strip_prefix("rgba(")
      .or_else(|| color_str.strip_prefix("rgb("))
      .and_then(|rest| rest.strip_suffix(')'))
    {
      return Self::parse_functional(args);
    }

    match color_str.to_lowercase().as_str() {
      "transparent" => Some(Self::TRANSPARENT),
      "gray" | "grey" => Some(Self::GRAY),
      "white" => Some(Self::WHITE),
      "black" => Some(Self::rgb(0, 0, 0)),
      _ => None,
    }
  }

  fn parse_hex(hex: &str) -> Option<Self> {
    if !hex.is_ascii() {
      return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
      3 => Some(Self::rgb(
        channel(&hex[0..1].repeat(2))?,
        channel(&hex[1..2].repeat(2))?,
        channel(&hex[2..3].repeat(2))?,
      )),
      6 => Some(Self::rgb(
        channel(&hex[0..2])?,
        channel(&hex[2..4])?,
        channel(&hex[4..6])?,
      )),
      8 => Some(Self::new(
        channel(&hex[0..2])?,
        channel(&hex[2..4])?,
        channel(&hex[4..6])?,
        channel(&hex[6..8])?,
      )),
      _ => None,
    }
  }

  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  fn parse_functional(args: &str) -> Option<Self> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if !(3..=4).contains(&parts.len()) {
      return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = match parts.get(3) {
      Some(alpha) => (alpha.parse::<f32>().ok()?.clamp(0., 1.) * 255.).round() as u8,
      None => 255,
    };
    Some(Self::new(r, g, b, a))
  }

  /// Converts to a render color, multiplying the alpha channel by `opacity`.
  #[must_use]
  pub fn to_color(self, opacity: f32) -> tiny_skia::Color {
    let alpha = f32::from(self.a) / 255. * opacity.clamp(0., 1.);
    tiny_skia::Color::from_rgba(
      f32::from(self.r) / 255.,
      f32::from(self.g) / 255.,
      f32::from(self.b) / 255.,
      alpha,
    )
    .unwrap_or(tiny_skia::Color::TRANSPARENT)
  }

  /// Linear interpolation between two colors, `t` in `[0, 1]`.
  #[must_use]
  #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
  pub fn lerp(self, other: Self, t: f32) -> Self {
    let t = t.clamp(0., 1.);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Self::new(
      mix(self.r, other.r),
      mix(self.g, other.g),
      mix(self.b, other.b),
      mix(self.a, other.a),
    )
  }
}

impl Display for Rgba {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.a == 255 {
      write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    } else {
      write!(
        f,
        "#{:02x}{:02x}{:02x}{:02x}",
        self.r, self.g, self.b, self.a
      )
    }
  }
}

impl Serialize for Rgba {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Rgba {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
  }
}

/// Looks up the color at `t` in a list of ascending `(stop, color)` pairs.
#[must_use]
pub fn gradient_at(stops: &[(f32, Rgba)], t: f32) -> Rgba {
  let Some(&(first_stop, first_color)) = stops.first() else {
    return Rgba::TRANSPARENT;
  };
  if t <= first_stop {
    return first_color;
  }
  for pair in stops.windows(2) {
    let (lo, lo_color) = pair[0];
    let (hi, hi_color) = pair[1];
    if t <= hi {
      let span = hi - lo;
      let local = if span > 0. { (t - lo) / span } else { 1. };
      return lo_color.lerp(hi_color, local);
    }
  }
  stops.last().map_or(first_color, |&(_, c)| c)
}
