/// Threshold classification of statistic values into palette colors.
pub mod classify;
/// Colors as they appear in styles and configuration.
pub mod color;
/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// Handles geometry.
pub mod geometry_collection;
