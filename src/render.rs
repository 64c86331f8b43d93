use std::path::{Path, PathBuf};

use thiserror::Error;
use tiny_skia::Pixmap;

mod chart;
pub use chart::{RasterCharts, RasterLineChart, RasterRingChart};
mod raster;
pub use raster::{Projection, RasterSurface};

#[derive(Debug, Error)]
pub enum RenderError {
  #[error("cannot create a {width}x{height} canvas")]
  InvalidSize { width: u32, height: u32 },
  #[error("failed to encode PNG: {0}")]
  Encode(String),
  #[error("failed to write {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RenderError> {
  Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })
}

fn write_png(pixmap: &Pixmap, path: &Path) -> Result<(), RenderError> {
  let data = pixmap
    .encode_png()
    .map_err(|e| RenderError::Encode(e.to_string()))?;
  std::fs::write(path, data).map_err(|source| RenderError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn create_dir(path: &Path) -> Result<(), RenderError> {
  std::fs::create_dir_all(path).map_err(|source| RenderError::Io {
    path: path.to_path_buf(),
    source,
  })
}
