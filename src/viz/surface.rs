use crate::{binder::RegionId, map::geometry_collection::Style};

use super::{heatmap::HeatLayer, popup::PopupView};

/// The map widget the visualizer draws on.
///
/// Every call replaces what the surface showed before for that region or layer.
pub trait MapSurface {
  fn set_style(&mut self, region: RegionId, style: Style);

  fn open_popup(&mut self, region: RegionId, popup: &PopupView);

  /// Refreshes the content of an open popup.
  fn update_popup(&mut self, region: RegionId, popup: &PopupView) {
    self.open_popup(region, popup);
  }

  fn close_popup(&mut self, region: RegionId);

  /// `None` removes the heat layer.
  fn set_heat_layer(&mut self, layer: Option<&HeatLayer>);

  fn set_year_label(&mut self, _label: &str) {}
}
