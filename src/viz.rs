use log::{debug, error};
use thiserror::Error;

use crate::{
  binder::{BoundRegion, RegionId},
  config::{Config, RenderMode, YearRange},
  map::{
    classify::Palette,
    geometry_collection::{BASE_STYLE, HIGHLIGHT_STYLE, NO_DATA_STYLE, OUTLINE_STYLE, Style},
  },
  profile_scope,
};

/// Chart widgets of open popups.
pub mod charts;
/// The weighted point layer of the heatmap mode.
pub mod heatmap;
/// Popup content.
pub mod popup;
/// The drawing target of the visualizer.
pub mod surface;

#[cfg(test)]
pub mod test_utils;

use charts::{ChartFactory, ChartLifecycle};
use heatmap::{HeatLayerOptions, build_heat_layer};
use popup::{PopupLabels, PopupView};
use surface::MapSurface;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisualizationError {
  #[error("there is no region {0}")]
  UnknownRegion(RegionId),
  #[error("year {year} is outside {}..={}", .range.first, .range.last)]
  YearOutOfRange { year: i32, range: YearRange },
}

/// The user-driven part of the visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizationState {
  pub selected_year: i32,
  pub highlighted_region: Option<RegionId>,
}

/// Settings of a [`Visualizer`].
#[derive(Debug, Clone)]
pub struct VisualizerOptions {
  pub mode: RenderMode,
  pub palette: Palette,
  pub years: YearRange,
  pub initial_year: i32,
  pub labels: PopupLabels,
  pub heat_layer: HeatLayerOptions,
}

impl Default for VisualizerOptions {
  fn default() -> Self {
    Self::from(&Config::default())
  }
}

impl From<&Config> for VisualizerOptions {
  fn from(config: &Config) -> Self {
    Self {
      mode: config.mode,
      palette: config.palette.clone(),
      years: config.years,
      initial_year: config.default_year,
      labels: config.labels.clone(),
      heat_layer: config.heat_layer.clone(),
    }
  }
}

/// Keeps styles, popups and charts of the bound regions consistent with the selected year and
/// the highlighted region.
///
/// At most one popup is open at a time, opening another one closes it.
pub struct Visualizer<S: MapSurface, F: ChartFactory> {
  regions: Vec<BoundRegion>,
  styles: Vec<Style>,
  surface: S,
  charts: ChartLifecycle<F>,
  state: VisualizationState,
  open_region: Option<RegionId>,
  options: VisualizerOptions,
}

impl<S: MapSurface, F: ChartFactory> Visualizer<S, F> {
  /// Styles every region and applies the initial year.
  ///
  /// # Errors
  /// If the initial year is not selectable.
  pub fn new(
    regions: Vec<BoundRegion>,
    surface: S,
    factory: F,
    options: VisualizerOptions,
  ) -> Result<Self, VisualizationError> {
    let year = options.initial_year;
    Self::check_year(year, options.years)?;

    let mut visualizer = Self {
      styles: vec![BASE_STYLE; regions.len()],
      regions,
      surface,
      charts: ChartLifecycle::new(factory),
      state: VisualizationState {
        selected_year: year,
        highlighted_region: None,
      },
      open_region: None,
      options,
    };

    for i in 0..visualizer.regions.len() {
      let style = if visualizer.regions[i].has_record() {
        BASE_STYLE
      } else {
        NO_DATA_STYLE
      };
      visualizer.restyle(RegionId(i), style);
    }
    visualizer.apply_year();
    Ok(visualizer)
  }

  fn check_year(year: i32, range: YearRange) -> Result<(), VisualizationError> {
    if range.contains(year) {
      Ok(())
    } else {
      Err(VisualizationError::YearOutOfRange { year, range })
    }
  }

  fn region(&self, id: RegionId) -> Result<&BoundRegion, VisualizationError> {
    self
      .regions
      .get(id.0)
      .ok_or(VisualizationError::UnknownRegion(id))
  }

  fn restyle(&mut self, id: RegionId, style: Style) {
    self.styles[id.0] = style;
    self.surface.set_style(id, style);
  }

  /// Recolors resolved regions or rebuilds the heat layer for the selected year.
  fn apply_year(&mut self) {
    profile_scope!("Visualizer::apply_year");
    let year = self.state.selected_year;
    let label = self.year_label();
    self.surface.set_year_label(&label);

    match self.options.mode {
      RenderMode::Choropleth => {
        for i in 0..self.regions.len() {
          let region = &self.regions[i];
          if !region.has_record() {
            continue;
          }
          let mut style = region.percentage(year).map_or(NO_DATA_STYLE, |p| {
            Style::classified(self.options.palette.classify(p))
          });
          if self.state.highlighted_region == Some(region.id) {
            style = style.overwrite_with(&HIGHLIGHT_STYLE);
          }
          self.restyle(RegionId(i), style);
        }
      }
      RenderMode::Heatmap => {
        let layer = build_heat_layer(&self.regions, year, &self.options.heat_layer);
        debug!(
          "Heat layer for {year}: {} points",
          layer.as_ref().map_or(0, |l| l.points.len())
        );
        self.surface.set_heat_layer(layer.as_ref());
      }
    }
  }

  /// Selects `year`, restyles the map and refreshes the open popup in place.
  ///
  /// # Errors
  /// If `year` is outside the configured range. Nothing changes in that case.
  pub fn set_year(&mut self, year: i32) -> Result<(), VisualizationError> {
    Self::check_year(year, self.options.years)?;
    self.state.selected_year = year;
    self.apply_year();

    if let Some(id) = self.open_region {
      let region = &self.regions[id.0];
      let view = PopupView::build(region, year, &self.options.labels);
      self.surface.update_popup(id, &view);
      if let Err(e) = self.charts.update(region, year) {
        error!("Failed to update charts of {}: {e}", region.name);
      }
    }
    Ok(())
  }

  /// Highlights `id`, every other region gets the plain outline.
  ///
  /// # Errors
  /// If there is no such region.
  pub fn activate(&mut self, id: RegionId) -> Result<(), VisualizationError> {
    self.region(id)?;
    for i in 0..self.regions.len() {
      let patch = if i == id.0 {
        HIGHLIGHT_STYLE
      } else {
        OUTLINE_STYLE
      };
      let style = self.styles[i].overwrite_with(&patch);
      self.restyle(RegionId(i), style);
    }
    self.state.highlighted_region = Some(id);
    Ok(())
  }

  /// Shows the popup of `id` for the selected year and attaches its charts. Another open popup
  /// is closed first, reopening the open one recreates its charts.
  ///
  /// # Errors
  /// If there is no such region.
  pub fn open_popup(&mut self, id: RegionId) -> Result<(), VisualizationError> {
    self.region(id)?;
    let open_region = self.open_region;
    match open_region {
      Some(open) if open == id => debug!("Popup of region {id} is already open, recreating"),
      Some(open) => self.close_popup(open)?,
      None => {}
    }

    let year = self.state.selected_year;
    let region = &self.regions[id.0];
    let view = PopupView::build(region, year, &self.options.labels);
    self.surface.open_popup(id, &view);
    if let Err(e) = self.charts.attach(region, year) {
      error!("Failed to create charts of {}: {e}", region.name);
    }
    self.open_region = Some(id);
    Ok(())
  }

  /// Closes the popup of `id` and destroys its charts. Closing a closed popup does nothing.
  ///
  /// # Errors
  /// If there is no such region.
  pub fn close_popup(&mut self, id: RegionId) -> Result<(), VisualizationError> {
    self.region(id)?;
    self.charts.detach(id);
    if self.open_region == Some(id) {
      self.surface.close_popup(id);
      self.open_region = None;
    }
    Ok(())
  }

  /// A click on a region, activating it and opening its popup.
  ///
  /// # Errors
  /// If there is no such region.
  pub fn click(&mut self, id: RegionId) -> Result<(), VisualizationError> {
    self.activate(id)?;
    self.open_popup(id)
  }

  /// Popup content of `id` for the selected year, whether it is open or not.
  ///
  /// # Errors
  /// If there is no such region.
  pub fn popup(&self, id: RegionId) -> Result<PopupView, VisualizationError> {
    Ok(PopupView::build(
      self.region(id)?,
      self.state.selected_year,
      &self.options.labels,
    ))
  }

  #[must_use]
  pub fn style(&self, id: RegionId) -> Option<Style> {
    self.styles.get(id.0).copied()
  }

  /// The first region named `name`.
  #[must_use]
  pub fn find_region(&self, name: &str) -> Option<&BoundRegion> {
    self.regions.iter().find(|r| r.name == name)
  }

  #[must_use]
  pub fn regions(&self) -> &[BoundRegion] {
    &self.regions
  }

  #[must_use]
  pub fn state(&self) -> VisualizationState {
    self.state
  }

  #[must_use]
  pub fn open_region(&self) -> Option<RegionId> {
    self.open_region
  }

  #[must_use]
  pub fn mode(&self) -> RenderMode {
    self.options.mode
  }

  #[must_use]
  pub fn years(&self) -> YearRange {
    self.options.years
  }

  #[must_use]
  pub fn year_label(&self) -> String {
    self.state.selected_year.to_string()
  }

  pub fn surface(&self) -> &S {
    &self.surface
  }

  pub fn surface_mut(&mut self) -> &mut S {
    &mut self.surface
  }

  pub fn charts(&self) -> &ChartLifecycle<F> {
    &self.charts
  }
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;

  use super::*;
  use crate::{
    binder::bind,
    map::color::Rgba,
    parser::{GeoJsonParser, test_utils::read_resource},
    stats::StatisticsIndex,
    viz::test_utils::{CountingCharts, RecordingSurface},
  };

  type TestVisualizer = Visualizer<RecordingSurface, CountingCharts>;

  fn visualizer(mode: RenderMode) -> (TestVisualizer, CountingCharts) {
    let index = StatisticsIndex::from_json(&read_resource("regions.json")).unwrap();
    let collection = GeoJsonParser::default()
      .parse(&read_resource("russia_regions.geojson"))
      .unwrap();
    let charts = CountingCharts::default();
    let options = VisualizerOptions {
      mode,
      ..VisualizerOptions::default()
    };
    let visualizer = Visualizer::new(
      bind(collection, &index),
      RecordingSurface::default(),
      charts.clone(),
      options,
    )
    .unwrap();
    (visualizer, charts)
  }

  fn id_of(visualizer: &TestVisualizer, name: &str) -> RegionId {
    visualizer.find_region(name).unwrap().id
  }

  #[test]
  fn test_initial_styles() {
    let (visualizer, _) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");
    let atlantis = id_of(&visualizer, "Атлантида");

    assert_eq!(visualizer.state().selected_year, 2020);
    assert_eq!(visualizer.surface().styles[&atlantis], NO_DATA_STYLE);
    let moscow_style = visualizer.surface().styles[&moscow];
    assert_eq!(moscow_style.fill_color(), Rgba::rgb(0, 92, 54));
    assert_approx_eq!(moscow_style.fill_opacity(), 0.7);
    assert_eq!(moscow_style.color(), Rgba::rgb(192, 255, 216));
    assert_eq!(visualizer.surface().year_label.as_deref(), Some("2020"));
  }

  #[test]
  fn test_year_change_recolors_resolved_regions() {
    let (mut visualizer, _) = visualizer(RenderMode::Choropleth);
    let chukotka = id_of(&visualizer, "Чукотский автономный округ");
    assert_eq!(
      visualizer.style(chukotka).unwrap().fill_color(),
      Rgba::rgb(212, 255, 100)
    );

    visualizer.set_year(2022).unwrap();
    assert_eq!(
      visualizer.style(chukotka).unwrap().fill_color(),
      Rgba::rgb(136, 255, 100)
    );

    visualizer.set_year(2023).unwrap();
    assert_eq!(visualizer.style(chukotka), Some(NO_DATA_STYLE));
    assert_eq!(visualizer.year_label(), "2023");
  }

  #[test]
  fn test_out_of_range_year_is_rejected() {
    let (mut visualizer, _) = visualizer(RenderMode::Choropleth);
    assert_eq!(
      visualizer.set_year(2030),
      Err(VisualizationError::YearOutOfRange {
        year: 2030,
        range: YearRange::default()
      })
    );
    assert_eq!(visualizer.state().selected_year, 2020);
  }

  #[test]
  fn test_activation_highlights_exactly_one() {
    let (mut visualizer, _) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");
    let kaliningrad = id_of(&visualizer, "Калининградская область");

    visualizer.activate(moscow).unwrap();
    visualizer.activate(kaliningrad).unwrap();

    let highlighted: Vec<_> = visualizer
      .regions()
      .iter()
      .filter(|r| visualizer.style(r.id).unwrap().color() == Rgba::rgb(234, 59, 0))
      .map(|r| r.id)
      .collect();
    assert_eq!(highlighted, [kaliningrad]);
    let moscow_style = visualizer.style(moscow).unwrap();
    assert_eq!(moscow_style.color(), Rgba::GRAY);
    assert_approx_eq!(moscow_style.weight(), 1.);
    assert_approx_eq!(moscow_style.opacity(), 0.7);
    assert_eq!(visualizer.state().highlighted_region, Some(kaliningrad));
  }

  #[test]
  fn test_highlight_survives_year_change() {
    let (mut visualizer, _) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");
    visualizer.activate(moscow).unwrap();
    visualizer.set_year(2024).unwrap();

    let style = visualizer.style(moscow).unwrap();
    assert_eq!(style.color(), Rgba::rgb(234, 59, 0));
    assert_approx_eq!(style.weight(), 3.);
    assert_eq!(style.fill_color(), Rgba::rgb(2, 68, 40));
  }

  #[test]
  fn test_popup_lifecycle() {
    let (mut visualizer, charts) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");

    visualizer.close_popup(moscow).unwrap();
    assert_eq!(charts.log().destroyed, 0);

    visualizer.click(moscow).unwrap();
    visualizer.close_popup(moscow).unwrap();
    visualizer.open_popup(moscow).unwrap();

    let log = charts.log();
    assert_eq!((log.live_lines, log.live_rings), (1, 1));
    assert_eq!(visualizer.open_region(), Some(moscow));
    assert_eq!(visualizer.surface().open_popups.len(), 1);
  }

  #[test]
  fn test_reopening_open_popup_recreates_charts() {
    let (mut visualizer, charts) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");
    visualizer.open_popup(moscow).unwrap();
    visualizer.open_popup(moscow).unwrap();

    let log = charts.log();
    assert_eq!((log.live_lines, log.live_rings), (1, 1));
    assert_eq!(log.created_rings, 2);
  }

  #[test]
  fn test_opening_another_popup_closes_the_first() {
    let (mut visualizer, charts) = visualizer(RenderMode::Choropleth);
    let moscow = id_of(&visualizer, "Москва");
    let kaliningrad = id_of(&visualizer, "Калининградская область");
    visualizer.open_popup(moscow).unwrap();
    visualizer.open_popup(kaliningrad).unwrap();

    assert!(!visualizer.charts().is_attached(moscow));
    assert!(visualizer.charts().is_attached(kaliningrad));
    assert_eq!(charts.log().live_rings, 1);
    assert_eq!(
      visualizer.surface().open_popups.keys().copied().collect::<Vec<_>>(),
      [kaliningrad]
    );
  }

  #[test]
  fn test_open_popup_follows_year() {
    let (mut visualizer, charts) = visualizer(RenderMode::Choropleth);
    let chukotka = id_of(&visualizer, "Чукотский автономный округ");
    visualizer.open_popup(chukotka).unwrap();

    visualizer.set_year(2023).unwrap();
    let popup = &visualizer.surface().open_popups[&chukotka];
    assert_eq!(popup.value(), Some("—"));
    let PopupView::Stats(stats) = popup else {
      panic!("resolved regions show statistics");
    };
    assert_eq!(stats.ring_title, "Распространение ШПД (2023)");
    assert_eq!(charts.log().last_ring, Some([0., 100.]));
    assert_eq!(charts.log().created_rings, 1);

    visualizer.set_year(2024).unwrap();
    assert_eq!(
      visualizer.surface().open_popups[&chukotka].value(),
      Some("70.1%")
    );
  }

  #[test]
  fn test_unresolved_popup() {
    let (mut visualizer, charts) = visualizer(RenderMode::Choropleth);
    let atlantis = id_of(&visualizer, "Атлантида");
    visualizer.click(atlantis).unwrap();

    assert_eq!(
      visualizer.surface().open_popups[&atlantis],
      PopupView::NoData {
        title: "Атлантида".to_string(),
        message: "Данные отсутствуют".to_string()
      }
    );
    assert_eq!(charts.log().created_lines, 0);
    visualizer.set_year(2021).unwrap();
    assert_eq!(visualizer.style(atlantis).unwrap().fill_color(), Rgba::rgb(204, 204, 204));
  }

  #[test]
  fn test_heatmap_mode_rebuilds_layer() {
    let (mut visualizer, _) = visualizer(RenderMode::Heatmap);
    let moscow = id_of(&visualizer, "Москва");
    assert_eq!(visualizer.style(moscow), Some(BASE_STYLE));
    assert_eq!(visualizer.surface().heat_layer.as_ref().unwrap().points.len(), 3);

    visualizer.set_year(2022).unwrap();
    assert_eq!(visualizer.surface().heat_layer_sets, 2);
    let layer = visualizer.surface().heat_layer.as_ref().unwrap();
    assert_eq!(layer.points.len(), 3);
    assert_approx_eq!(layer.points[0].weight, 0.946);
    assert_eq!(visualizer.style(moscow), Some(BASE_STYLE));
  }

  #[test]
  fn test_unknown_region() {
    let (mut visualizer, _) = visualizer(RenderMode::Choropleth);
    let missing = RegionId(99);
    assert_eq!(
      visualizer.open_popup(missing),
      Err(VisualizationError::UnknownRegion(missing))
    );
    assert_eq!(
      visualizer.activate(missing),
      Err(VisualizationError::UnknownRegion(missing))
    );
    assert!(visualizer.popup(missing).is_err());
  }
}
