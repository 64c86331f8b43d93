use std::{collections::BTreeMap, path::PathBuf};

use choromap::{
  binder::{RegionId, bind},
  config::{BoundarySource, RasterConfig, RenderMode},
  loader::{DatasetMerger, FileFetcher},
  map::{
    coordinates::lng_lat,
    geometry_collection::{FeatureCollection, Geometry, GeometryFeature, NO_DATA_STYLE, Style},
  },
  render::{RasterCharts, RasterSurface},
  stats::StatisticsIndex,
  viz::{
    Visualizer, VisualizerOptions,
    charts::{ChartError, ChartFactory, ChartWidget, LineChartSpec, RingChartSpec},
    heatmap::HeatLayer,
    popup::PopupView,
    surface::MapSurface,
  },
};
use rstest::rstest;

#[derive(Default)]
struct Surface {
  styles: BTreeMap<RegionId, Style>,
  popups: BTreeMap<RegionId, PopupView>,
}

impl MapSurface for Surface {
  fn set_style(&mut self, region: RegionId, style: Style) {
    self.styles.insert(region, style);
  }

  fn open_popup(&mut self, region: RegionId, popup: &PopupView) {
    self.popups.insert(region, popup.clone());
  }

  fn close_popup(&mut self, region: RegionId) {
    self.popups.remove(&region);
  }

  fn set_heat_layer(&mut self, _layer: Option<&HeatLayer>) {}
}

struct NoCharts;

struct Widget;

impl ChartWidget for Widget {
  type Data = Vec<f64>;

  fn set_data(&mut self, _data: Vec<f64>) {}

  fn update(&mut self) -> Result<(), ChartError> {
    Ok(())
  }

  fn destroy(self) {}
}

struct Ring;

impl ChartWidget for Ring {
  type Data = [f64; 2];

  fn set_data(&mut self, _data: [f64; 2]) {}

  fn update(&mut self) -> Result<(), ChartError> {
    Ok(())
  }

  fn destroy(self) {}
}

impl ChartFactory for NoCharts {
  type Line = Widget;
  type Ring = Ring;

  fn line_chart(&mut self, _spec: LineChartSpec) -> Result<Widget, ChartError> {
    Ok(Widget)
  }

  fn ring_chart(&mut self, _spec: RingChartSpec) -> Result<Ring, ChartError> {
    Ok(Ring)
  }
}

fn resource(name: &str) -> String {
  format!("{}/tests/resources/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn sources() -> Vec<BoundarySource> {
  ["russia_regions.geojson", "new_regions.geojson"]
    .iter()
    .map(|file| BoundarySource {
      name: (*file).to_string(),
      location: resource(file),
    })
    .collect()
}

fn raster_config(test: &str) -> RasterConfig {
  RasterConfig {
    width: 320,
    height: 180,
    output_dir: std::env::temp_dir().join(format!("choromap-pipeline-{test}-{}", std::process::id())),
    ..RasterConfig::default()
  }
}

fn options(mode: RenderMode) -> VisualizerOptions {
  VisualizerOptions {
    mode,
    ..VisualizerOptions::default()
  }
}

#[test]
fn test_popup_follows_selected_year() {
  let index =
    StatisticsIndex::from_json(br#"{"r1": {"region": "A", "data": {"2020": [50], "2021": [60]}}}"#)
      .unwrap();
  let collection = FeatureCollection {
    features: vec![GeometryFeature::new("A", Geometry::Point(lng_lat(37.6, 55.7)))],
  };
  let regions = bind(collection, &index);
  let mut viz =
    Visualizer::new(regions, Surface::default(), NoCharts, options(RenderMode::Choropleth)).unwrap();

  viz.set_year(2021).unwrap();
  viz.click(RegionId(0)).unwrap();
  assert_eq!(viz.surface().popups[&RegionId(0)].value(), Some("60%"));

  viz.set_year(2022).unwrap();
  assert_eq!(viz.surface().popups[&RegionId(0)].value(), Some("—"));
  assert_eq!(viz.surface().styles[&RegionId(0)].fill_color(), NO_DATA_STYLE.fill_color());
}

#[tokio::test]
async fn test_files_to_png() {
  let merger = DatasetMerger::new(FileFetcher);
  let stats_path = resource("regions.json");
  let sources = sources();
  let (index, report) = tokio::join!(
    merger.load_statistics(&stats_path),
    merger.merge(&sources)
  );
  assert_eq!(report.succeeded(), 2);
  assert_eq!(index.len(), 4);

  let config = raster_config("files");
  let regions = bind(report.collection, &index);
  assert_eq!(regions.len(), 5);

  let mut viz = Visualizer::new(
    regions,
    RasterSurface::new(&config, Default::default()),
    RasterCharts::new(&config).unwrap(),
    options(RenderMode::Choropleth),
  )
  .unwrap();
  viz.set_year(2022).unwrap();

  let crimea = viz.find_region("Республика Крым").unwrap().id;
  viz.click(crimea).unwrap();
  assert_eq!(viz.popup(crimea).unwrap().value(), Some("71.4%"));
  assert!(config.output_dir.join("ring-РеспубликаКрым.png").exists());
  assert!(config.output_dir.join("chart-РеспубликаКрым.png").exists());

  let atlantis = viz.find_region("Атлантида").unwrap().id;
  assert!(matches!(viz.popup(atlantis).unwrap(), PopupView::NoData { .. }));

  let path: PathBuf = config.output_dir.join("map-2022.png");
  viz.surface().save_png(viz.regions(), &path).unwrap();
  assert!(path.exists());
}

#[rstest]
#[case(2020, 3)]
#[case(2022, 4)]
#[case(2023, 3)]
#[tokio::test]
async fn test_heatmap_points_per_year(#[case] year: i32, #[case] points: usize) {
  let merger = DatasetMerger::new(FileFetcher);
  let index = merger.load_statistics(&resource("regions.json")).await;
  let report = merger.merge(&sources()).await;
  let config = raster_config("heat");

  let mut viz = Visualizer::new(
    bind(report.collection, &index),
    RasterSurface::new(&config, Default::default()),
    NoCharts,
    options(RenderMode::Heatmap),
  )
  .unwrap();
  viz.set_year(year).unwrap();
  assert_eq!(viz.surface().heat_layer().unwrap().points.len(), points);
}

#[tokio::test]
async fn test_missing_statistics_still_draws_boundaries() {
  let merger = DatasetMerger::new(FileFetcher);
  let index = merger.load_statistics(&resource("missing.json")).await;
  assert!(index.is_empty());

  let report = merger.merge(&sources()).await;
  let regions = bind(report.collection, &index);
  assert!(regions.iter().all(|r| !r.has_record()));

  let viz = Visualizer::new(regions, Surface::default(), NoCharts, options(RenderMode::Choropleth))
    .unwrap();
  assert!(viz.surface().styles.values().all(|s| *s == NO_DATA_STYLE));
}
