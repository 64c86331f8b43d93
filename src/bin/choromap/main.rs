use std::path::PathBuf;

use anyhow::{Context, bail};
use choromap::{
  binder::{BoundRegion, bind},
  config::{Config, RenderMode},
  loader::{AutoFetcher, DatasetMerger, MergeReport},
  profiling,
  render::{RasterCharts, RasterSurface},
  stats::StatisticsIndex,
  viz::{Visualizer, VisualizerOptions},
};
use clap::{Parser, Subcommand};
use log::info;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Config file to use instead of the one in the config directory.
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Renders the map of one or all years to PNG.
  Render {
    /// Year to render. Defaults to the configured default year.
    #[arg(short, long, conflicts_with = "all_years")]
    year: Option<i32>,

    /// Renders every year of the configured range.
    #[arg(short, long)]
    all_years: bool,

    #[arg(short, long, value_enum)]
    mode: Option<RenderMode>,

    /// Output directory, overrides the configured one.
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Opens the popup of a region and writes its charts.
  Inspect {
    /// Region name as it appears in the boundary data.
    #[arg(short, long)]
    region: String,

    #[arg(short, long)]
    year: Option<i32>,

    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Loads every boundary source and reports how it went.
  Sources,
}

async fn load(config: &Config) -> anyhow::Result<(StatisticsIndex, MergeReport)> {
  let merger = DatasetMerger::new(AutoFetcher::new(config.fetch_timeout())?);
  Ok(tokio::join!(
    merger.load_statistics(&config.statistics),
    merger.merge(&config.boundaries)
  ))
}

fn print_report(report: &MergeReport) {
  for outcome in &report.outcomes {
    println!("{outcome}");
  }
  println!(
    "{} of {} sources loaded, {} regions",
    report.succeeded(),
    report.outcomes.len(),
    report.collection.len()
  );
}

fn visualizer(
  config: &Config,
  regions: Vec<BoundRegion>,
  initial_year: Option<i32>,
) -> anyhow::Result<Visualizer<RasterSurface, RasterCharts>> {
  let surface = RasterSurface::new(&config.raster, config.viewport);
  let charts = RasterCharts::new(&config.raster)?;
  let mut options = VisualizerOptions::from(config);
  if let Some(year) = initial_year {
    options.initial_year = year;
  }
  Ok(Visualizer::new(regions, surface, charts, options)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init();
  profiling::init_profiling();

  let args = Args::parse();
  let mut config = match &args.config {
    Some(path) => Config::load_from(path)?,
    None => Config::new(),
  };

  match args.command {
    Command::Sources => {
      let (_, report) = load(&config).await?;
      print_report(&report);
    }
    Command::Render {
      year,
      all_years,
      mode,
      out,
    } => {
      if let Some(mode) = mode {
        config.mode = mode;
      }
      if let Some(out) = out {
        config.raster.output_dir = out;
      }
      let (index, report) = load(&config).await?;
      let regions = bind(report.collection, &index);
      let mut viz = visualizer(&config, regions, year)?;

      let years: Vec<i32> = if all_years {
        viz.years().iter().collect()
      } else {
        vec![viz.state().selected_year]
      };
      for year in years {
        viz.set_year(year)?;
        let path = config.raster.output_dir.join(format!("map-{year}.png"));
        viz
          .surface()
          .save_png(viz.regions(), &path)
          .with_context(|| format!("Failed to render {year}"))?;
        profiling::new_frame();
        info!("Rendered {} map of {year}", viz.mode().name());
        println!("{}", path.display());
      }
    }
    Command::Inspect { region, year, out } => {
      if let Some(out) = out {
        config.raster.output_dir = out;
      }
      let (index, report) = load(&config).await?;
      let regions = bind(report.collection, &index);
      let mut viz = visualizer(&config, regions, year)?;

      let Some(id) = viz.find_region(&region).map(|r| r.id) else {
        bail!("No region named {region}");
      };
      viz.click(id)?;
      println!("{}", viz.popup(id)?);
      if viz.charts().is_attached(id) {
        println!("Charts written to {}", config.raster.output_dir.display());
      }
    }
  }
  Ok(())
}
