use std::{fmt::Display, path::Path, time::Duration};

use futures::{StreamExt, stream::FuturesUnordered};
use log::{debug, error, info};
use thiserror::Error;

use crate::{
  config::BoundarySource,
  map::geometry_collection::{FeatureCollection, GeometryFeature},
  parser::{GeoJsonError, GeoJsonParser},
  profile_scope,
  stats::{StatisticsError, StatisticsIndex},
};

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("could not read {location}: {source}")]
  Io {
    location: String,
    source: std::io::Error,
  },
  #[error("request to {location} failed: {message}")]
  Http { location: String, message: String },
  #[error("{location} answered with status {status}")]
  Status { location: String, status: u16 },
  #[error(transparent)]
  GeoJson(#[from] GeoJsonError),
  #[error(transparent)]
  Statistics(#[from] StatisticsError),
}

/// Retrieves the raw bytes of a data source.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
  async fn fetch(&self, location: &str) -> Result<Vec<u8>, SourceError>;
}

/// Reads sources from the local file system. A `file://` prefix is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait::async_trait]
impl SourceFetcher for FileFetcher {
  async fn fetch(&self, location: &str) -> Result<Vec<u8>, SourceError> {
    let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
    tokio::fs::read(path).await.map_err(|source| SourceError::Io {
      location: location.to_string(),
      source,
    })
  }
}

/// Downloads sources over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: surf::Client,
}

impl HttpFetcher {
  /// Requests never time out unless `timeout` is given.
  ///
  /// # Errors
  /// If the HTTP client cannot be created.
  pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
    let client = match timeout {
      None => surf::Client::new(),
      Some(timeout) => surf::Config::new()
        .set_timeout(Some(timeout))
        .try_into()
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e:?}"))?,
    };
    Ok(Self { client })
  }
}

#[async_trait::async_trait]
impl SourceFetcher for HttpFetcher {
  async fn fetch(&self, location: &str) -> Result<Vec<u8>, SourceError> {
    let http_error = |e: surf::Error| SourceError::Http {
      location: location.to_string(),
      message: e.to_string(),
    };
    let mut response = self.client.get(location).await.map_err(http_error)?;
    if !response.status().is_success() {
      return Err(SourceError::Status {
        location: location.to_string(),
        status: u16::from(response.status()),
      });
    }
    response.body_bytes().await.map_err(http_error)
  }
}

/// Dispatches `http://` and `https://` locations to an [`HttpFetcher`], everything else to a
/// [`FileFetcher`].
#[derive(Debug, Clone)]
pub struct AutoFetcher {
  http: HttpFetcher,
  file: FileFetcher,
}

impl AutoFetcher {
  /// # Errors
  /// If the HTTP client cannot be created.
  pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
    Ok(Self {
      http: HttpFetcher::new(timeout)?,
      file: FileFetcher,
    })
  }

  fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
  }
}

#[async_trait::async_trait]
impl SourceFetcher for AutoFetcher {
  async fn fetch(&self, location: &str) -> Result<Vec<u8>, SourceError> {
    if Self::is_remote(location) {
      self.http.fetch(location).await
    } else {
      self.file.fetch(location).await
    }
  }
}

/// What became of one boundary source during a merge.
#[derive(Debug)]
pub struct SourceOutcome {
  pub name: String,
  pub location: String,
  /// Number of features contributed, or why the source was skipped.
  pub result: Result<usize, SourceError>,
}

impl SourceOutcome {
  #[must_use]
  pub fn feature_count(&self) -> Option<usize> {
    self.result.as_ref().ok().copied()
  }
}

impl Display for SourceOutcome {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.result {
      Ok(count) => write!(f, "{} ({}): {count} features", self.name, self.location),
      Err(e) => write!(f, "{} ({}): failed, {e}", self.name, self.location),
    }
  }
}

#[derive(Debug, Default)]
pub struct MergeReport {
  /// Normalized features of all successful sources in completion order.
  pub collection: FeatureCollection,
  /// One entry per source, in completion order.
  pub outcomes: Vec<SourceOutcome>,
}

impl MergeReport {
  #[must_use]
  pub fn succeeded(&self) -> usize {
    self.outcomes.iter().filter(|o| o.result.is_ok()).count()
  }
}

/// Loads all boundary sources concurrently and concatenates their normalized features.
#[derive(Debug, Clone)]
pub struct DatasetMerger<F> {
  fetcher: F,
}

impl<F: SourceFetcher> DatasetMerger<F> {
  pub fn new(fetcher: F) -> Self {
    Self { fetcher }
  }

  /// Issues every fetch at once and appends features as sources finish. A failing source is
  /// logged and left out, it never fails the merge.
  pub async fn merge(&self, sources: &[BoundarySource]) -> MergeReport {
    profile_scope!("DatasetMerger::merge");
    let mut pending: FuturesUnordered<_> = sources
      .iter()
      .map(|source| async move { (source, self.load_source(source).await) })
      .collect();

    let mut report = MergeReport::default();
    while let Some((source, result)) = pending.next().await {
      let result = match result {
        Ok(features) => {
          debug!("{}: {} features", source.name, features.len());
          let count = features.len();
          report.collection.features.extend(features);
          Ok(count)
        }
        Err(e) => {
          error!("Skipping boundary source {}: {e}", source.name);
          Err(e)
        }
      };
      report.outcomes.push(SourceOutcome {
        name: source.name.clone(),
        location: source.location.clone(),
        result,
      });
    }

    info!(
      "Merged {} features from {} of {} boundary sources",
      report.collection.len(),
      report.succeeded(),
      sources.len()
    );
    report
  }

  async fn load_source(&self, source: &BoundarySource) -> Result<Vec<GeometryFeature>, SourceError> {
    let bytes = self.fetcher.fetch(&source.location).await?;
    let collection = GeoJsonParser::new(source.name.as_str()).parse(&bytes)?;
    Ok(
      collection
        .features
        .into_iter()
        .map(GeometryFeature::normalized)
        .collect(),
    )
  }

  /// Loads the statistics table. Any failure yields the empty index, so every region shows
  /// the no-data state instead of aborting.
  pub async fn load_statistics(&self, location: &str) -> StatisticsIndex {
    let result = async {
      let bytes = self.fetcher.fetch(location).await?;
      Ok::<_, SourceError>(StatisticsIndex::from_json(&bytes)?)
    }
    .await;

    match result {
      Ok(index) => {
        info!("Loaded {} statistics records from {location}", index.len());
        index
      }
      Err(e) => {
        error!("Failed to load statistics, every region will show no data: {e}");
        StatisticsIndex::default()
      }
    }
  }
}
