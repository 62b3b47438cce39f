//! Store configuration, read from an optional TOML file plus `PAPERS_*`
//! environment overrides.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// SQLite database file.
  pub path:            PathBuf,
  /// How long a writer waits for another connection's lock before failing.
  pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { path: PathBuf::from("papers.db"), busy_timeout_ms: 5_000 }
  }
}

impl StoreConfig {
  /// Layer `file` (if given; it must exist) and then the environment over the
  /// defaults. `PAPERS_PATH=/var/lib/papers.db` overrides `path`.
  pub fn load(file: Option<&Path>) -> Result<Self> {
    Self::layered(file, config::Environment::with_prefix("PAPERS"))
  }

  fn layered(file: Option<&Path>, env: config::Environment) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(file) = file {
      builder = builder.add_source(config::File::from(file).required(true));
    }
    let settings = builder.add_source(env).build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn busy_timeout(&self) -> Duration {
    Duration::from_millis(self.busy_timeout_ms)
  }
}
