//! Error type for `papers-store-sqlite`.

use papers_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A registry rule or lookup failed; see [`papers_core::Error`].
  #[error(transparent)]
  Registry(#[from] papers_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),
}

impl Error {
  /// The registry category, or `None` for infrastructure failures.
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      Self::Registry(e) => Some(e.kind()),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
