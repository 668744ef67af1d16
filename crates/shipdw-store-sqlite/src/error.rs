//! Error type for `shipdw-store-sqlite`.

use shipdw_core::{dimension::Dimension, validate::ValidationReport};
use thiserror::Error;

use crate::LoadStage;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// The batch failed one or more data-quality rules. Nothing was written.
  #[error("{0}")]
  Validation(ValidationReport),

  #[error("staging failed: {0}")]
  Staging(#[source] rusqlite::Error),

  #[error("resolving {dimension} failed: {source}")]
  Resolution {
    dimension: Dimension,
    #[source]
    source:    rusqlite::Error,
  },

  #[error("fact upsert failed: {0}")]
  Upsert(#[source] rusqlite::Error),

  /// The caller's deadline passed; the load was rolled back.
  #[error("deadline exceeded after stage {0:?}")]
  DeadlineExceeded(LoadStage),

  #[error("date parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
