//! Error types for `shipdw-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A JSON-lines batch contained a line that is not a shipment record.
  #[error("line {line}: {source}")]
  Line {
    line:   usize,
    #[source]
    source: serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
