//! Reading shipment batches from JSON or CSV.
//!
//! A JSON batch is either an array of records or JSON lines (one record per
//! line, blank lines ignored). A CSV batch has a header row; header names are
//! matched after trimming and lowercasing, so ` Shipment_ID ` is
//! `shipment_id`. Unknown columns are ignored in both formats.
//!
//! Dates are `YYYY-MM-DD`. Date and numeric cells that fail to parse become
//! absent rather than rejecting the batch.

use std::path::Path;

use crate::{Error, Result, record::ShipmentRecord};

/// The on-disk shape of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
  Json,
  Csv,
}

impl BatchFormat {
  /// `.csv` files (any case) are CSV; everything else is JSON.
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
      _ => Self::Json,
    }
  }

  pub fn parse(self, input: &str) -> Result<Vec<ShipmentRecord>> {
    match self {
      Self::Json => parse_batch(input),
      Self::Csv => parse_csv(input),
    }
  }
}

pub fn parse_batch(input: &str) -> Result<Vec<ShipmentRecord>> {
  if input.trim_start().starts_with('[') {
    return Ok(serde_json::from_str(input)?);
  }

  input
    .lines()
    .enumerate()
    .filter(|(_, line)| !line.trim().is_empty())
    .map(|(i, line)| {
      serde_json::from_str(line).map_err(|source| Error::Line { line: i + 1, source })
    })
    .collect()
}

pub fn parse_csv(input: &str) -> Result<Vec<ShipmentRecord>> {
  let mut reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .from_reader(input.as_bytes());

  let headers: csv::StringRecord = reader
    .headers()?
    .iter()
    .map(|h| h.trim().to_ascii_lowercase())
    .collect();
  reader.set_headers(headers);

  Ok(
    reader
      .deserialize::<ShipmentRecord>()
      .collect::<std::result::Result<_, _>>()?,
  )
}
