//! The calendar date dimension.
//!
//! Date rows are keyed by a deterministic `YYYYMMDD` integer, which serves as
//! both identity and sort key. Rows are immutable once written.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// `YYYYMMDD` as an integer, e.g. 2025-03-07 → `20250307`.
pub fn date_key(date: NaiveDate) -> i32 {
  date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Calendar quarter of `date`: ⌈month / 3⌉.
fn quarter(date: NaiveDate) -> u32 { date.month0() / 3 + 1 }

/// One row of `dim_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimDate {
  pub date_key: i32,
  pub date:     NaiveDate,
  pub month:    u32,
  pub quarter:  u32,
  pub year:     i32,
}

impl From<NaiveDate> for DimDate {
  fn from(date: NaiveDate) -> Self {
    Self {
      date_key: date_key(date),
      date,
      month: date.month(),
      quarter: quarter(date),
      year: date.year(),
    }
  }
}
