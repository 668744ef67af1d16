//! Lenient decoding of date and numeric cells.
//!
//! Upstream files are hand-edited and exported from spreadsheets, so a cell
//! may hold a number as text, a date in the wrong format, or garbage. Such
//! cells decode to `None` instead of failing the whole batch; the validator
//! or [`drop_incomplete`](crate::cleanup::drop_incomplete) then decides what
//! an absent value means.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, de::IgnoredAny};

/// A single cell as any self-describing format presents it.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
  Number(f64),
  Text(String),
  Other(#[allow(dead_code)] IgnoredAny),
}

/// `YYYY-MM-DD`, optionally followed by a time of day which is discarded.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .or_else(|| {
      ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
    })
}

pub(crate) fn lenient_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Cell>::deserialize(d)? {
    Some(Cell::Text(s)) => parse_date(&s),
    _ => None,
  })
}

pub(crate) fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = match Option::<Cell>::deserialize(d)? {
    Some(Cell::Number(n)) => Some(n),
    Some(Cell::Text(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  Ok(value.filter(|n| n.is_finite()))
}
