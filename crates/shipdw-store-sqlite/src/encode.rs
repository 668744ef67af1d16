//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Calendar dates are stored as ISO 8601 `YYYY-MM-DD` strings so they sort
//! and compare correctly as text.

use chrono::NaiveDate;
use shipdw_core::{date::DimDate, fact::FactShipment};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `dim_date` row.
pub struct RawDimDate {
  pub date_key: i32,
  pub date:     String,
  pub month:    u32,
  pub quarter:  u32,
  pub year:     i32,
}

impl RawDimDate {
  pub fn into_dim_date(self) -> Result<DimDate> {
    Ok(DimDate {
      date_key: self.date_key,
      date:     decode_date(&self.date)?,
      month:    self.month,
      quarter:  self.quarter,
      year:     self.year,
    })
  }
}

/// Raw values read directly from a `fact_shipment` row.
pub struct RawFact {
  pub shipment_id:            String,
  pub date_key:               i32,
  pub origin_port_key:        Option<i64>,
  pub dest_port_key:          Option<i64>,
  pub carrier_key:            Option<i64>,
  pub customer_key:           Option<i64>,
  pub promised_delivery_date: Option<String>,
  pub actual_delivery_date:   Option<String>,
  pub planned_days:           Option<i64>,
  pub actual_days:            Option<i64>,
  pub delay_days:             Option<i64>,
  pub on_time_flag:           bool,
  pub weight_kg:              Option<f64>,
  pub cost_usd:               Option<f64>,
  pub status:                 Option<String>,
}

impl RawFact {
  pub fn into_fact(self) -> Result<FactShipment> {
    Ok(FactShipment {
      shipment_id:            self.shipment_id,
      date_key:               self.date_key,
      origin_port_key:        self.origin_port_key,
      dest_port_key:          self.dest_port_key,
      carrier_key:            self.carrier_key,
      customer_key:           self.customer_key,
      promised_delivery_date: decode_opt_date(self.promised_delivery_date)?,
      actual_delivery_date:   decode_opt_date(self.actual_delivery_date)?,
      planned_days:           self.planned_days,
      actual_days:            self.actual_days,
      delay_days:             self.delay_days,
      on_time_flag:           self.on_time_flag,
      weight_kg:              self.weight_kg,
      cost_usd:               self.cost_usd,
      status:                 self.status,
    })
  }
}
