//! Light input cleanup applied before validation.
//!
//! Mirrors what the upstream ingest step does to raw files: blank strings are
//! treated as absent, and records missing a required column can be dropped
//! instead of failing the whole batch.

use crate::{record::ShipmentRecord, validate::RequiredColumn};

/// Trim every text column; empty results become `None`.
pub fn normalize(record: &mut ShipmentRecord) {
  for field in [
    &mut record.shipment_id,
    &mut record.customer_id,
    &mut record.customer_name,
    &mut record.segment,
    &mut record.carrier_name,
    &mut record.mode,
    &mut record.origin_port_code,
    &mut record.origin_port_name,
    &mut record.origin_country,
    &mut record.origin_region,
    &mut record.dest_port_code,
    &mut record.dest_port_name,
    &mut record.dest_country,
    &mut record.dest_region,
    &mut record.status,
  ] {
    *field = field
      .take()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty());
  }
}

/// Remove records missing any required column.
///
/// Returns the surviving records (in input order) and how many were dropped.
pub fn drop_incomplete(records: Vec<ShipmentRecord>) -> (Vec<ShipmentRecord>, usize) {
  let before = records.len();
  let kept: Vec<_> = records
    .into_iter()
    .filter(|r| RequiredColumn::ALL.iter().all(|c| !c.is_absent(r)))
    .collect();
  let dropped = before - kept.len();
  (kept, dropped)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete(id: &str) -> ShipmentRecord {
    ShipmentRecord {
      shipment_id: Some(id.into()),
      carrier_name: Some("DHL".into()),
      origin_port_code: Some("SGSIN".into()),
      dest_port_code: Some("DEHAM".into()),
      ship_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
      ..Default::default()
    }
  }

  #[test]
  fn normalize_trims_and_blanks_become_absent() {
    let mut r = complete("  SHP-1 ");
    r.segment = Some("   ".into());
    r.customer_name = Some("".into());
    normalize(&mut r);

    assert_eq!(r.shipment_id.as_deref(), Some("SHP-1"));
    assert_eq!(r.segment, None);
    assert_eq!(r.customer_name, None);
    assert_eq!(r.carrier_name.as_deref(), Some("DHL"));
  }

  #[test]
  fn drop_incomplete_keeps_order() {
    let mut missing_date = complete("B");
    missing_date.ship_date = None;
    let (kept, dropped) =
      drop_incomplete(vec![complete("A"), missing_date, complete("C")]);

    assert_eq!(dropped, 1);
    let ids: Vec<_> = kept.iter().filter_map(|r| r.shipment_id.as_deref()).collect();
    assert_eq!(ids, ["A", "C"]);
  }
}
