//! The shipment fact and the pure transformation that builds it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  date::date_key,
  dimension::{KeyMaps, SurrogateKey},
  record::ValidShipment,
};

/// One row of `fact_shipment`. Upserts replace every column but
/// `shipment_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactShipment {
  pub shipment_id:            String,
  pub date_key:               i32,
  pub origin_port_key:        Option<SurrogateKey>,
  pub dest_port_key:          Option<SurrogateKey>,
  pub carrier_key:            Option<SurrogateKey>,
  pub customer_key:           Option<SurrogateKey>,
  pub promised_delivery_date: Option<NaiveDate>,
  pub actual_delivery_date:   Option<NaiveDate>,
  pub planned_days:           Option<i64>,
  pub actual_days:            Option<i64>,
  pub delay_days:             Option<i64>,
  pub on_time_flag:           bool,
  pub weight_kg:              Option<f64>,
  pub cost_usd:               Option<f64>,
  pub status:                 Option<String>,
}

/// Build the fact row for `s` using the resolved key maps.
///
/// A natural key missing from its map yields a `None` foreign key, not an
/// error. Such facts are loaded with a referential gap; callers that need
/// strict integrity must check the keys themselves.
pub fn build_fact(s: &ValidShipment, keys: &KeyMaps) -> FactShipment {
  let planned_days = s
    .promised_delivery_date
    .map(|promised| (promised - s.ship_date).num_days());
  let actual_days = s
    .actual_delivery_date
    .map(|actual| (actual - s.ship_date).num_days());
  let delay_days = actual_days.zip(planned_days).map(|(a, p)| a - p);
  let on_time_flag = matches!(
    (s.actual_delivery_date, s.promised_delivery_date),
    (Some(actual), Some(promised)) if actual <= promised
  );

  FactShipment {
    shipment_id: s.shipment_id.clone(),
    date_key: date_key(s.ship_date),
    origin_port_key: keys.ports.get(&s.origin.code),
    dest_port_key: keys.ports.get(&s.dest.code),
    carrier_key: keys.carriers.get(&s.carrier_name),
    customer_key: s.customer_id.as_deref().and_then(|id| keys.customers.get(id)),
    promised_delivery_date: s.promised_delivery_date,
    actual_delivery_date: s.actual_delivery_date,
    planned_days,
    actual_days,
    delay_days,
    on_time_flag,
    weight_kg: s.weight_kg,
    cost_usd: s.cost_usd,
    status: s.status.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    dimension::KeyMap,
    record::ShipmentRecord,
    validate::validate,
  };

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  fn shipment(promised: Option<&str>, actual: Option<&str>) -> ValidShipment {
    let record = ShipmentRecord {
      shipment_id: Some("SHP-202501-00001".into()),
      customer_id: Some("C001".into()),
      carrier_name: Some("Maersk".into()),
      origin_port_code: Some("CNSHA".into()),
      dest_port_code: Some("USLAX".into()),
      ship_date: Some(d("2025-01-01")),
      promised_delivery_date: promised.map(d),
      actual_delivery_date: actual.map(d),
      weight_kg: Some(1200.0),
      cost_usd: Some(800.0),
      status: Some("Delivered".into()),
      ..Default::default()
    };
    validate(&[record]).unwrap().iter().next().unwrap().clone()
  }

  fn keys() -> KeyMaps {
    KeyMaps {
      ports:     [("CNSHA".to_string(), 1), ("USLAX".to_string(), 2)]
        .into_iter()
        .collect(),
      carriers:  [("Maersk".to_string(), 10)].into_iter().collect(),
      customers: [("C001".to_string(), 100)].into_iter().collect(),
    }
  }

  #[test]
  fn late_delivery_metrics() {
    let fact = build_fact(&shipment(Some("2025-01-10"), Some("2025-01-12")), &keys());

    assert_eq!(fact.date_key, 20250101);
    assert_eq!(fact.planned_days, Some(9));
    assert_eq!(fact.actual_days, Some(11));
    assert_eq!(fact.delay_days, Some(2));
    assert!(!fact.on_time_flag);
  }

  #[test]
  fn delivery_on_promised_day_is_on_time() {
    let fact = build_fact(&shipment(Some("2025-01-10"), Some("2025-01-10")), &keys());
    assert_eq!(fact.delay_days, Some(0));
    assert!(fact.on_time_flag);
  }

  #[test]
  fn early_delivery_has_negative_delay() {
    let fact = build_fact(&shipment(Some("2025-01-10"), Some("2025-01-08")), &keys());
    assert_eq!(fact.delay_days, Some(-2));
    assert!(fact.on_time_flag);
  }

  #[test]
  fn missing_actual_date_leaves_metrics_absent() {
    let fact = build_fact(&shipment(Some("2025-01-10"), None), &keys());
    assert_eq!(fact.planned_days, Some(9));
    assert_eq!(fact.actual_days, None);
    assert_eq!(fact.delay_days, None);
    assert!(!fact.on_time_flag);
  }

  #[test]
  fn missing_promised_date_leaves_plan_absent() {
    let fact = build_fact(&shipment(None, Some("2025-01-04")), &keys());
    assert_eq!(fact.planned_days, None);
    assert_eq!(fact.actual_days, Some(3));
    assert_eq!(fact.delay_days, None);
    assert!(!fact.on_time_flag);
  }

  #[test]
  fn resolved_keys_are_attached() {
    let fact = build_fact(&shipment(None, None), &keys());
    assert_eq!(fact.origin_port_key, Some(1));
    assert_eq!(fact.dest_port_key, Some(2));
    assert_eq!(fact.carrier_key, Some(10));
    assert_eq!(fact.customer_key, Some(100));
  }

  // Unresolved natural keys are tolerated: the fact is built with null
  // foreign keys instead of failing.
  #[test]
  fn unresolved_keys_become_null() {
    let mut partial = keys();
    partial.ports = [("USLAX".to_string(), 2)].into_iter().collect::<KeyMap>();
    partial.customers = KeyMap::default();

    let fact = build_fact(&shipment(None, None), &partial);
    assert_eq!(fact.origin_port_key, None);
    assert_eq!(fact.dest_port_key, Some(2));
    assert_eq!(fact.customer_key, None);
    assert_eq!(fact.carrier_key, Some(10));
  }
}
