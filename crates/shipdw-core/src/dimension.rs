//! Dimension rows and natural-key → surrogate-key maps.
//!
//! Collecting the rows a batch contributes is pure and lives here; writing
//! them and reading the store-assigned keys back is the backend's job.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  fmt,
};

use serde::{Deserialize, Serialize};

use crate::{date::DimDate, validate::ValidatedBatch};

/// A store-assigned identifier for a dimension row.
pub type SurrogateKey = i64;

/// The four dimensions of the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
  Date,
  Port,
  Carrier,
  Customer,
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Date => "dim_date",
      Self::Port => "dim_port",
      Self::Carrier => "dim_carrier",
      Self::Customer => "dim_customer",
    })
  }
}

// ─── Pending rows ────────────────────────────────────────────────────────────

/// A port to be upserted. Absent attributes are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRow {
  pub port_code: String,
  pub port_name: String,
  pub country:   String,
  pub region:    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierRow {
  pub carrier_name: String,
  pub mode:         String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
  pub customer_id:   String,
  pub customer_name: String,
  pub segment:       String,
}

/// Everything a batch contributes to the dimensions, de-duplicated by
/// natural key and sorted by it.
///
/// When a natural key appears more than once, the last observation in batch
/// order wins. For ports, each record contributes its origin and then its
/// destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionRows {
  pub dates:     Vec<DimDate>,
  pub ports:     Vec<PortRow>,
  pub carriers:  Vec<CarrierRow>,
  pub customers: Vec<CustomerRow>,
}

impl DimensionRows {
  pub fn collect(batch: &ValidatedBatch) -> Self {
    let mut dates = BTreeSet::new();
    let mut ports = BTreeMap::new();
    let mut carriers = BTreeMap::new();
    let mut customers = BTreeMap::new();

    for s in batch {
      dates.insert(DimDate::from(s.ship_date));

      for port in [&s.origin, &s.dest] {
        ports.insert(port.code.clone(), PortRow {
          port_code: port.code.clone(),
          port_name: port.name.clone().unwrap_or_default(),
          country:   port.country.clone().unwrap_or_default(),
          region:    port.region.clone().unwrap_or_default(),
        });
      }

      carriers.insert(s.carrier_name.clone(), CarrierRow {
        carrier_name: s.carrier_name.clone(),
        mode:         s.mode.clone().unwrap_or_default(),
      });

      // A shipment without a customer id contributes no customer row; its
      // fact is loaded with a null customer key.
      if let Some(id) = &s.customer_id {
        customers.insert(id.clone(), CustomerRow {
          customer_id:   id.clone(),
          customer_name: s.customer_name.clone().unwrap_or_default(),
          segment:       s.segment.clone().unwrap_or_default(),
        });
      }
    }

    Self {
      dates:     dates.into_iter().collect(),
      ports:     ports.into_values().collect(),
      carriers:  carriers.into_values().collect(),
      customers: customers.into_values().collect(),
    }
  }
}

// ─── Stored rows ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimPort {
  pub port_key:  SurrogateKey,
  pub port_code: String,
  pub port_name: String,
  pub country:   String,
  pub region:    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimCarrier {
  pub carrier_key:  SurrogateKey,
  pub carrier_name: String,
  pub mode:         String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimCustomer {
  pub customer_key:  SurrogateKey,
  pub customer_id:   String,
  pub customer_name: String,
  pub segment:       String,
}

// ─── Key maps ────────────────────────────────────────────────────────────────

/// Natural key → surrogate key for one dimension, as read back from the
/// store after upserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap(HashMap<String, SurrogateKey>);

impl KeyMap {
  pub fn get(&self, natural_key: &str) -> Option<SurrogateKey> {
    self.0.get(natural_key).copied()
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<(String, SurrogateKey)> for KeyMap {
  fn from_iter<I: IntoIterator<Item = (String, SurrogateKey)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// The key maps the fact builder needs. Dates need no map: their key is
/// computed from the calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMaps {
  pub ports:     KeyMap,
  pub carriers:  KeyMap,
  pub customers: KeyMap,
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{record::ShipmentRecord, validate::validate};

  fn record(id: &str, origin: &str, dest: &str, ship: (i32, u32, u32)) -> ShipmentRecord {
    ShipmentRecord {
      shipment_id: Some(id.into()),
      customer_id: Some("C001".into()),
      customer_name: Some("NorthStar Imports".into()),
      segment: Some("Retail".into()),
      carrier_name: Some("Maersk".into()),
      mode: Some("Sea".into()),
      origin_port_code: Some(origin.into()),
      origin_port_name: Some(format!("{origin} port")),
      dest_port_code: Some(dest.into()),
      dest_port_name: Some(format!("{dest} port")),
      ship_date: NaiveDate::from_ymd_opt(ship.0, ship.1, ship.2),
      ..Default::default()
    }
  }

  #[test]
  fn ports_are_unioned_across_roles() {
    let batch = validate(&[
      record("A", "CNSHA", "USLAX", (2025, 1, 1)),
      record("B", "USLAX", "NLRTM", (2025, 1, 1)),
    ])
    .unwrap();
    let rows = DimensionRows::collect(&batch);

    let codes: Vec<_> = rows.ports.iter().map(|p| p.port_code.as_str()).collect();
    assert_eq!(codes, ["CNSHA", "NLRTM", "USLAX"]);
    assert_eq!(rows.dates.len(), 1);
    assert_eq!(rows.carriers.len(), 1);
    assert_eq!(rows.customers.len(), 1);
  }

  #[test]
  fn last_observation_wins() {
    let mut first = record("A", "CNSHA", "USLAX", (2025, 1, 1));
    first.mode = Some("Sea".into());
    let mut second = record("B", "CNSHA", "USLAX", (2025, 2, 1));
    second.mode = Some("Rail".into());
    second.origin_port_name = Some("Shanghai".into());

    let batch = validate(&[first, second]).unwrap();
    let rows = DimensionRows::collect(&batch);

    assert_eq!(rows.carriers, vec![CarrierRow {
      carrier_name: "Maersk".into(),
      mode:         "Rail".into(),
    }]);
    let cnsha = rows.ports.iter().find(|p| p.port_code == "CNSHA").unwrap();
    assert_eq!(cnsha.port_name, "Shanghai");
    assert_eq!(rows.dates.len(), 2);
  }

  #[test]
  fn absent_attributes_become_empty_and_absent_customer_is_skipped() {
    let mut r = record("A", "CNSHA", "USLAX", (2025, 1, 1));
    r.customer_id = None;
    r.mode = None;
    let batch = validate(&[r]).unwrap();
    let rows = DimensionRows::collect(&batch);

    assert!(rows.customers.is_empty());
    assert_eq!(rows.carriers[0].mode, "");
    assert_eq!(rows.ports[0].country, "");
  }

  #[test]
  fn key_map_lookup() {
    let map: KeyMap = [("CNSHA".to_string(), 7)].into_iter().collect();
    assert_eq!(map.get("CNSHA"), Some(7));
    assert_eq!(map.get("USLAX"), None);
    assert_eq!(map.len(), 1);
  }
}
