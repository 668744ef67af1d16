//! Shipment records: the unit of input to the loader.
//!
//! [`ShipmentRecord`] is the raw shape handed over by the upstream cleaning
//! step: every column may be absent. [`ValidShipment`] is the same record
//! after [`validate`](crate::validate::validate) has proven that the columns
//! the warehouse keys on are present.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::coerce::{lenient_date, lenient_f64};

// ─── Raw record ──────────────────────────────────────────────────────────────

/// One shipment as it arrives from upstream. Absent values are `None`, never
/// empty strings. Date and numeric cells that do not parse are absent too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentRecord {
  pub shipment_id:            Option<String>,
  pub customer_id:            Option<String>,
  pub customer_name:          Option<String>,
  pub segment:                Option<String>,
  pub carrier_name:           Option<String>,
  pub mode:                   Option<String>,
  pub origin_port_code:       Option<String>,
  pub origin_port_name:       Option<String>,
  pub origin_country:         Option<String>,
  pub origin_region:          Option<String>,
  pub dest_port_code:         Option<String>,
  pub dest_port_name:         Option<String>,
  pub dest_country:           Option<String>,
  pub dest_region:            Option<String>,
  #[serde(deserialize_with = "lenient_date")]
  pub ship_date:              Option<NaiveDate>,
  #[serde(deserialize_with = "lenient_date")]
  pub promised_delivery_date: Option<NaiveDate>,
  #[serde(deserialize_with = "lenient_date")]
  pub actual_delivery_date:   Option<NaiveDate>,
  #[serde(deserialize_with = "lenient_f64")]
  pub weight_kg:              Option<f64>,
  #[serde(deserialize_with = "lenient_f64")]
  pub cost_usd:               Option<f64>,
  pub status:                 Option<String>,
}

// ─── Validated record ────────────────────────────────────────────────────────

/// A port as observed in one role (origin or destination) of a shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct PortObservation {
  pub code:    String,
  pub name:    Option<String>,
  pub country: Option<String>,
  pub region:  Option<String>,
}

/// A shipment whose key columns (`shipment_id`, `ship_date`, `carrier_name`
/// and both port codes) are known to be present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidShipment {
  pub shipment_id:            String,
  pub customer_id:            Option<String>,
  pub customer_name:          Option<String>,
  pub segment:                Option<String>,
  pub carrier_name:           String,
  pub mode:                   Option<String>,
  pub origin:                 PortObservation,
  pub dest:                   PortObservation,
  pub ship_date:              NaiveDate,
  pub promised_delivery_date: Option<NaiveDate>,
  pub actual_delivery_date:   Option<NaiveDate>,
  pub weight_kg:              Option<f64>,
  pub cost_usd:               Option<f64>,
  pub status:                 Option<String>,
}

impl ValidShipment {
  /// Lift a raw record, returning `None` if any key column is absent.
  pub(crate) fn from_record(r: ShipmentRecord) -> Option<Self> {
    Some(Self {
      shipment_id:            r.shipment_id?,
      customer_id:            r.customer_id,
      customer_name:          r.customer_name,
      segment:                r.segment,
      carrier_name:           r.carrier_name?,
      mode:                   r.mode,
      origin:                 PortObservation {
        code:    r.origin_port_code?,
        name:    r.origin_port_name,
        country: r.origin_country,
        region:  r.origin_region,
      },
      dest:                   PortObservation {
        code:    r.dest_port_code?,
        name:    r.dest_port_name,
        country: r.dest_country,
        region:  r.dest_region,
      },
      ship_date:              r.ship_date?,
      promised_delivery_date: r.promised_delivery_date,
      actual_delivery_date:   r.actual_delivery_date,
      weight_kg:              r.weight_kg,
      cost_usd:               r.cost_usd,
      status:                 r.status,
    })
  }
}
