//! Batch-level data-quality rules.
//!
//! Every rule runs over the whole batch and contributes at most one
//! [`Violation`]. The validator never stops at the first failure, so a caller
//! always receives the complete report in one pass.

use std::{collections::HashSet, fmt};

use thiserror::Error;

use crate::record::{ShipmentRecord, ValidShipment};

// ─── Required columns ────────────────────────────────────────────────────────

/// Columns that must be present in every record of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredColumn {
  ShipmentId,
  ShipDate,
  CarrierName,
  OriginPortCode,
  DestPortCode,
}

impl RequiredColumn {
  /// Report order.
  pub const ALL: [Self; 5] = [
    Self::ShipmentId,
    Self::ShipDate,
    Self::CarrierName,
    Self::OriginPortCode,
    Self::DestPortCode,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::ShipmentId => "shipment_id",
      Self::ShipDate => "ship_date",
      Self::CarrierName => "carrier_name",
      Self::OriginPortCode => "origin_port_code",
      Self::DestPortCode => "dest_port_code",
    }
  }

  pub fn is_absent(self, r: &ShipmentRecord) -> bool {
    match self {
      Self::ShipmentId => r.shipment_id.is_none(),
      Self::ShipDate => r.ship_date.is_none(),
      Self::CarrierName => r.carrier_name.is_none(),
      Self::OriginPortCode => r.origin_port_code.is_none(),
      Self::DestPortCode => r.dest_port_code.is_none(),
    }
  }
}

impl fmt::Display for RequiredColumn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

// ─── Violations ──────────────────────────────────────────────────────────────

/// A single failed rule. The `Display` text is the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
  #[error("shipment_id contains duplicates")]
  DuplicateShipmentId,
  #[error("{0} has nulls")]
  MissingValue(RequiredColumn),
  #[error("cost_usd has negative values")]
  NegativeCost,
  #[error("weight_kg has non-positive values")]
  NonPositiveWeight,
  #[error("promised_delivery_date earlier than ship_date")]
  PromisedBeforeShip,
  #[error("actual_delivery_date earlier than ship_date")]
  ActualBeforeShip,
}

/// The full, ordered list of rules a batch failed. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
  violations: Vec<Violation>,
}

impl ValidationReport {
  pub fn violations(&self) -> &[Violation] { &self.violations }

  pub fn contains(&self, v: Violation) -> bool { self.violations.contains(&v) }

  /// The report as plain message strings, in rule order.
  pub fn messages(&self) -> Vec<String> {
    self.violations.iter().map(ToString::to_string).collect()
  }
}

impl fmt::Display for ValidationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "DATA QUALITY FAILED:")?;
    for v in &self.violations {
      write!(f, "\n- {v}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationReport {}

// ─── Validated batch ─────────────────────────────────────────────────────────

/// A batch that passed every rule. Only this type is accepted by dimension
/// collection and the fact builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
  shipments: Vec<ValidShipment>,
}

impl ValidatedBatch {
  pub fn iter(&self) -> std::slice::Iter<'_, ValidShipment> { self.shipments.iter() }

  pub fn len(&self) -> usize { self.shipments.len() }

  pub fn is_empty(&self) -> bool { self.shipments.is_empty() }
}

impl<'a> IntoIterator for &'a ValidatedBatch {
  type Item = &'a ValidShipment;
  type IntoIter = std::slice::Iter<'a, ValidShipment>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}

// ─── Validator ───────────────────────────────────────────────────────────────

/// Run every rule over `records`.
///
/// Absent optional values (cost, weight, promised/actual dates) never violate
/// the numeric or date-ordering rules; only present values are compared.
pub fn validate(records: &[ShipmentRecord]) -> Result<ValidatedBatch, ValidationReport> {
  let mut violations = Vec::new();

  let mut seen = HashSet::new();
  if records
    .iter()
    .filter_map(|r| r.shipment_id.as_deref())
    .any(|id| !seen.insert(id))
  {
    violations.push(Violation::DuplicateShipmentId);
  }

  for column in RequiredColumn::ALL {
    if records.iter().any(|r| column.is_absent(r)) {
      violations.push(Violation::MissingValue(column));
    }
  }

  if records.iter().any(|r| r.cost_usd.is_some_and(|c| c < 0.0)) {
    violations.push(Violation::NegativeCost);
  }
  if records.iter().any(|r| r.weight_kg.is_some_and(|w| w <= 0.0)) {
    violations.push(Violation::NonPositiveWeight);
  }

  if records.iter().any(|r| precedes(r.promised_delivery_date, r)) {
    violations.push(Violation::PromisedBeforeShip);
  }
  if records.iter().any(|r| precedes(r.actual_delivery_date, r)) {
    violations.push(Violation::ActualBeforeShip);
  }

  if !violations.is_empty() {
    return Err(ValidationReport { violations });
  }

  let shipments = records
    .iter()
    .cloned()
    .filter_map(ValidShipment::from_record)
    .collect();
  Ok(ValidatedBatch { shipments })
}

fn precedes(date: Option<chrono::NaiveDate>, r: &ShipmentRecord) -> bool {
  matches!((date, r.ship_date), (Some(d), Some(ship)) if d < ship)
}
