//! The `Warehouse` trait and the values it returns.
//!
//! The trait is implemented by storage backends (e.g. `shipdw-store-sqlite`).
//! The `shipdw` binary depends on this abstraction for everything but opening
//! the store.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  date::DimDate,
  dimension::{DimCarrier, DimCustomer, DimPort},
  fact::FactShipment,
  record::ShipmentRecord,
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// Outcome of a committed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
  /// Identifies the load in logs.
  pub run_id:             Uuid,
  /// Fact rows inserted or replaced.
  pub rows_loaded:        usize,
  /// Date rows that did not exist before this load.
  pub dates_inserted:     usize,
  pub ports_upserted:     usize,
  pub carriers_upserted:  usize,
  pub customers_upserted: usize,
}

/// Full contents of the warehouse tables, each ordered by its key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
  pub dates:     Vec<DimDate>,
  pub ports:     Vec<DimPort>,
  pub carriers:  Vec<DimCarrier>,
  pub customers: Vec<DimCustomer>,
  pub facts:     Vec<FactShipment>,
  /// Rows currently in the staging relation.
  pub staged:    usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  pub dates:     usize,
  pub ports:     usize,
  pub carriers:  usize,
  pub customers: usize,
  pub facts:     usize,
  pub staged:    usize,
}

impl WarehouseSnapshot {
  pub fn counts(&self) -> TableCounts {
    TableCounts {
      dates:     self.dates.len(),
      ports:     self.ports.len(),
      carriers:  self.carriers.len(),
      customers: self.customers.len(),
      facts:     self.facts.len(),
      staged:    self.staged,
    }
  }

  pub fn fact(&self, shipment_id: &str) -> Option<&FactShipment> {
    self.facts.iter().find(|f| f.shipment_id == shipment_id)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a star-schema warehouse backend.
///
/// A load is all-or-nothing: either every staging, dimension and fact write
/// of the batch is committed, or none is. Loads are NOT safe to run
/// concurrently against the same store, since each one clears the shared
/// staging relation.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Validate and load `batch`, returning the number of fact rows written.
  fn load(
    &self,
    batch: Vec<ShipmentRecord>,
  ) -> impl Future<Output = Result<LoadReport, Self::Error>> + Send + '_;

  /// Read every warehouse table.
  fn snapshot(
    &self,
  ) -> impl Future<Output = Result<WarehouseSnapshot, Self::Error>> + Send + '_;
}
