//! One warehouse load, start to finish, under a single transaction.
//!
//! [`run_load`] is the only place a load's transaction is opened, committed
//! or rolled back. Everything below it returns errors upward and never
//! touches the transaction's outcome.

use std::time::Instant;

use rusqlite::{Connection, Transaction};
use shipdw_core::{
  dimension::DimensionRows,
  fact::{FactShipment, build_fact},
  record::ShipmentRecord,
  validate::validate,
  warehouse::LoadReport,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{Error, Result, encode::encode_date, resolve::resolve_dimensions};

/// Progress of a load. A failure in any stage rolls the whole load back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
  NotStarted,
  Staged,
  Validated,
  DimensionsResolved,
  FactsBuilt,
  Committed,
  RolledBack,
}

/// Run one load on `conn`.
///
/// If `deadline` passes, the load stops at the next stage boundary and rolls
/// back with [`Error::DeadlineExceeded`].
pub(crate) fn run_load(
  conn: &mut Connection,
  batch: &[ShipmentRecord],
  run_id: Uuid,
  deadline: Option<Instant>,
) -> Result<LoadReport> {
  let tx = conn.transaction()?;
  let mut stage = LoadStage::NotStarted;

  match apply_batch(&tx, batch, run_id, deadline, &mut stage) {
    Ok(report) => {
      // A failed commit drops `tx`, which rolls it back.
      tx.commit()?;
      debug!(%run_id, stage = ?LoadStage::Committed, "stage reached");
      info!(
        %run_id,
        rows_loaded = report.rows_loaded,
        dates_inserted = report.dates_inserted,
        "load committed"
      );
      Ok(report)
    }
    Err(err) => {
      warn!(%run_id, failed_after = ?stage, error = %err, "rolling back load");
      if let Err(rollback_err) = tx.rollback() {
        error!(%run_id, error = %rollback_err, "rollback failed");
      }
      debug!(%run_id, stage = ?LoadStage::RolledBack, "stage reached");
      Err(err)
    }
  }
}

fn apply_batch(
  tx: &Transaction<'_>,
  batch: &[ShipmentRecord],
  run_id: Uuid,
  deadline: Option<Instant>,
  stage: &mut LoadStage,
) -> Result<LoadReport> {
  let staged = stage_batch(tx, batch).map_err(Error::Staging)?;
  advance(stage, LoadStage::Staged, run_id, deadline)?;
  debug!(%run_id, staged, "batch staged");

  let validated = validate(batch).map_err(Error::Validation)?;
  advance(stage, LoadStage::Validated, run_id, deadline)?;

  let rows = DimensionRows::collect(&validated);
  let (keys, stats) = resolve_dimensions(tx, &rows)?;
  advance(stage, LoadStage::DimensionsResolved, run_id, deadline)?;
  debug!(
    %run_id,
    ports = keys.ports.len(),
    carriers = keys.carriers.len(),
    customers = keys.customers.len(),
    "dimension keys resolved"
  );

  let facts: Vec<FactShipment> = validated.iter().map(|s| build_fact(s, &keys)).collect();
  advance(stage, LoadStage::FactsBuilt, run_id, deadline)?;

  let rows_loaded = upsert_facts(tx, &facts).map_err(Error::Upsert)?;
  check_deadline(*stage, deadline)?;

  Ok(LoadReport {
    run_id,
    rows_loaded,
    dates_inserted: stats.dates_inserted,
    ports_upserted: stats.ports_upserted,
    carriers_upserted: stats.carriers_upserted,
    customers_upserted: stats.customers_upserted,
  })
}

fn advance(
  stage: &mut LoadStage,
  next: LoadStage,
  run_id: Uuid,
  deadline: Option<Instant>,
) -> Result<()> {
  *stage = next;
  debug!(%run_id, stage = ?next, "stage reached");
  check_deadline(next, deadline)
}

fn check_deadline(stage: LoadStage, deadline: Option<Instant>) -> Result<()> {
  match deadline {
    Some(d) if Instant::now() >= d => Err(Error::DeadlineExceeded(stage)),
    _ => Ok(()),
  }
}

// ─── Staging ─────────────────────────────────────────────────────────────────

/// Clear the staging relation and copy the raw batch into it.
///
/// The clear is unguarded: two loads interleaving on the same store would
/// see each other's rows. Stores are single-writer.
fn stage_batch(conn: &Connection, batch: &[ShipmentRecord]) -> rusqlite::Result<usize> {
  conn.execute("DELETE FROM stg_shipments_raw", [])?;

  let mut stmt = conn.prepare_cached(
    "INSERT INTO stg_shipments_raw (
       shipment_id, customer_id, customer_name, segment, carrier_name, mode,
       origin_port_code, origin_port_name, origin_country, origin_region,
       dest_port_code, dest_port_name, dest_country, dest_region,
       ship_date, promised_delivery_date, actual_delivery_date,
       weight_kg, cost_usd, status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
               ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
  )?;

  for r in batch {
    stmt.execute(rusqlite::params![
      r.shipment_id,
      r.customer_id,
      r.customer_name,
      r.segment,
      r.carrier_name,
      r.mode,
      r.origin_port_code,
      r.origin_port_name,
      r.origin_country,
      r.origin_region,
      r.dest_port_code,
      r.dest_port_name,
      r.dest_country,
      r.dest_region,
      r.ship_date.map(encode_date),
      r.promised_delivery_date.map(encode_date),
      r.actual_delivery_date.map(encode_date),
      r.weight_kg,
      r.cost_usd,
      r.status,
    ])?;
  }
  Ok(batch.len())
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Insert each fact, or replace every non-key column if its `shipment_id`
/// already exists. Returns the number of rows written.
fn upsert_facts(conn: &Connection, facts: &[FactShipment]) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO fact_shipment (
       shipment_id, date_key, origin_port_key, dest_port_key, carrier_key,
       customer_key, promised_delivery_date, actual_delivery_date,
       planned_days, actual_days, delay_days, on_time_flag,
       weight_kg, cost_usd, status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
     ON CONFLICT (shipment_id) DO UPDATE SET
       date_key               = excluded.date_key,
       origin_port_key        = excluded.origin_port_key,
       dest_port_key          = excluded.dest_port_key,
       carrier_key            = excluded.carrier_key,
       customer_key           = excluded.customer_key,
       promised_delivery_date = excluded.promised_delivery_date,
       actual_delivery_date   = excluded.actual_delivery_date,
       planned_days           = excluded.planned_days,
       actual_days            = excluded.actual_days,
       delay_days             = excluded.delay_days,
       on_time_flag           = excluded.on_time_flag,
       weight_kg              = excluded.weight_kg,
       cost_usd               = excluded.cost_usd,
       status                 = excluded.status",
  )?;

  let mut written = 0;
  for f in facts {
    written += stmt.execute(rusqlite::params![
      f.shipment_id,
      f.date_key,
      f.origin_port_key,
      f.dest_port_key,
      f.carrier_key,
      f.customer_key,
      f.promised_delivery_date.map(encode_date),
      f.actual_delivery_date.map(encode_date),
      f.planned_days,
      f.actual_days,
      f.delay_days,
      f.on_time_flag,
      f.weight_kg,
      f.cost_usd,
      f.status,
    ])?;
  }
  Ok(written)
}
