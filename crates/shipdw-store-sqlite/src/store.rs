//! [`SqliteWarehouse`]: the SQLite implementation of [`Warehouse`].

use std::time::{Duration, Instant};

use shipdw_core::{
  dimension::{DimCarrier, DimCustomer, DimPort},
  record::ShipmentRecord,
  warehouse::{LoadReport, Warehouse, WarehouseSnapshot},
};
use uuid::Uuid;

use crate::{
  Result, WarehouseConfig,
  encode::{RawDimDate, RawFact},
  load::run_load,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A shipment warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Clones share
/// one connection thread, so loads issued through them run one after another;
/// separate processes opening the same file are NOT safe to load
/// concurrently.
#[derive(Clone)]
pub struct SqliteWarehouse {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) the warehouse described by `config`.
  pub async fn open(config: &WarehouseConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&config.store_path).await?;
    let store = Self { conn };
    store
      .init(Duration::from_millis(config.busy_timeout_ms))
      .await?;
    Ok(store)
  }

  /// Open an in-memory warehouse, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(Duration::ZERO).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Like [`Warehouse::load`], but gives up at the first stage boundary after
  /// `deadline` and rolls back.
  ///
  /// The deadline is checked on the connection thread, so the transaction is
  /// always closed even if the caller stops waiting.
  pub async fn load_until(
    &self,
    batch: Vec<ShipmentRecord>,
    deadline: Instant,
  ) -> Result<LoadReport> {
    self.run(batch, Some(deadline)).await
  }

  async fn run(
    &self,
    batch: Vec<ShipmentRecord>,
    deadline: Option<Instant>,
  ) -> Result<LoadReport> {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, records = batch.len(), "starting load");

    self
      .conn
      .call(move |conn| Ok(run_load(conn, &batch, run_id, deadline)))
      .await?
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = crate::Error;

  async fn load(&self, batch: Vec<ShipmentRecord>) -> Result<LoadReport> {
    self.run(batch, None).await
  }

  async fn snapshot(&self) -> Result<WarehouseSnapshot> {
    let (raw_dates, ports, carriers, customers, raw_facts, staged) = self
      .conn
      .call(|conn| {
        let raw_dates = conn
          .prepare("SELECT date_key, date, month, quarter, year FROM dim_date ORDER BY date_key")?
          .query_map([], |row| {
            Ok(RawDimDate {
              date_key: row.get(0)?,
              date:     row.get(1)?,
              month:    row.get(2)?,
              quarter:  row.get(3)?,
              year:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let ports = conn
          .prepare(
            "SELECT port_key, port_code, port_name, country, region
             FROM dim_port ORDER BY port_key",
          )?
          .query_map([], |row| {
            Ok(DimPort {
              port_key:  row.get(0)?,
              port_code: row.get(1)?,
              port_name: row.get(2)?,
              country:   row.get(3)?,
              region:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let carriers = conn
          .prepare("SELECT carrier_key, carrier_name, mode FROM dim_carrier ORDER BY carrier_key")?
          .query_map([], |row| {
            Ok(DimCarrier {
              carrier_key:  row.get(0)?,
              carrier_name: row.get(1)?,
              mode:         row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let customers = conn
          .prepare(
            "SELECT customer_key, customer_id, customer_name, segment
             FROM dim_customer ORDER BY customer_key",
          )?
          .query_map([], |row| {
            Ok(DimCustomer {
              customer_key:  row.get(0)?,
              customer_id:   row.get(1)?,
              customer_name: row.get(2)?,
              segment:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let raw_facts = conn
          .prepare(
            "SELECT
               shipment_id, date_key, origin_port_key, dest_port_key,
               carrier_key, customer_key, promised_delivery_date,
               actual_delivery_date, planned_days, actual_days, delay_days,
               on_time_flag, weight_kg, cost_usd, status
             FROM fact_shipment ORDER BY shipment_id",
          )?
          .query_map([], |row| {
            Ok(RawFact {
              shipment_id:            row.get(0)?,
              date_key:               row.get(1)?,
              origin_port_key:        row.get(2)?,
              dest_port_key:          row.get(3)?,
              carrier_key:            row.get(4)?,
              customer_key:           row.get(5)?,
              promised_delivery_date: row.get(6)?,
              actual_delivery_date:   row.get(7)?,
              planned_days:           row.get(8)?,
              actual_days:            row.get(9)?,
              delay_days:             row.get(10)?,
              on_time_flag:           row.get(11)?,
              weight_kg:              row.get(12)?,
              cost_usd:               row.get(13)?,
              status:                 row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let staged: i64 =
          conn.query_row("SELECT COUNT(*) FROM stg_shipments_raw", [], |row| row.get(0))?;

        Ok((raw_dates, ports, carriers, customers, raw_facts, staged))
      })
      .await?;

    Ok(WarehouseSnapshot {
      dates: raw_dates
        .into_iter()
        .map(RawDimDate::into_dim_date)
        .collect::<Result<_>>()?,
      ports,
      carriers,
      customers,
      facts: raw_facts
        .into_iter()
        .map(RawFact::into_fact)
        .collect::<Result<_>>()?,
      staged: staged as usize,
    })
  }
}
