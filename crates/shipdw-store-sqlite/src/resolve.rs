//! Dimension upserts and the read-back of store-assigned surrogate keys.
//!
//! All functions run against the load's open transaction. Any statement
//! failure is tagged with the dimension it happened in and aborts the load.

use rusqlite::Connection;
use shipdw_core::dimension::{Dimension, DimensionRows, KeyMap, KeyMaps};

use crate::{Error, Result, encode::encode_date};

/// Row counts written per dimension during one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
  pub dates_inserted:     usize,
  pub ports_upserted:     usize,
  pub carriers_upserted:  usize,
  pub customers_upserted: usize,
}

/// Upsert every dimension row of the batch, then read each mutable
/// dimension back in full to build its key map.
pub fn resolve_dimensions(
  conn: &Connection,
  rows: &DimensionRows,
) -> Result<(KeyMaps, ResolveStats)> {
  let stats = ResolveStats {
    dates_inserted:     tagged(Dimension::Date, insert_dates(conn, rows))?,
    ports_upserted:     tagged(Dimension::Port, upsert_ports(conn, rows))?,
    carriers_upserted:  tagged(Dimension::Carrier, upsert_carriers(conn, rows))?,
    customers_upserted: tagged(Dimension::Customer, upsert_customers(conn, rows))?,
  };

  let keys = KeyMaps {
    ports:     tagged(
      Dimension::Port,
      fetch_key_map(conn, "SELECT port_code, port_key FROM dim_port"),
    )?,
    carriers:  tagged(
      Dimension::Carrier,
      fetch_key_map(conn, "SELECT carrier_name, carrier_key FROM dim_carrier"),
    )?,
    customers: tagged(
      Dimension::Customer,
      fetch_key_map(conn, "SELECT customer_id, customer_key FROM dim_customer"),
    )?,
  };

  Ok((keys, stats))
}

fn tagged<T>(dimension: Dimension, result: rusqlite::Result<T>) -> Result<T> {
  result.map_err(|source| Error::Resolution { dimension, source })
}

/// Returns the number of dates that were new.
fn insert_dates(conn: &Connection, rows: &DimensionRows) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO dim_date (date_key, date, month, quarter, year)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (date_key) DO NOTHING",
  )?;
  let mut inserted = 0;
  for d in &rows.dates {
    inserted += stmt.execute(rusqlite::params![
      d.date_key,
      encode_date(d.date),
      d.month,
      d.quarter,
      d.year,
    ])?;
  }
  Ok(inserted)
}

fn upsert_ports(conn: &Connection, rows: &DimensionRows) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO dim_port (port_code, port_name, country, region)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (port_code) DO UPDATE SET
       port_name = excluded.port_name,
       country   = excluded.country,
       region    = excluded.region",
  )?;
  let mut written = 0;
  for p in &rows.ports {
    written += stmt.execute(rusqlite::params![p.port_code, p.port_name, p.country, p.region])?;
  }
  Ok(written)
}

fn upsert_carriers(conn: &Connection, rows: &DimensionRows) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO dim_carrier (carrier_name, mode)
     VALUES (?1, ?2)
     ON CONFLICT (carrier_name) DO UPDATE SET mode = excluded.mode",
  )?;
  let mut written = 0;
  for c in &rows.carriers {
    written += stmt.execute(rusqlite::params![c.carrier_name, c.mode])?;
  }
  Ok(written)
}

fn upsert_customers(conn: &Connection, rows: &DimensionRows) -> rusqlite::Result<usize> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO dim_customer (customer_id, customer_name, segment)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (customer_id) DO UPDATE SET
       customer_name = excluded.customer_name,
       segment       = excluded.segment",
  )?;
  let mut written = 0;
  for c in &rows.customers {
    written += stmt.execute(rusqlite::params![c.customer_id, c.customer_name, c.segment])?;
  }
  Ok(written)
}

/// `sql` must select `(natural_key, surrogate_key)`.
fn fetch_key_map(conn: &Connection, sql: &str) -> rusqlite::Result<KeyMap> {
  let mut stmt = conn.prepare(sql)?;
  let map = stmt
    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
    .collect::<rusqlite::Result<KeyMap>>()?;
  Ok(map)
}
