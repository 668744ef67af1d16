//! Integration tests for `SqliteWarehouse` against an in-memory database.

use std::time::Instant;

use chrono::NaiveDate;
use shipdw_core::{
  dimension::Dimension,
  record::ShipmentRecord,
  validate::{RequiredColumn, Violation},
  warehouse::{TableCounts, Warehouse},
};

use crate::{Error, LoadStage, SqliteWarehouse};

async fn store() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory store")
}

fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

fn shipment(id: &str, origin: &str, dest: &str) -> ShipmentRecord {
  ShipmentRecord {
    shipment_id:            Some(id.into()),
    customer_id:            Some("C001".into()),
    customer_name:          Some("NorthStar Imports".into()),
    segment:                Some("Retail".into()),
    carrier_name:           Some("Maersk".into()),
    mode:                   Some("Sea".into()),
    origin_port_code:       Some(origin.into()),
    origin_port_name:       Some(format!("{origin} terminal")),
    origin_country:         Some("CN".into()),
    origin_region:          Some("APAC".into()),
    dest_port_code:         Some(dest.into()),
    dest_port_name:         Some(format!("{dest} terminal")),
    dest_country:           Some("US".into()),
    dest_region:            Some("NA".into()),
    ship_date:              Some(d("2025-01-01")),
    promised_delivery_date: Some(d("2025-01-10")),
    actual_delivery_date:   Some(d("2025-01-12")),
    weight_kg:              Some(2400.0),
    cost_usd:               Some(1032.75),
    status:                 Some("Delivered".into()),
  }
}

fn baseline_batch() -> Vec<ShipmentRecord> {
  let mut second = shipment("SHP-202502-00002", "USLAX", "NLRTM");
  second.ship_date = Some(d("2025-02-03"));
  second.promised_delivery_date = Some(d("2025-02-20"));
  second.actual_delivery_date = Some(d("2025-02-19"));
  second.customer_id = Some("C002".into());
  second.customer_name = Some("Pacific Manufacturing".into());
  vec![shipment("SHP-202501-00001", "CNSHA", "USLAX"), second]
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_populates_dimensions_and_facts() {
  let s = store().await;

  let report = s.load(baseline_batch()).await.unwrap();
  assert_eq!(report.rows_loaded, 2);
  assert_eq!(report.dates_inserted, 2);
  assert_eq!(report.ports_upserted, 3);
  assert_eq!(report.carriers_upserted, 1);
  assert_eq!(report.customers_upserted, 2);

  let snap = s.snapshot().await.unwrap();
  assert_eq!(snap.counts(), TableCounts {
    dates:     2,
    ports:     3,
    carriers:  1,
    customers: 2,
    facts:     2,
    staged:    2,
  });

  let fact = snap.fact("SHP-202501-00001").unwrap();
  let cnsha = snap.ports.iter().find(|p| p.port_code == "CNSHA").unwrap();
  let uslax = snap.ports.iter().find(|p| p.port_code == "USLAX").unwrap();
  assert_eq!(fact.origin_port_key, Some(cnsha.port_key));
  assert_eq!(fact.dest_port_key, Some(uslax.port_key));
  assert_eq!(fact.carrier_key, Some(snap.carriers[0].carrier_key));
  assert_eq!(fact.date_key, 20250101);
}

#[tokio::test]
async fn derived_metrics_are_persisted() {
  let s = store().await;
  s.load(vec![shipment("SHP-1", "CNSHA", "USLAX")]).await.unwrap();

  let snap = s.snapshot().await.unwrap();
  let fact = snap.fact("SHP-1").unwrap();
  assert_eq!(fact.planned_days, Some(9));
  assert_eq!(fact.actual_days, Some(11));
  assert_eq!(fact.delay_days, Some(2));
  assert!(!fact.on_time_flag);
  assert_eq!(fact.promised_delivery_date, Some(d("2025-01-10")));
  assert_eq!(fact.weight_kg, Some(2400.0));
  assert_eq!(fact.status.as_deref(), Some("Delivered"));
}

#[tokio::test]
async fn missing_actual_date_is_loaded_with_absent_metrics() {
  let s = store().await;
  let mut r = shipment("SHP-1", "CNSHA", "USLAX");
  r.actual_delivery_date = None;
  r.status = Some("In Transit".into());
  s.load(vec![r]).await.unwrap();

  let snap = s.snapshot().await.unwrap();
  let fact = snap.fact("SHP-1").unwrap();
  assert_eq!(fact.planned_days, Some(9));
  assert_eq!(fact.actual_days, None);
  assert_eq!(fact.delay_days, None);
  assert!(!fact.on_time_flag);
}

#[tokio::test]
async fn date_dimension_rows() {
  let s = store().await;
  s.load(baseline_batch()).await.unwrap();

  let snap = s.snapshot().await.unwrap();
  let keys: Vec<_> = snap.dates.iter().map(|row| row.date_key).collect();
  assert_eq!(keys, [20250101, 20250203]);
  assert_eq!(snap.dates[1].month, 2);
  assert_eq!(snap.dates[1].quarter, 1);
  assert_eq!(snap.dates[1].year, 2025);
}

// ─── Re-runs ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reloading_the_same_batch_is_idempotent() {
  let s = store().await;

  s.load(baseline_batch()).await.unwrap();
  let first = s.snapshot().await.unwrap();

  let report = s.load(baseline_batch()).await.unwrap();
  let second = s.snapshot().await.unwrap();

  assert_eq!(first, second);
  assert_eq!(report.rows_loaded, 2);
  assert_eq!(report.dates_inserted, 0);
}

#[tokio::test]
async fn reload_replaces_fact_and_keeps_surrogate_keys() {
  let s = store().await;
  s.load(vec![shipment("SHP-1", "CNSHA", "USLAX")]).await.unwrap();
  let before = s.snapshot().await.unwrap();

  let mut changed = shipment("SHP-1", "CNSHA", "USLAX");
  changed.mode = Some("Rail".into());
  changed.origin_port_name = Some("Shanghai Yangshan".into());
  changed.customer_name = Some("NorthStar Global".into());
  changed.actual_delivery_date = None;
  changed.cost_usd = None;
  changed.status = Some("In Transit".into());
  s.load(vec![changed]).await.unwrap();

  let after = s.snapshot().await.unwrap();
  assert_eq!(after.counts(), before.counts());

  // Last writer wins on mutable attributes; keys do not move.
  assert_eq!(after.carriers[0].mode, "Rail");
  assert_eq!(after.carriers[0].carrier_key, before.carriers[0].carrier_key);
  let port = after.ports.iter().find(|p| p.port_code == "CNSHA").unwrap();
  assert_eq!(port.port_name, "Shanghai Yangshan");
  assert_eq!(after.customers[0].customer_name, "NorthStar Global");

  // Full replace, not a merge.
  let fact = after.fact("SHP-1").unwrap();
  assert_eq!(fact.actual_delivery_date, None);
  assert_eq!(fact.actual_days, None);
  assert_eq!(fact.cost_usd, None);
  assert_eq!(fact.status.as_deref(), Some("In Transit"));
}

#[tokio::test]
async fn existing_dates_are_left_untouched() {
  let s = store().await;
  s.load(vec![shipment("SHP-1", "CNSHA", "USLAX")]).await.unwrap();

  let mut later = shipment("SHP-2", "CNSHA", "USLAX");
  later.ship_date = Some(d("2025-04-01"));
  later.promised_delivery_date = None;
  later.actual_delivery_date = None;
  let report = s
    .load(vec![shipment("SHP-1", "CNSHA", "USLAX"), later])
    .await
    .unwrap();

  assert_eq!(report.dates_inserted, 1);
  let snap = s.snapshot().await.unwrap();
  assert_eq!(snap.dates.len(), 2);
  assert_eq!(snap.dates[1].quarter, 2);
}

// ─── Referential tolerance ───────────────────────────────────────────────────

// Current behaviour: a shipment whose customer cannot be resolved is still
// loaded, with a null customer key, rather than rejected.
#[tokio::test]
async fn unresolved_customer_loads_with_null_key() {
  let s = store().await;
  let mut r = shipment("SHP-1", "CNSHA", "USLAX");
  r.customer_id = None;

  let report = s.load(vec![r]).await.unwrap();
  assert_eq!(report.rows_loaded, 1);
  assert_eq!(report.customers_upserted, 0);

  let snap = s.snapshot().await.unwrap();
  assert!(snap.customers.is_empty());
  let fact = snap.fact("SHP-1").unwrap();
  assert_eq!(fact.customer_key, None);
  assert!(fact.origin_port_key.is_some());
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_batch_reports_every_violation_and_writes_nothing() {
  let s = store().await;
  s.load(baseline_batch()).await.unwrap();
  let before = s.snapshot().await.unwrap();

  let mut negative = shipment("SHP-9", "SGSIN", "DEHAM");
  negative.cost_usd = Some(-5.0);
  let mut no_carrier = shipment("SHP-10", "SGSIN", "DEHAM");
  no_carrier.carrier_name = None;
  let batch = vec![
    shipment("SHP-9", "SGSIN", "DEHAM"),
    negative,
    no_carrier,
  ];

  let err = s.load(batch).await.unwrap_err();
  let report = match err {
    Error::Validation(report) => report,
    other => panic!("expected validation failure, got {other:?}"),
  };
  assert_eq!(report.violations(), &[
    Violation::DuplicateShipmentId,
    Violation::MissingValue(RequiredColumn::CarrierName),
    Violation::NegativeCost,
  ]);

  // Staging was cleared and refilled inside the transaction; both undone.
  assert_eq!(s.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn fact_upsert_failure_rolls_back_the_whole_load() {
  let s = store().await;
  s.load(baseline_batch()).await.unwrap();
  let before = s.snapshot().await.unwrap();

  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER reject_boom BEFORE INSERT ON fact_shipment
         WHEN NEW.shipment_id = 'SHP-BOOM'
         BEGIN SELECT RAISE(ABORT, 'forced fact failure'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  // New ports, carrier and date, an attribute change, a fact update, and
  // finally the poisoned shipment.
  let mut update = shipment("SHP-202501-00001", "CNSHA", "USLAX");
  update.customer_name = Some("Renamed Imports".into());
  update.status = Some("Lost".into());
  let mut fresh = shipment("SHP-NEW", "SGSIN", "DEHAM");
  fresh.carrier_name = Some("Hapag-Lloyd".into());
  fresh.ship_date = Some(d("2025-06-01"));
  fresh.promised_delivery_date = None;
  fresh.actual_delivery_date = None;
  let boom = shipment("SHP-BOOM", "AEJEA", "USLAX");

  let err = s.load(vec![update, fresh, boom]).await.unwrap_err();
  assert!(matches!(err, Error::Upsert(_)), "got {err:?}");

  assert_eq!(s.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn dimension_failure_names_the_dimension() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER reject_carriers BEFORE INSERT ON dim_carrier
         BEGIN SELECT RAISE(ABORT, 'carriers frozen'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.load(baseline_batch()).await.unwrap_err();
  assert!(
    matches!(err, Error::Resolution { dimension: Dimension::Carrier, .. }),
    "got {err:?}"
  );

  let snap = s.snapshot().await.unwrap();
  assert_eq!(snap.counts(), TableCounts::default());
}

#[tokio::test]
async fn passed_deadline_rolls_back() {
  let s = store().await;

  let err = s
    .load_until(baseline_batch(), Instant::now())
    .await
    .unwrap_err();
  assert!(
    matches!(err, Error::DeadlineExceeded(LoadStage::Staged)),
    "got {err:?}"
  );

  let snap = s.snapshot().await.unwrap();
  assert_eq!(snap.counts(), TableCounts::default());
}

#[tokio::test]
async fn store_is_usable_after_a_failed_load() {
  let s = store().await;

  let mut bad = shipment("SHP-1", "CNSHA", "USLAX");
  bad.weight_kg = Some(0.0);
  assert!(s.load(vec![bad]).await.is_err());

  let report = s.load(baseline_batch()).await.unwrap();
  assert_eq!(report.rows_loaded, 2);
}
