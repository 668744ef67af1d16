//! SQL schema for the warehouse.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout; there is no migration path.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Insert-only: a date row never changes once written.
CREATE TABLE IF NOT EXISTS dim_date (
    date_key  INTEGER PRIMARY KEY,      -- YYYYMMDD
    date      TEXT    NOT NULL UNIQUE,  -- ISO 8601 calendar date
    month     INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    quarter   INTEGER NOT NULL CHECK (quarter BETWEEN 1 AND 4),
    year      INTEGER NOT NULL
);

-- Mutable dimensions: attributes are last-writer-wins, keys are stable.
-- No DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS dim_port (
    port_key  INTEGER PRIMARY KEY,
    port_code TEXT NOT NULL UNIQUE,
    port_name TEXT NOT NULL,
    country   TEXT NOT NULL,
    region    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_carrier (
    carrier_key  INTEGER PRIMARY KEY,
    carrier_name TEXT NOT NULL UNIQUE,
    mode         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dim_customer (
    customer_key  INTEGER PRIMARY KEY,
    customer_id   TEXT NOT NULL UNIQUE,
    customer_name TEXT NOT NULL,
    segment       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fact_shipment (
    shipment_id            TEXT PRIMARY KEY,
    date_key               INTEGER NOT NULL REFERENCES dim_date(date_key),
    origin_port_key        INTEGER REFERENCES dim_port(port_key),
    dest_port_key          INTEGER REFERENCES dim_port(port_key),
    carrier_key            INTEGER REFERENCES dim_carrier(carrier_key),
    customer_key           INTEGER REFERENCES dim_customer(customer_key),
    promised_delivery_date TEXT,
    actual_delivery_date   TEXT,
    planned_days           INTEGER,
    actual_days            INTEGER,
    delay_days             INTEGER,
    on_time_flag           INTEGER NOT NULL CHECK (on_time_flag IN (0, 1)),
    weight_kg              REAL,
    cost_usd               REAL,
    status                 TEXT
);

-- Raw copy of the batch being loaded. Cleared at the start of every load,
-- so every column is nullable and nothing is unique.
CREATE TABLE IF NOT EXISTS stg_shipments_raw (
    shipment_id            TEXT,
    customer_id            TEXT,
    customer_name          TEXT,
    segment                TEXT,
    carrier_name           TEXT,
    mode                   TEXT,
    origin_port_code       TEXT,
    origin_port_name       TEXT,
    origin_country         TEXT,
    origin_region          TEXT,
    dest_port_code         TEXT,
    dest_port_name         TEXT,
    dest_country           TEXT,
    dest_region            TEXT,
    ship_date              TEXT,
    promised_delivery_date TEXT,
    actual_delivery_date   TEXT,
    weight_kg              REAL,
    cost_usd               REAL,
    status                 TEXT
);

CREATE INDEX IF NOT EXISTS fact_shipment_date_idx     ON fact_shipment(date_key);
CREATE INDEX IF NOT EXISTS fact_shipment_carrier_idx  ON fact_shipment(carrier_key);
CREATE INDEX IF NOT EXISTS fact_shipment_customer_idx ON fact_shipment(customer_key);

PRAGMA user_version = 1;
";
