//! Core types and pure loading logic for the shipment warehouse.
//!
//! This crate is deliberately free of database dependencies. It owns the
//! input record shape, the batch validator, dimension row collection, key
//! maps, and the fact builder. Storage backends (e.g. `shipdw-store-sqlite`)
//! implement the [`warehouse::Warehouse`] trait on top of it.

pub mod batch;
pub mod cleanup;
pub mod coerce;
pub mod date;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod record;
pub mod validate;
pub mod warehouse;

pub use error::{Error, Result};
