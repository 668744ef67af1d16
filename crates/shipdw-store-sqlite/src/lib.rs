//! SQLite backend for the shipment warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each load runs start to finish inside a
//! single closure on that thread, under one transaction.

mod encode;
mod load;
mod resolve;
mod schema;
mod store;

pub mod config;
pub mod error;

pub use config::WarehouseConfig;
pub use error::{Error, Result};
pub use load::LoadStage;
pub use store::SqliteWarehouse;

#[cfg(test)]
mod tests;
