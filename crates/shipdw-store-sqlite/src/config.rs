//! Connection settings for [`SqliteWarehouse`](crate::SqliteWarehouse).

use std::path::PathBuf;

use serde::Deserialize;

/// Where the warehouse lives and how long to wait on a locked database.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
}

impl Default for WarehouseConfig {
  fn default() -> Self {
    Self {
      store_path:      default_store_path(),
      busy_timeout_ms: default_busy_timeout_ms(),
    }
  }
}

fn default_store_path() -> PathBuf { PathBuf::from("shipdw.sqlite") }

fn default_busy_timeout_ms() -> u64 { 5_000 }
