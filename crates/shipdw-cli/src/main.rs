//! `shipdw`: load shipment batches into the star-schema warehouse.
//!
//! Reads `shipdw.toml` (or the path given with `--config`), overlaid with
//! `SHIPDW_*` environment variables, then runs one subcommand:
//!
//! ```text
//! shipdw load data/shipments.json --clean
//! shipdw load data/shipments.csv --clean --timeout-secs 30
//! shipdw validate data/shipments.jsonl
//! shipdw stats
//! ```
//!
//! Files ending in `.csv` are read as CSV; anything else as JSON.
//!
//! Only one `load` may run against a given store at a time.

use std::{
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use shipdw_core::{
  batch::BatchFormat,
  cleanup::{drop_incomplete, normalize},
  record::ShipmentRecord,
  validate::validate,
  warehouse::Warehouse,
};
use shipdw_store_sqlite::{SqliteWarehouse, WarehouseConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Shipment warehouse loader")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "shipdw.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Validate a batch and load it into the warehouse.
  Load {
    /// CSV, JSON array or JSON-lines file of shipment records.
    input: PathBuf,

    /// Trim text columns and drop records missing a required column.
    #[arg(long)]
    clean: bool,

    /// Roll back if the load has not finished after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
  },

  /// Run the data-quality checks without touching the warehouse.
  Validate {
    input: PathBuf,

    #[arg(long)]
    clean: bool,
  },

  /// Print row counts for every warehouse table.
  Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command {
    Command::Validate { input, clean } => {
      let batch = read_batch(&input, clean)?;
      let validated = validate(&batch).map_err(anyhow::Error::new)?;
      println!("Data quality checks passed ({} records)", validated.len());
    }
    Command::Load { input, clean, timeout_secs } => {
      let batch = read_batch(&input, clean)?;
      let warehouse = open_warehouse(&cli.config).await?;

      let report = match timeout_secs.and_then(deadline_after) {
        Some(deadline) => warehouse.load_until(batch, deadline).await,
        None => warehouse.load(batch).await,
      }
      .context("load failed")?;

      println!(
        "Loaded {} shipments into fact_shipment (run {})",
        report.rows_loaded, report.run_id
      );
    }
    Command::Stats => {
      let warehouse = open_warehouse(&cli.config).await?;
      print_stats(&warehouse).await?;
    }
  }

  Ok(())
}

async fn open_warehouse(config_path: &Path) -> anyhow::Result<SqliteWarehouse> {
  let settings = config::Config::builder()
    .add_source(config::File::from(config_path).required(false))
    .add_source(config::Environment::with_prefix("SHIPDW"))
    .build()
    .context("failed to read config file")?;

  let mut warehouse_cfg: WarehouseConfig = settings
    .try_deserialize()
    .context("failed to deserialise WarehouseConfig")?;
  warehouse_cfg.store_path = expand_tilde(&warehouse_cfg.store_path);

  SqliteWarehouse::open(&warehouse_cfg)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", warehouse_cfg.store_path))
}

fn read_batch(path: &Path, clean: bool) -> anyhow::Result<Vec<ShipmentRecord>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading batch file {}", path.display()))?;
  let mut batch = BatchFormat::from_path(path)
    .parse(&raw)
    .with_context(|| format!("parsing batch file {}", path.display()))?;

  if clean {
    batch.iter_mut().for_each(normalize);
    let (kept, dropped) = drop_incomplete(batch);
    if dropped > 0 {
      tracing::warn!(dropped, kept = kept.len(), "dropped incomplete records");
    }
    batch = kept;
  }

  Ok(batch)
}

/// `secs` from now, or `None` if that is past the end of the clock, in which
/// case the load runs without a deadline.
fn deadline_after(secs: u64) -> Option<Instant> {
  Instant::now().checked_add(Duration::from_secs(secs))
}

async fn print_stats<W: Warehouse>(warehouse: &W) -> anyhow::Result<()> {
  let snapshot = warehouse.snapshot().await?;
  println!("{}", serde_json::to_string_pretty(&snapshot.counts())?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
