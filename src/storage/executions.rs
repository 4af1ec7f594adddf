//! Transaction outcome journal

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::types::TransactionOutcome;

pub const DEFAULT_EXECUTIONS_DIR: &str = "output/executions";

/// Appends one JSON line per outcome to `<dir>/outcomes_<date>.jsonl`.
pub fn save_transaction_outcome(dir: &Path, run_id: &str, outcome: &TransactionOutcome) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let filename = dir.join(format!("outcomes_{}.jsonl", Utc::now().format("%Y-%m-%d")));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&filename)?;

    let mut record = serde_json::to_value(outcome)?;
    record["run_id"] = serde_json::Value::String(run_id.to_string());
    writeln!(file, "{}", record)?;

    info!(
        run_id = %run_id,
        tx_hash = %outcome.transaction_id,
        state = ?outcome.state,
        "Saved transaction outcome"
    );

    Ok(filename)
}
