//! Append-only deployment log

use alloy::primitives::{Address, TxHash};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const DEFAULT_DEPLOYMENT_LOG: &str = "output/deployments/deployed_flashloan_contract.log";

pub fn record_deployment(log_path: &Path, tx_hash: TxHash, contract: Address) -> Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open deployment log {}", log_path.display()))?;

    writeln!(file, "{} tx={} contract={}", Utc::now().to_rfc3339(), tx_hash, contract)?;

    info!(tx_hash = %tx_hash, contract = %contract, "Recorded deployment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_records() {
        let dir = std::env::temp_dir().join(format!("deploy-log-{}", uuid::Uuid::new_v4()));
        let log = dir.join("nested").join("deployments.log");

        record_deployment(&log, TxHash::repeat_byte(0xab), Address::repeat_byte(0x11)).unwrap();
        record_deployment(&log, TxHash::repeat_byte(0xcd), Address::repeat_byte(0x22)).unwrap();

        let body = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("tx=0xabab"));
        assert!(lines[1].contains(&format!("contract={}", Address::repeat_byte(0x22))));

        fs::remove_dir_all(dir).ok();
    }
}
