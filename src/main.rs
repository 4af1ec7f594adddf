//! Flashloan Orchestrator - Main Entry Point
//!
//! `flashloan-orchestrator [run|snapshot|revert]`

use flashloan_orchestrator::*;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use flashloan_orchestrator::{
    execution::{resolve_account, FlashloanWorkflow, WorkflowSettings, WorkflowStatus},
    network::{check_connection, AlloyConnector, ChainClient, GasPriceOracle},
    snapshot::SnapshotManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Snapshot,
    Revert,
}

impl Command {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("run") => Some(Self::Run),
            Some("snapshot") => Some(Self::Snapshot),
            Some("revert") => Some(Self::Revert),
            Some(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let arg = std::env::args().nth(1);
    let Some(command) = Command::parse(arg.as_deref()) else {
        eprintln!("usage: flashloan-orchestrator [run|snapshot|revert]");
        std::process::exit(2);
    };

    // Load configuration
    let config = CONFIG.clone();

    // Initialize logging
    let _logging_guard = utils::setup_logging()?;
    utils::setup_output_directories(&config.executions_dir, &config.deployment_log, &config.snapshot_file)?;

    info!("⚡ Flashloan Orchestrator v{}", env!("CARGO_PKG_VERSION"));
    utils::print_configuration(&config);

    config.validate()?;
    let kind = config.network_kind();
    let pool = Arc::new(config.endpoint_pool()?);
    let execution = config.execution_config();

    info!("🔗 Connecting through {} RPC endpoints...", pool.len());
    let (client, block) = check_connection(&pool, &AlloyConnector::default(), &execution.submission)
        .await
        .map_err(|e| {
            error!("No RPC endpoint answered");
            anyhow::anyhow!("Network connection failed: {}", e)
        })?;
    info!("✅ Connected via {} at block {}", client.endpoint(), block);

    if command != Command::Run {
        if !kind.is_test_node() {
            return Err(anyhow::anyhow!(
                "Snapshots are only available on local and fork networks, not {}", config.network
            ));
        }

        let manager = SnapshotManager::new(config.snapshot_file.clone());
        match command {
            Command::Snapshot => {
                let snapshot = manager.capture(&client).await?;
                info!("Snapshot {} saved to {}", snapshot.id, manager.path().display());
            }
            _ => {
                if !manager.restore(&client).await {
                    warn!("Chain state was not reverted");
                    std::process::exit(1);
                }
            }
        }
        return Ok(());
    }

    let account = resolve_account(kind, config.private_key.as_deref(), config.account_index, &client).await?;
    info!("👤 Using account {}", account.address());

    let workflow = FlashloanWorkflow::new(
        pool,
        AlloyConnector::new(Some(&account)),
        GasPriceOracle::new(config.gas_oracle_config()),
        execution,
        WorkflowSettings::from_config(&config)?,
    );

    let report = workflow.run(&account).await?;
    utils::print_workflow_report(&report);

    match report.status {
        WorkflowStatus::Halted(reason) => Err(anyhow::anyhow!("Flashloan sequence halted: {:?}", reason)),
        _ => Ok(()),
    }
}
