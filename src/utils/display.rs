//! Display and printing utilities

use tracing::{error, info, warn};
use crate::{
    config::Config,
    execution::{WorkflowReport, WorkflowStatus},
    types::{HaltReason, SequenceReport, TransactionState},
};

pub fn print_configuration(config: &Config) {
    info!("📋 Configuration:");
    info!("   Network: {} ({:?})", config.network, config.network_kind());
    info!("   RPC endpoints: {}", config.rpc_urls.iter().filter(|(_, url)| url.is_some()).count());
    info!("   Deposit: {} ETH", config.deposit_amount_eth);
    info!("   Sizing buffer: {:?}", config.sizing_buffer);
    info!("   Safety fraction: {}", config.safety_fraction);
    info!("   Flashloan gas limit: {}", config.flashloan_gas_limit);
    info!("   Default gas price: {} gwei", config.default_gas_price_gwei);
    if let Some(cap) = config.max_gas_price_gwei {
        info!("   Gas price cap: {} gwei", cap);
    }
    info!("   Min confirmations: {}", config.min_confirmations);
    info!("   Confirmation timeout: {}s", config.confirmation_timeout_secs);
    match &config.flashloan_contract {
        Some(contract) => info!("   Contract: {}", contract),
        None => info!("   Contract: deploy from {:?}", config.bytecode_path),
    }
}

pub fn print_sequence(title: &str, sequence: &SequenceReport) {
    info!("   {}:", title);
    for outcome in &sequence.outcomes {
        let marker = match outcome.state {
            TransactionState::Confirmed => "✅",
            TransactionState::Rejected => "❌",
            TransactionState::PendingTimeout => "⏳",
            _ => "•",
        };
        info!(
            "     {} {} {} via {} ({} confirmations, {}ms)",
            marker,
            outcome.method,
            outcome.transaction_id,
            outcome.endpoint,
            outcome.confirmations_observed,
            outcome.elapsed_ms
        );
        if let Some(receipt) = &outcome.receipt_summary {
            info!("        block {:?}, gas used {}", receipt.block_number, receipt.gas_used);
        }
    }
}

pub fn print_workflow_report(report: &WorkflowReport) {
    info!("\n📊 Flashloan Run {}", report.run_id);
    info!("   Account: {}", report.account);
    if let Some(contract) = report.contract {
        info!("   Contract: {}", contract);
    }
    info!("   Balance: {} ETH", report.balance_eth);
    info!("   Gas price: {} wei ({})", report.gas_price.wei, report.gas_price.source);

    if let Some(size) = &report.sizing {
        info!("   Sizing:");
        info!("     Gas cost: {} ETH", size.gas_cost);
        info!("     Buffer:   {} ETH", size.buffer);
        info!("     Usable:   {} ETH", size.usable);
        info!("     Amount:   {} WETH", size.amount);
    }

    for setup in &report.setup {
        print_sequence("Setup", setup);
    }
    if let Some(sequence) = &report.sequence {
        print_sequence("Flashloan sequence", sequence);
    }

    match &report.status {
        WorkflowStatus::Completed => info!("🎉 Flashloan workflow completed"),
        WorkflowStatus::SizingRejected(reason) => warn!("🛑 Skipped: {}", reason),
        WorkflowStatus::Halted(reason) => print_halt(reason),
    }
    info!("");
}

fn print_halt(reason: &HaltReason) {
    match reason {
        HaltReason::Rejected { index, tx_hash, reason } => match tx_hash {
            Some(tx_hash) => error!("❌ Step {} rejected ({}): {}", index + 1, tx_hash, reason),
            None => error!("❌ Step {} rejected by node: {}", index + 1, reason),
        },
        HaltReason::PendingTimeout { index, tx_hash } => {
            warn!("⏳ Step {} still pending ({}); later steps not sent", index + 1, tx_hash)
        }
        HaltReason::SubmissionFailed { index, attempts, cause } => {
            error!("❌ Step {} never submitted after {} attempts: {}", index + 1, attempts, cause)
        }
    }
}
