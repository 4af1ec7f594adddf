//! Transaction intent and outcome types

use alloy::primitives::{Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentTarget {
    Contract(Address),
    /// Contract creation; `input` is the init code with encoded constructor arguments.
    Create,
}

/// One on-chain call, built and ABI-encoded but not yet submitted.
#[derive(Debug, Clone)]
pub struct TransactionIntent {
    pub target: IntentTarget,
    /// Solidity signature, e.g. `approve(address,uint256)`.
    pub method: String,
    pub input: Bytes,
    pub sender: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl TransactionIntent {
    pub fn target_contract(&self) -> Option<Address> {
        match self.target {
            IntentTarget::Contract(address) => Some(address),
            IntentTarget::Create => None,
        }
    }

    /// Method name without the parameter list.
    pub fn method_name(&self) -> &str {
        self.method.split('(').next().unwrap_or(&self.method)
    }
}

/// Where a submitted transaction ended up. Built intents are `TransactionIntent`s and
/// submitted ones are tracked by hash until they land in one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    Confirmed,
    PendingTimeout,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptSummary {
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
    pub contract_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionOutcome {
    pub method: String,
    pub transaction_id: TxHash,
    pub endpoint: String,
    pub state: TransactionState,
    pub confirmed: bool,
    pub confirmations_observed: u64,
    pub receipt_summary: Option<ReceiptSummary>,
    pub submitted_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Why `execute_sequence` stopped before the last intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    /// `tx_hash` is `None` when the node refused the transaction outright.
    Rejected { index: usize, tx_hash: Option<TxHash>, reason: String },
    PendingTimeout { index: usize, tx_hash: TxHash },
    SubmissionFailed { index: usize, attempts: u32, cause: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceReport {
    pub outcomes: Vec<TransactionOutcome>,
    pub halted: Option<HaltReason>,
}

impl SequenceReport {
    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }

    pub fn confirmed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.confirmed).count()
    }

    /// Continues this report with a later part of the same sequence.
    ///
    /// Halt indices of `next` are shifted so they stay positions in the combined sequence.
    pub fn append(&mut self, next: SequenceReport) {
        let offset = self.outcomes.len();
        self.outcomes.extend(next.outcomes);
        self.halted = next.halted.map(|halted| halted.shifted(offset));
    }
}

impl HaltReason {
    fn shifted(mut self, offset: usize) -> Self {
        match &mut self {
            HaltReason::Rejected { index, .. }
            | HaltReason::PendingTimeout { index, .. }
            | HaltReason::SubmissionFailed { index, .. } => *index += offset,
        }
        self
    }
}
