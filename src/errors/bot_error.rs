//! Custom error types for the orchestrator

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
    },

    #[error("RPC call {operation} failed on {endpoint}")]
    Rpc {
        endpoint: String,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Submission of {method} failed on every endpoint after {attempts} attempts")]
    SubmissionExhausted {
        method: String,
        attempts: u32,
        #[source]
        last_error: Option<anyhow::Error>,
    },

    #[error("Node {endpoint} refused {method}: {reason}")]
    NodeRejected {
        endpoint: String,
        method: String,
        reason: String,
    },

    #[error("Snapshot error: {message}")]
    Snapshot {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BotError {
    pub fn config(message: impl Into<String>) -> Self {
        BotError::Configuration { message: message.into() }
    }

    pub fn rpc(endpoint: &str, operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        BotError::Rpc {
            endpoint: endpoint.to_string(),
            operation,
            source: source.into(),
        }
    }

    /// Errors that another endpoint might not hit.
    pub fn is_transient(&self) -> bool {
        matches!(self, BotError::Rpc { .. } | BotError::Network { .. })
    }
}

pub type BotResult<T> = Result<T, BotError>;

/// Sizing rejections are an expected outcome, kept apart from `BotError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    #[error("Insufficient balance: {balance} ETH leaves {usable} ETH after gas {gas_cost} ETH and buffer {buffer} ETH")]
    InsufficientBalance {
        balance: Decimal,
        gas_cost: Decimal,
        buffer: Decimal,
        usable: Decimal,
    },

    #[error("Invalid sizing parameter {name}: {value}")]
    InvalidParameter {
        name: &'static str,
        value: Decimal,
    },

    #[error("Gas cost of {gas_limit} units at {gas_price_wei} wei is out of range")]
    GasCostOverflow {
        gas_price_wei: u128,
        gas_limit: u64,
    },
}
