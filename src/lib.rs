//! Flashloan Orchestrator - flashloan arbitrage execution for EVM networks
//!
//! Sizes a flashloan from the wallet's balance after gas and a safety buffer, then drives the
//! approve → deposit → flashloan transaction sequence through a rotating pool of RPC endpoints,
//! waiting for confirmations at every step. Test and fork networks also get chain snapshots.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod sizing;
pub mod execution;
pub mod snapshot;
pub mod storage;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{BotError, BotResult};
pub use types::*;

// Type alias for our concrete provider
pub type ConcreteProvider = alloy::providers::RootProvider<alloy::transports::BoxTransport>;
