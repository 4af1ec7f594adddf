//! Endpoint selection, node access and gas pricing

pub mod client;
pub mod gas_oracle;
pub mod pool;
pub mod retry;

pub use client::*;
pub use gas_oracle::*;
pub use pool::*;
pub use retry::*;
