//! Core data types and structures

pub mod account;
pub mod addresses;
pub mod execution;
pub mod gas;
pub mod sizing;
pub mod snapshot;

pub use account::*;
pub use addresses::*;
pub use execution::*;
pub use gas::*;
pub use sizing::*;
pub use snapshot::*;
