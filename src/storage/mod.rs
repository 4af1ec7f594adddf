//! Data persistence and file operations

pub mod deployments;
pub mod executions;

pub use deployments::*;
pub use executions::*;
