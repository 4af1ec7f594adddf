//! Chain state capture and rollback for test and fork networks

pub mod manager;

pub use manager::*;
