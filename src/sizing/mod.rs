//! Trade and flashloan sizing

pub mod calculator;

pub use calculator::*;
