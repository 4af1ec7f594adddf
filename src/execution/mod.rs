//! Transaction building, execution and the flashloan workflow

pub mod engine;
pub mod intents;
pub mod workflow;

pub use engine::*;
pub use intents::*;
pub use workflow::*;
