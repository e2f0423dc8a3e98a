//! Command handlers: bridge CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod fields;
pub mod poll;
pub mod resolve;
