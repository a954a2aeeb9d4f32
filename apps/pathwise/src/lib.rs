//! # pathwise
//!
//! Library half of the Pathwise binary: CLI definitions, command
//! implementations and configuration loading. The binary in `main.rs`
//! only wires logging and dispatches to [`cli::execute`].

pub mod cli;
pub mod config;
