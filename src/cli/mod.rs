//! CLI module for the inventory compiler.
//!
//! This module provides the command-line interface for compiling one
//! environment's inventories.

mod commands;
mod output;

pub use commands::{Cli, OutputFormat};
pub use output::OutputFormatter;
