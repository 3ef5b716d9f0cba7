//! CLI module for toolgen - command-line interface.

pub mod commands;

pub use commands::Cli;
