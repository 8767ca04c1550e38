//! CLI module for argus - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for batch runs and
//! registry inspection.

pub mod commands;

pub use commands::Cli;
