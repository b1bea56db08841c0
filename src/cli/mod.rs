//! CLI module for canvasiq - command-line interface and subcommands.
//!
//! Provides one-shot generation, an interactive session loop, and tool listing.

pub mod commands;

pub use commands::Cli;
