//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - generate: build one canvas and print it as JSON
//! - interactive: read prompts from stdin into a single session
//! - tools: list the registered tool types

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// canvasiq - turn a prompt into a dashboard of data tiles
#[derive(Parser, Debug)]
#[command(name = "canvasiq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one canvas and print its tiles as JSON
    Generate {
        /// What the dashboard should show
        prompt: String,

        /// Extra context handed to the planner
        #[arg(long, default_value = "")]
        context: String,

        /// Session to store the tiles in (generated when omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Read prompts line by line and build them into one session
    Interactive {
        /// Session to reuse (generated when omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List registered tool types
    Tools,
}
