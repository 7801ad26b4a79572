//! CLI argument definitions using clap
//!
//! Commands:
//! - aeromodel models --schemas <path>
//! - aeromodel check --schemas <path> --model <name>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeromodel - declarative model definitions and document validation
#[derive(Parser, Debug)]
#[command(name = "aeromodel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Write TRACE log events to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the models declared in a definitions file
    Models {
        /// Path to the JSON model definitions
        #[arg(long, default_value = "./models.json")]
        schemas: PathBuf,
    },

    /// Validate one JSON document read from stdin against a model
    Check {
        /// Path to the JSON model definitions
        #[arg(long, default_value = "./models.json")]
        schemas: PathBuf,

        /// Name of the model the document must satisfy
        #[arg(long)]
        model: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
