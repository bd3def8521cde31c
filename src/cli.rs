//! Command-line interface definition

use clap::{Parser, Subcommand};

/// Cicerone: a conversational multi-day city itinerary assistant
#[derive(Parser, Debug)]
#[command(name = "cicerone")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/config.yaml", env = "CICERONE_CONFIG")]
    pub config: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive planning conversation
    Chat {
        /// Resume an existing session by id
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Run a single planning request and print the result
    Plan {
        /// The request, e.g. "two relaxed days around food and culture"
        prompt: String,
    },
}
