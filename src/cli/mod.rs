//! CLI command definitions for `zoneadmin`.
//!
//! The entry point is the `Cli` struct; `settings` subcommands operate on the
//! store directly and exit, `serve` runs the HTTP server.

pub mod settings;

use clap::{Parser, Subcommand};
pub use settings::{MaintenanceMode, SettingsCommand};

/// Zone admin server and settings tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Extra YAML configuration file, merged over the others
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides DATABASE_PATH)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default if no subcommand given)
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Inspect or change stored settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}
