//! CLI command definitions for the `tkeep` binary.

pub mod thread;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Durable per-thread chat message storage.
#[derive(Parser)]
#[command(name = "tkeep", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, short, default_value = "8787", env = "THREADKEEP_PORT")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print a thread's messages as JSON.
    Messages {
        /// Thread identifier.
        thread_id: String,
    },

    /// Show a thread's message count and storage file.
    Inspect {
        /// Thread identifier.
        thread_id: String,
    },

    /// Remove every message from a thread.
    Clear {
        /// Thread identifier.
        thread_id: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
