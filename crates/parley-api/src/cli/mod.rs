//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod send;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat-widget backend: serve the API or manage stored conversations.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to parley.toml (defaults to <data dir>/parley.toml).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides server.port).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides server.host).
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the messages of one session.
    History {
        /// Session id.
        session_id: String,
    },

    /// List stored sessions, most recently updated first.
    #[command(alias = "ls")]
    Sessions,

    /// Delete one session or every session.
    Clear {
        /// Session id to clear.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        session_id: Option<String>,

        /// Clear every session.
        #[arg(long)]
        all: bool,
    },

    /// Send one message and print the reply.
    Send {
        /// Continue this session instead of starting a new one.
        #[arg(long = "session")]
        session_id: Option<String>,

        /// The message text.
        message: String,
    },
}
