//! Command-line interface for turf_duel.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turf Duel - pairing server for a two-player card placement game
#[derive(Parser, Debug)]
#[command(name = "turf_duel")]
#[command(about = "Pairs players and resolves simultaneous turns", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to bind to (overrides config and TURF_DUEL_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Board width
        #[arg(long)]
        width: Option<usize>,

        /// Board height
        #[arg(long)]
        height: Option<usize>,

        /// Seconds a buffered play waits for the opponent (0 disables)
        #[arg(long)]
        turn_timeout: Option<u64>,

        /// Card file replacing the built-in catalog
        #[arg(long)]
        cards: Option<PathBuf>,
    },

    /// Parse a card file and list its cards
    Cards {
        /// Card file to check; the built-in catalog if omitted
        file: Option<PathBuf>,
    },
}
