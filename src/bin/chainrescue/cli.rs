use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline maintenance CLI: rebuild a node's block index from raw flat files.
#[derive(Parser, Debug)]
#[command(
    name = "chainrescue",
    version,
    about = "Rebuild a node's block index from raw flat files",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Stage the database aside and rebuild its index by replaying every block
    Recover {
        /// Base path holding {network}/ and recovery/
        #[arg(long)]
        path: PathBuf,
        /// Network: "mainnet" or "testnet"
        #[arg(long, default_value = "mainnet")]
        network: String,
    },
    /// Read-only walk over the live flat files (no staging, no writes)
    Scan {
        /// Base path holding {network}/
        #[arg(long)]
        path: PathBuf,
        /// Network: "mainnet" or "testnet"
        #[arg(long, default_value = "mainnet")]
        network: String,
        /// Print the report as a single JSON line
        #[arg(long)]
        json: bool,
    },
}
