//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "haggler")]
#[command(about = "Haggler - negotiation window automation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the price index from a snapshot and print it
    Index {
        /// JSON file with a list of {name, value} quotations
        #[arg(short, long)]
        prices: PathBuf,

        /// Settings file carrying custom price overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a settings file
    CheckConfig {
        /// Settings file to check
        config: PathBuf,
    },

    /// Run one haggle cycle against the simulated host
    Simulate {
        /// Settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Price snapshot, defaults to the simulated catalog
        #[arg(short, long)]
        prices: Option<PathBuf>,

        /// Make the reroll control unresponsive
        #[arg(long)]
        stall: bool,

        /// Make the negotiation window refuse to open
        #[arg(long)]
        no_window: bool,

        /// Coins and rerolls the simulated window starts with
        #[arg(long, default_value = "3")]
        funds: u32,
    },
}
