//! CLI module for Haggler

pub mod app;
pub mod commands;

pub use app::{run_check_config, run_index, run_simulate, SimulateOptions};
pub use commands::{Cli, Commands};
