//! Haggler automation library
//!
//! Drives a timed negotiation window in a game client: finds and opens the
//! window, values the offered stock against a price index, buys what the
//! purchase policy selects, rerolls and moves purchases to storage when the
//! inventory fills up.
//!
//! The host client is reached only through the [`ui::UiState`] and
//! [`ui::InputDriver`] traits. [`sim::SimulatedHost`] implements both for
//! tests and the `haggler simulate` command.

pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod error;
pub mod navigator;
pub mod negotiation;
pub mod sim;
pub mod types;
pub mod ui;
pub mod valuation;
pub mod wait;

pub use commands::OperatorCommand;
pub use config::Settings;
pub use control::{AutomationContext, Controller, ControlState, CycleOutcome};
pub use error::{HaggleError, Result};
pub use navigator::WindowNavigator;
pub use negotiation::{NegotiationSession, PurchasePolicy, ThresholdPolicy};
pub use valuation::{build_index, PriceEntry, PriceIndex, PriceOverride};
pub use wait::await_condition;
