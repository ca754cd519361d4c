//! The automation control loop and its operator-facing controller

pub mod context;
pub mod controller;
pub mod cycle;
pub mod inventory;
pub mod state;

pub use context::AutomationContext;
pub use controller::{Controller, SatelliteFlow};
pub use cycle::{run_cycle, CycleOutcome, Step};
pub use inventory::{clear_inventory, should_clear_inventory};
pub use state::{ControlState, StateCell};
