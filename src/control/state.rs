//! Process-wide automation state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Where the control loop is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlState {
    #[default]
    Idle,
    StartingUp,
    Running,
    Cancelling,
}

impl ControlState {
    /// A cycle exists and has not settled back to idle
    pub fn is_active(&self) -> bool {
        !matches!(self, ControlState::Idle)
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ControlState::Idle => "idle",
            ControlState::StartingUp => "starting up",
            ControlState::Running => "running",
            ControlState::Cancelling => "cancelling",
        };
        write!(f, "{}", label)
    }
}

/// Shared handle to the control state.
///
/// Critical sections are a single read or write and never span an await.
#[derive(Clone, Debug, Default)]
pub struct StateCell {
    inner: Arc<Mutex<ControlState>>,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ControlState {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set(&self, state: ControlState) {
        let mut current = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != state {
            tracing::debug!("Control state {} -> {}", *current, state);
            *current = state;
        }
    }

    /// Move to `next` only when currently in `expected`
    pub fn transition(&self, expected: ControlState, next: ControlState) -> bool {
        let mut current = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == expected {
            tracing::debug!("Control state {} -> {}", expected, next);
            *current = next;
            true
        } else {
            false
        }
    }
}
