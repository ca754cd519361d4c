//! Operator command surface and hotkey edge detection

use crate::config::HotkeySettings;
use crate::types::Key;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorCommand {
    /// Start a cycle, or ask the running one to stop
    ToggleHaggle,
    /// Hard reset of every flow
    StopAll,
    /// Start or stop the satellite flow
    ToggleSatellite,
}

/// Fires once per physical press, on the key-down edge
#[derive(Clone, Debug, Default)]
pub struct EdgeTrigger {
    was_down: bool,
}

impl EdgeTrigger {
    pub fn update(&mut self, is_down: bool) -> bool {
        let fired = is_down && !self.was_down;
        self.was_down = is_down;
        fired
    }
}

/// Turns the raw key state of each host tick into operator commands
#[derive(Clone, Debug)]
pub struct HotkeyPoller {
    bindings: HotkeySettings,
    start: EdgeTrigger,
    satellite: EdgeTrigger,
    stop_all: EdgeTrigger,
}

impl HotkeyPoller {
    pub fn new(bindings: HotkeySettings) -> Self {
        Self {
            bindings,
            start: EdgeTrigger::default(),
            satellite: EdgeTrigger::default(),
            stop_all: EdgeTrigger::default(),
        }
    }

    /// Commands whose key went down since the previous poll
    pub fn poll(&mut self, is_down: impl Fn(Key) -> bool) -> Vec<OperatorCommand> {
        let mut commands = Vec::new();
        if self.start.update(is_down(self.bindings.start)) {
            commands.push(OperatorCommand::ToggleHaggle);
        }
        if self.satellite.update(is_down(self.bindings.satellite)) {
            commands.push(OperatorCommand::ToggleSatellite);
        }
        if self.stop_all.update(is_down(self.bindings.stop_all)) {
            commands.push(OperatorCommand::StopAll);
        }
        commands
    }
}
