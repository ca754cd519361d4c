//! Operator settings, read once when the controller is built

use crate::error::{HaggleError, Result};
use crate::types::Key;
use crate::valuation::PriceOverride;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base delay between pointer moves and clicks
    pub hover_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub navigation_timeout_ms: u64,
    pub reroll_timeout_ms: u64,
    pub purchase_timeout_ms: u64,
    /// Evaluate a single round without touching anything
    pub debug_only: bool,
    /// Path fragment identifying the negotiation NPC label
    pub negotiation_marker: String,
    /// Path fragment identifying the storage label
    pub storage_marker: String,
    pub inventory: InventorySettings,
    pub custom_prices: Vec<PriceOverride>,
    pub policy: PolicySettings,
    pub hotkeys: HotkeySettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySettings {
    /// Any occupied slot in this column means the inventory is full
    pub full_column: u32,
    /// Slots at or beyond this column are reserved and never moved
    pub clear_column_limit: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Minimum total value for an item to be purchased
    pub min_total_value: f64,
    /// Per-category minimum, overriding `min_total_value`
    pub category_minimums: HashMap<String, f64>,
    /// Categories that are never purchased
    pub disabled_categories: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeySettings {
    pub start: Key,
    pub stop_all: Key,
    pub satellite: Key,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hover_delay_ms: 50,
            poll_interval_ms: 20,
            navigation_timeout_ms: 2000,
            reroll_timeout_ms: 2000,
            purchase_timeout_ms: 1000,
            debug_only: false,
            negotiation_marker: "/HagglerHideout".to_string(),
            storage_marker: "/Stash".to_string(),
            inventory: InventorySettings::default(),
            custom_prices: Vec::new(),
            policy: PolicySettings::default(),
            hotkeys: HotkeySettings::default(),
        }
    }
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            full_column: 10,
            clear_column_limit: 11,
        }
    }
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            start: Key::Function(6),
            stop_all: Key::Function(7),
            satellite: Key::Function(8),
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HaggleError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(HaggleError::InvalidConfig(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        for (field, value) in [
            ("navigation_timeout_ms", self.navigation_timeout_ms),
            ("reroll_timeout_ms", self.reroll_timeout_ms),
            ("purchase_timeout_ms", self.purchase_timeout_ms),
        ] {
            if value < self.poll_interval_ms {
                return Err(HaggleError::InvalidConfig(format!(
                    "{} ({}) is shorter than poll_interval_ms ({})",
                    field, value, self.poll_interval_ms
                )));
            }
        }
        if self.inventory.full_column >= self.inventory.clear_column_limit {
            return Err(HaggleError::InvalidConfig(format!(
                "inventory.full_column ({}) must be inside the cleared region (< {})",
                self.inventory.full_column, self.inventory.clear_column_limit
            )));
        }
        if self.negotiation_marker.is_empty() || self.storage_marker.is_empty() {
            return Err(HaggleError::InvalidConfig(
                "ground markers must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    /// Delay after every dismiss or click before the next UI query
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms * 3)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn reroll_timeout(&self) -> Duration {
        Duration::from_millis(self.reroll_timeout_ms)
    }

    pub fn purchase_timeout(&self) -> Duration {
        Duration::from_millis(self.purchase_timeout_ms)
    }
}
