//! Host collaborators: UI state queries and input injection

use crate::types::{GroundLabel, InventorySlot, Key, MouseButton, OfferSnapshot, Point, Window};
use std::sync::Arc;

/// Read-only, point-in-time view of the host UI.
///
/// Every call may observe a different frame; callers confirm the effect of
/// their input by polling these queries, never by trusting the input call.
pub trait UiState: Send + Sync {
    fn is_visible(&self, window: Window) -> bool;

    /// Currently rendered ground labels
    fn ground_labels(&self) -> Vec<GroundLabel>;

    /// Every slot of the player inventory grid
    fn inventory_slots(&self) -> Vec<InventorySlot>;

    /// Offer set and counters, `None` when the window cannot be read
    fn negotiation_offer(&self) -> Option<OfferSnapshot>;
}

/// Fire-and-forget pointer and keyboard injection
pub trait InputDriver: Send + Sync {
    fn move_pointer(&self, to: Point);
    fn click(&self, button: MouseButton);
    fn key_down(&self, key: Key);
    fn key_up(&self, key: Key);

    fn key_press(&self, key: Key) {
        self.key_down(key);
        self.key_up(key);
    }
}

/// Holds a modifier key down for its lifetime.
///
/// Releasing on drop covers every exit path, including the cycle task being
/// aborted mid-gesture.
pub struct ModifierGuard {
    input: Arc<dyn InputDriver>,
    key: Key,
}

impl ModifierGuard {
    pub fn hold(input: Arc<dyn InputDriver>, key: Key) -> Self {
        input.key_down(key);
        Self { input, key }
    }
}

impl Drop for ModifierGuard {
    fn drop(&mut self) {
        self.input.key_up(self.key);
    }
}
