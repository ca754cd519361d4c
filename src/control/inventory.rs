//! Moving purchased items from the inventory into storage

use super::AutomationContext;
use crate::error::Result;
use crate::types::{InventorySlot, Key, MouseButton};
use crate::ui::ModifierGuard;
use crate::wait::settle;
use tracing::{debug, info, warn};

/// The inventory counts as full once its marker column holds anything
pub fn should_clear_inventory(ctx: &AutomationContext) -> bool {
    let column = ctx.settings.inventory.full_column;
    let full = ctx
        .ui
        .inventory_slots()
        .iter()
        .any(|slot| slot.occupied && slot.column == column);
    debug!("Inventory full: {}", full);
    full
}

/// Occupied slots outside the reserved region, row by row
fn slots_to_clear(slots: Vec<InventorySlot>, column_limit: u32) -> Vec<InventorySlot> {
    let mut slots: Vec<InventorySlot> = slots
        .into_iter()
        .filter(|slot| slot.occupied && slot.column < column_limit)
        .collect();
    slots.sort_by_key(|slot| (slot.row, slot.column));
    slots
}

/// Stash every movable inventory item, then head back to the negotiation
/// window. Returns the number of slots clicked.
///
/// Failing to reach storage is fatal for the caller; failing to get back to
/// the negotiation window is only logged.
pub async fn clear_inventory(ctx: &AutomationContext) -> Result<usize> {
    info!("Clearing inventory");
    let navigator = ctx.navigator();
    let settings = &ctx.settings;

    navigator.close_all_overlays().await;
    navigator.navigate_to_storage_target().await?;

    let slots = slots_to_clear(
        ctx.ui.inventory_slots(),
        settings.inventory.clear_column_limit,
    );
    debug!("{} occupied slots to move", slots.len());

    {
        let _held = ModifierGuard::hold(ctx.input.clone(), Key::Control);
        for slot in &slots {
            ctx.input.move_pointer(slot.rect.center());
            settle(settings.hover_delay()).await;
            ctx.input.click(MouseButton::Left);
            settle(settings.settle_delay()).await;
        }
    }
    info!("Moved {} slots to storage", slots.len());

    if let Err(e) = navigator.navigate_to_negotiation_target().await {
        warn!("Could not return to the negotiation window: {}", e);
    }
    settle(settings.settle_delay()).await;

    Ok(slots.len())
}
