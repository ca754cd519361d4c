//! In-memory host that behaves like the game UI closely enough to drive a
//! full cycle without a live client.

use crate::config::Settings;
use crate::types::{
    GroundLabel, InventorySlot, Key, MouseButton, OfferSnapshot, OfferedItem, Point, Rect, Window,
};
use crate::ui::{InputDriver, UiState};
use crate::valuation::PriceEntry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub const INVENTORY_COLUMNS: u32 = 12;
pub const INVENTORY_ROWS: u32 = 5;
const OFFERS_PER_ROLL: usize = 4;

/// Observable things the simulated host did in response to input
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    Opened(Window),
    Closed(Window),
    PurchaseDialogOpened(String),
    Purchased(String),
    Rerolled { rerolls_left: u32 },
    Stashed(String),
}

type Hook = Arc<dyn Fn(&SimEvent) + Send + Sync>;

const DEFAULT_CATALOG: &[(&str, &str, f64)] = &[
    ("Exotic Coinage", "Greater", 4.0),
    ("Scrap Metal", "Lesser", 0.5),
    ("Astragali", "Grand", 12.0),
    ("Burial Medallion", "Exceptional", 30.0),
    ("Gemcutter's Incubator", "Currency", 2.0),
    ("Chaos Orb", "Currency", 1.0),
];

/// Quotations for everything the simulated host can offer
pub fn catalog_prices() -> Vec<PriceEntry> {
    DEFAULT_CATALOG
        .iter()
        .map(|(name, _, value)| PriceEntry::new(*name, *value))
        .collect()
}

struct SimState {
    visible: HashSet<Window>,
    pointer: Point,
    held: HashSet<Key>,
    labels: Vec<(GroundLabel, Window)>,
    offers: Vec<OfferedItem>,
    coins: u32,
    rerolls: u32,
    pending_purchase: Option<usize>,
    inventory: Vec<Option<String>>,
    storage: Vec<String>,
    negotiation_opens: bool,
    reroll_stalls: bool,
    dialog_responds: bool,
    rng: StdRng,
    events: Vec<SimEvent>,
}

pub struct SimulatedHost {
    state: Mutex<SimState>,
    hook: Mutex<Option<Hook>>,
}

fn reroll_button() -> Rect {
    Rect::new(400.0, 300.0, 80.0, 30.0)
}

fn confirm_button() -> Rect {
    Rect::new(200.0, 400.0, 80.0, 30.0)
}

fn offer_rect(index: usize) -> Rect {
    Rect::new(100.0 + index as f32 * 60.0, 100.0, 50.0, 50.0)
}

fn slot_index(column: u32, row: u32) -> usize {
    (column * INVENTORY_ROWS + row) as usize
}

fn slot_rect(column: u32, row: u32) -> Rect {
    Rect::new(1300.0 + column as f32 * 40.0, 600.0 + row as f32 * 40.0, 38.0, 38.0)
}

impl SimulatedHost {
    /// Empty inventory, closed windows, both markers on the ground
    pub fn new(settings: &Settings) -> Self {
        let labels = vec![
            (
                GroundLabel {
                    path: format!("Metadata/NPC/League{}", settings.negotiation_marker),
                    visible: true,
                    rect: Rect::new(800.0, 500.0, 100.0, 20.0),
                },
                Window::NegotiationWindow,
            ),
            (
                GroundLabel {
                    path: format!("Metadata/MiscellaneousObjects{}", settings.storage_marker),
                    visible: true,
                    rect: Rect::new(1000.0, 500.0, 100.0, 20.0),
                },
                Window::StorageWindow,
            ),
        ];

        let mut state = SimState {
            visible: HashSet::new(),
            pointer: Point::new(0.0, 0.0),
            held: HashSet::new(),
            labels,
            offers: Vec::new(),
            coins: 0,
            rerolls: 0,
            pending_purchase: None,
            inventory: vec![None; (INVENTORY_COLUMNS * INVENTORY_ROWS) as usize],
            storage: Vec::new(),
            negotiation_opens: true,
            reroll_stalls: false,
            dialog_responds: true,
            rng: StdRng::seed_from_u64(7),
            events: Vec::new(),
        };
        state.roll_offers();

        Self {
            state: Mutex::new(state),
            hook: Mutex::new(None),
        }
    }

    /// Replace the current offer set with `(name, category, quantity)` items
    pub fn with_offers(self, offers: &[(&str, &str, u32)]) -> Self {
        self.lock().offers = offers
            .iter()
            .enumerate()
            .map(|(i, (name, category, quantity))| OfferedItem {
                name: name.to_string(),
                category: category.to_string(),
                quantity: *quantity,
                rect: offer_rect(i),
            })
            .collect();
        self
    }

    pub fn with_funds(self, coins: u32, rerolls: u32) -> Self {
        {
            let mut state = self.lock();
            state.coins = coins;
            state.rerolls = rerolls;
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Called after each input with whatever that input caused
    pub fn set_hook(&self, hook: impl Fn(&SimEvent) + Send + Sync + 'static) {
        *self.hook.lock().unwrap_or_else(|p| p.into_inner()) = Some(Arc::new(hook));
    }

    /// Whether clicking the negotiation marker opens the window
    pub fn set_negotiation_opens(&self, opens: bool) {
        self.lock().negotiation_opens = opens;
    }

    /// Whether the reroll control silently does nothing
    pub fn set_reroll_stalls(&self, stalls: bool) {
        self.lock().reroll_stalls = stalls;
    }

    /// Whether clicking an offer opens the purchase dialog
    pub fn set_dialog_responds(&self, responds: bool) {
        self.lock().dialog_responds = responds;
    }

    pub fn set_label_visible(&self, window: Window, visible: bool) {
        for (label, target) in self.lock().labels.iter_mut() {
            if *target == window {
                label.visible = visible;
            }
        }
    }

    pub fn open(&self, window: Window) {
        self.lock().visible.insert(window);
    }

    /// Put `name` into every slot of `column`
    pub fn fill_column(&self, column: u32, name: &str) {
        let mut state = self.lock();
        for row in 0..INVENTORY_ROWS {
            state.inventory[slot_index(column, row)] = Some(name.to_string());
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.lock().held.contains(&key)
    }

    pub fn offers(&self) -> Vec<OfferedItem> {
        self.lock().offers.clone()
    }

    pub fn coins(&self) -> u32 {
        self.lock().coins
    }

    pub fn rerolls(&self) -> u32 {
        self.lock().rerolls
    }

    /// Items in the inventory, column by column
    pub fn inventory_items(&self) -> Vec<String> {
        self.lock().inventory.iter().flatten().cloned().collect()
    }

    pub fn stored_items(&self) -> Vec<String> {
        self.lock().storage.clone()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().events.clone()
    }

    fn apply<F>(&self, action: F)
    where
        F: FnOnce(&mut SimState),
    {
        let fresh = {
            let mut state = self.lock();
            let before = state.events.len();
            action(&mut state);
            state.events[before..].to_vec()
        };
        let hook = self.hook.lock().unwrap_or_else(|p| p.into_inner()).clone();
        if let Some(hook) = hook {
            for event in &fresh {
                hook(event);
            }
        }
    }
}

impl SimState {
    fn roll_offers(&mut self) {
        let mut offers = Vec::with_capacity(OFFERS_PER_ROLL);
        for i in 0..OFFERS_PER_ROLL {
            if let Some((name, category, _)) = DEFAULT_CATALOG.choose(&mut self.rng) {
                offers.push(OfferedItem {
                    name: name.to_string(),
                    category: category.to_string(),
                    quantity: self.rng.gen_range(1..=5),
                    rect: offer_rect(i),
                });
            }
        }
        self.offers = offers;
    }

    fn show(&mut self, window: Window) {
        if self.visible.insert(window) {
            self.events.push(SimEvent::Opened(window));
        }
    }

    fn hide(&mut self, window: Window) {
        if self.visible.remove(&window) {
            self.events.push(SimEvent::Closed(window));
        }
        if window == Window::NegotiationSubDialog {
            self.pending_purchase = None;
        }
    }

    fn dismiss_topmost(&mut self) {
        if let Some(window) = Window::CLOSE_ORDER
            .into_iter()
            .find(|w| self.visible.contains(w))
        {
            self.hide(window);
        }
    }

    fn free_slot(&self) -> Option<usize> {
        // Column-major fill, the rightmost column is never filled by loot
        (0..INVENTORY_COLUMNS - 1)
            .flat_map(|column| (0..INVENTORY_ROWS).map(move |row| slot_index(column, row)))
            .find(|&index| self.inventory[index].is_none())
    }

    fn click(&mut self) {
        let pointer = self.pointer;
        let ctrl = self.held.contains(&Key::Control);

        if self.visible.contains(&Window::NegotiationWindow) {
            if self.visible.contains(&Window::NegotiationSubDialog) {
                if confirm_button().contains(pointer) {
                    self.confirm_purchase();
                }
                return;
            }
            if reroll_button().contains(pointer) {
                if !self.reroll_stalls && self.rerolls > 0 && self.coins > 0 {
                    self.rerolls -= 1;
                    self.coins -= 1;
                    self.roll_offers();
                    self.events.push(SimEvent::Rerolled {
                        rerolls_left: self.rerolls,
                    });
                }
                return;
            }
            if let Some(index) = self.offers.iter().position(|o| o.rect.contains(pointer)) {
                if self.dialog_responds {
                    self.pending_purchase = Some(index);
                    let name = self.offers[index].name.clone();
                    self.show(Window::NegotiationSubDialog);
                    self.events.push(SimEvent::PurchaseDialogOpened(name));
                }
            }
            return;
        }

        if self.visible.contains(&Window::StorageWindow) && ctrl {
            let slot = (0..INVENTORY_COLUMNS)
                .flat_map(|column| (0..INVENTORY_ROWS).map(move |row| (column, row)))
                .find(|&(column, row)| slot_rect(column, row).contains(pointer));
            if let Some((column, row)) = slot {
                if let Some(name) = self.inventory[slot_index(column, row)].take() {
                    self.storage.push(name.clone());
                    self.events.push(SimEvent::Stashed(name));
                }
            }
            return;
        }

        let target = self
            .labels
            .iter()
            .find(|(label, _)| label.visible && label.rect.contains(pointer))
            .map(|(_, window)| *window);
        match target {
            Some(Window::NegotiationWindow) if ctrl && self.negotiation_opens => {
                self.show(Window::NegotiationWindow);
            }
            Some(Window::StorageWindow) => {
                self.show(Window::StorageWindow);
                self.show(Window::InventoryPanel);
            }
            _ => {}
        }
    }

    fn confirm_purchase(&mut self) {
        let Some(index) = self.pending_purchase else {
            return;
        };
        if index < self.offers.len() {
            // Remaining offers keep their place
            let item = self.offers.remove(index);
            if let Some(slot) = self.free_slot() {
                self.inventory[slot] = Some(item.name.clone());
            }
            self.events.push(SimEvent::Purchased(item.name));
        }
        self.hide(Window::NegotiationSubDialog);
    }
}

impl UiState for SimulatedHost {
    fn is_visible(&self, window: Window) -> bool {
        self.lock().visible.contains(&window)
    }

    fn ground_labels(&self) -> Vec<GroundLabel> {
        self.lock()
            .labels
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    fn inventory_slots(&self) -> Vec<InventorySlot> {
        let state = self.lock();
        (0..INVENTORY_COLUMNS)
            .flat_map(|column| (0..INVENTORY_ROWS).map(move |row| (column, row)))
            .map(|(column, row)| InventorySlot {
                column,
                row,
                occupied: state.inventory[slot_index(column, row)].is_some(),
                rect: slot_rect(column, row),
            })
            .collect()
    }

    fn negotiation_offer(&self) -> Option<OfferSnapshot> {
        let state = self.lock();
        if !state.visible.contains(&Window::NegotiationWindow) {
            return None;
        }
        Some(OfferSnapshot {
            items: state.offers.clone(),
            coins: state.coins,
            rerolls: state.rerolls,
            reroll_button: reroll_button(),
            confirm_button: confirm_button(),
        })
    }
}

impl InputDriver for SimulatedHost {
    fn move_pointer(&self, to: Point) {
        self.lock().pointer = to;
    }

    fn click(&self, button: MouseButton) {
        if button == MouseButton::Left {
            self.apply(SimState::click);
        }
    }

    fn key_down(&self, key: Key) {
        self.apply(|state| {
            state.held.insert(key);
            if key == Key::Escape {
                state.dismiss_topmost();
            }
        });
    }

    fn key_up(&self, key: Key) {
        self.lock().held.remove(&key);
    }
}
