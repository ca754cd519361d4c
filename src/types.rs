//! Core types shared between the host collaborators and the automation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen position in client coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding rectangle of an on-screen element
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point, where all pointer gestures aim
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Keyboard keys the automation presses or binds hotkeys to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Control,
    Shift,
    Enter,
    Function(u8),
    Char(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Escape => write!(f, "Esc"),
            Key::Control => write!(f, "Ctrl"),
            Key::Shift => write!(f, "Shift"),
            Key::Enter => write!(f, "Enter"),
            Key::Function(n) => write!(f, "F{}", n),
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// The finite set of screens the automation knows how to reach or leave.
///
/// Declaration order is the dismissal priority: nested dialogs come before
/// the windows that own them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Window {
    NegotiationSubDialog,
    NegotiationWindow,
    NpcDialog,
    StorageWindow,
    InventoryPanel,
}

impl Window {
    /// Dismissal order used when closing every overlay
    pub const CLOSE_ORDER: [Window; 5] = [
        Window::NegotiationSubDialog,
        Window::NegotiationWindow,
        Window::NpcDialog,
        Window::StorageWindow,
        Window::InventoryPanel,
    ];
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Window::NegotiationSubDialog => "negotiation sub-dialog",
            Window::NegotiationWindow => "negotiation window",
            Window::NpcDialog => "NPC dialog",
            Window::StorageWindow => "storage window",
            Window::InventoryPanel => "inventory panel",
        };
        write!(f, "{}", name)
    }
}

/// A label rendered over an entity on the ground
#[derive(Clone, Debug, PartialEq)]
pub struct GroundLabel {
    /// Entity path, matched against the configured markers
    pub path: String,
    pub visible: bool,
    pub rect: Rect,
}

/// One cell of the player inventory grid
#[derive(Clone, Debug, PartialEq)]
pub struct InventorySlot {
    pub column: u32,
    pub row: u32,
    pub occupied: bool,
    pub rect: Rect,
}

/// An item as the negotiation window presents it, before valuation
#[derive(Clone, Debug, PartialEq)]
pub struct OfferedItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub rect: Rect,
}

/// Point-in-time read of the negotiation window
#[derive(Clone, Debug, PartialEq)]
pub struct OfferSnapshot {
    pub items: Vec<OfferedItem>,
    /// Currency consumed by rerolls and purchases
    pub coins: u32,
    /// Reroll counter shown by the window; decreases on every reroll
    pub rerolls: u32,
    pub reroll_button: Rect,
    /// Confirm control of the purchase sub-dialog
    pub confirm_button: Rect,
}
