//! Negotiation item model

use crate::types::{OfferedItem, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one offered item within a single offer read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Unevaluated,
    Priced,
    SelectedForPurchase,
    Purchased,
    Skipped,
}

impl ItemState {
    /// Nothing further happens to the item in this offer set
    pub fn is_settled(&self) -> bool {
        matches!(self, ItemState::Purchased | ItemState::Skipped)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemState::Unevaluated => "unevaluated",
            ItemState::Priced => "priced",
            ItemState::SelectedForPurchase => "selected",
            ItemState::Purchased => "purchased",
            ItemState::Skipped => "skipped",
        };
        write!(f, "{}", label)
    }
}

/// An offered item together with its valuation.
///
/// Built fresh from every offer read and replaced by the next one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_value: f64,
    /// `unit_value * quantity`, what the purchase policy judges
    pub total_price: f64,
    pub state: ItemState,
    #[serde(skip)]
    pub rect: Option<Rect>,
}

impl NegotiationItem {
    pub fn from_offer(offer: &OfferedItem) -> Self {
        Self {
            name: offer.name.clone(),
            category: offer.category.clone(),
            quantity: offer.quantity,
            unit_value: 0.0,
            total_price: 0.0,
            state: ItemState::Unevaluated,
            rect: Some(offer.rect),
        }
    }

    /// Attach a unit value and mark the item priced
    pub fn price(&mut self, unit_value: f64) {
        self.unit_value = unit_value;
        self.total_price = unit_value * f64::from(self.quantity);
        self.state = ItemState::Priced;
    }
}
