//! Interaction with one open negotiation window

use crate::control::AutomationContext;
use crate::error::{HaggleError, Result};
use crate::types::{Key, MouseButton, OfferSnapshot, Window};
use crate::ui::UiState;
use crate::valuation::PriceIndex;
use crate::wait::{await_condition, settle};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::policy::PurchasePolicy;
use super::types::{ItemState, NegotiationItem};

/// Offer set, counters and valuation of the currently open window.
///
/// Only valid while the window stays open; `refresh` re-reads everything.
pub struct NegotiationSession {
    ui: Arc<dyn UiState>,
    policy: Arc<dyn PurchasePolicy>,
    prices: Arc<PriceIndex>,
    offer: OfferSnapshot,
    items: Vec<NegotiationItem>,
    exhausted: bool,
}

impl NegotiationSession {
    /// Read the window for the first time
    pub fn initialize(ctx: &AutomationContext, prices: Arc<PriceIndex>) -> Result<Self> {
        let disabled = ctx.policy.disabled_categories();
        if !disabled.is_empty() {
            warn!("Purchases disabled for categories: {}", disabled.join(", "));
        }

        let offer = read_offer(ctx.ui.as_ref())?;
        let mut session = Self {
            ui: ctx.ui.clone(),
            policy: ctx.policy.clone(),
            prices,
            offer,
            items: Vec::new(),
            exhausted: false,
        };
        session.evaluate();
        Ok(session)
    }

    /// Re-read offered items and funds, valuing them against `prices`
    pub fn refresh(&mut self, prices: Arc<PriceIndex>) -> Result<()> {
        self.offer = read_offer(self.ui.as_ref())?;
        self.prices = prices;
        self.evaluate();
        Ok(())
    }

    fn evaluate(&mut self) {
        self.items = self
            .offer
            .items
            .iter()
            .map(|offered| {
                let mut item = NegotiationItem::from_offer(offered);
                let unit_value = self.prices.value_of(&item.name).unwrap_or_else(|| {
                    warn!("No price for {}, valuing it at 0", item.name);
                    0.0
                });
                item.price(unit_value);
                item
            })
            .collect();

        debug!(
            "Offer read: {} items, {} coins, {} rerolls\n{}",
            self.items.len(),
            self.offer.coins,
            self.offer.rerolls,
            self.report()
        );
    }

    pub fn items(&self) -> &[NegotiationItem] {
        &self.items
    }

    pub fn coins(&self) -> u32 {
        self.offer.coins
    }

    pub fn rerolls(&self) -> u32 {
        self.offer.rerolls
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The window this session reads from has closed
    pub fn is_stale(&self) -> bool {
        !self.ui.is_visible(Window::NegotiationWindow)
    }

    /// Whether another round can still achieve something
    pub fn can_continue(&self) -> bool {
        if self.exhausted {
            return false;
        }
        self.offer.coins > 0
            || self
                .items
                .iter()
                .any(|item| item.state == ItemState::Priced && self.policy.should_purchase(item))
    }

    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// Select and buy worthwhile items from the current offer set, returning
    /// how many were bought.
    ///
    /// Cancellation is honoured between items, never inside one purchase
    /// gesture. In debug-only mode items are selected but not bought.
    pub async fn run_round(&mut self, ctx: &AutomationContext) -> Result<usize> {
        for item in self.items.iter_mut() {
            if item.state != ItemState::Priced {
                continue;
            }
            item.state = if self.policy.should_purchase(item) {
                ItemState::SelectedForPurchase
            } else {
                ItemState::Skipped
            };
        }

        let selected = self
            .items
            .iter()
            .filter(|item| item.state == ItemState::SelectedForPurchase)
            .count();
        info!("Round: {} of {} items selected", selected, self.items.len());

        if ctx.settings.debug_only {
            return Ok(0);
        }

        let mut purchased_count = 0;
        for index in 0..self.items.len() {
            if self.items[index].state != ItemState::SelectedForPurchase {
                continue;
            }
            ctx.checkpoint()?;
            let purchased = self.purchase(ctx, index).await;
            let item = &mut self.items[index];
            if purchased {
                info!("Purchased {} x{} ({})", item.name, item.quantity, item.total_price);
                item.state = ItemState::Purchased;
                purchased_count += 1;
            } else {
                warn!("Purchase of {} did not go through", item.name);
                item.state = ItemState::Skipped;
            }
        }

        debug!(
            "{} of {} items settled after the round",
            self.items.iter().filter(|item| item.state.is_settled()).count(),
            self.items.len()
        );
        Ok(purchased_count)
    }

    async fn purchase(&self, ctx: &AutomationContext, index: usize) -> bool {
        let item = &self.items[index];
        let Some(rect) = item.rect else {
            return false;
        };
        let settings = &ctx.settings;
        let ui = ctx.ui.clone();

        ctx.input.move_pointer(rect.center());
        settle(settings.hover_delay()).await;
        ctx.input.click(MouseButton::Left);

        let opened = await_condition(
            || ui.is_visible(Window::NegotiationSubDialog),
            settings.poll_interval(),
            settings.purchase_timeout(),
            &format!("Purchase dialog for {} did not open", item.name),
        )
        .await;
        if !opened {
            return false;
        }

        ctx.input.move_pointer(self.offer.confirm_button.center());
        settle(settings.hover_delay()).await;
        ctx.input.click(MouseButton::Left);

        let closed = await_condition(
            || !ui.is_visible(Window::NegotiationSubDialog),
            settings.poll_interval(),
            settings.purchase_timeout(),
            &format!("Purchase dialog for {} did not close", item.name),
        )
        .await;
        if !closed {
            ctx.input.key_press(Key::Escape);
        }
        settle(settings.settle_delay()).await;
        closed
    }

    /// Click the reroll control and confirm the counter went down.
    ///
    /// When the counter has not moved by the deadline it is read once more.
    /// An empty purse at that point ends the session instead of stalling.
    pub async fn reroll(&mut self, ctx: &AutomationContext) -> Result<()> {
        if !self.ui.is_visible(Window::NegotiationWindow) {
            return Err(HaggleError::WindowClosed(
                "negotiation window closed before reroll".to_string(),
            ));
        }
        let before = read_offer(self.ui.as_ref())?;
        let settings = &ctx.settings;

        ctx.input.move_pointer(before.reroll_button.center());
        settle(settings.hover_delay()).await;
        ctx.input.click(MouseButton::Left);
        settle(settings.settle_delay()).await;

        let ui = self.ui.clone();
        let decreased = await_condition(
            || {
                ui.negotiation_offer()
                    .is_some_and(|offer| offer.rerolls < before.rerolls)
            },
            settings.poll_interval(),
            settings.reroll_timeout(),
            "Could not refresh the offer set",
        )
        .await;
        if decreased {
            debug!("Rerolled, counter was {}", before.rerolls);
            return Ok(());
        }

        let after = read_offer(self.ui.as_ref())?;
        if after.rerolls < before.rerolls {
            debug!("Reroll registered late");
            Ok(())
        } else if after.coins == 0 {
            info!("Out of coins, nothing left to reroll with");
            self.exhausted = true;
            Ok(())
        } else {
            self.exhausted = true;
            Err(HaggleError::Stall {
                before: before.rerolls,
                observed: after.rerolls,
            })
        }
    }

    /// Plain-text table of the current items
    pub fn report(&self) -> String {
        let mut out = format!(
            "{:<32} {:<12} {:>6} {:>10} {:>10}  {}\n",
            "Name", "Category", "Amount", "Value", "Total", "State"
        );
        for item in &self.items {
            let _ = writeln!(
                out,
                "{:<32} {:<12} {:>6} {:>10.2} {:>10.2}  {}",
                item.name, item.category, item.quantity, item.unit_value, item.total_price, item.state
            );
        }
        out
    }
}

fn read_offer(ui: &dyn UiState) -> Result<OfferSnapshot> {
    if !ui.is_visible(Window::NegotiationWindow) {
        return Err(HaggleError::SessionRefresh(
            "negotiation window is not open".to_string(),
        ));
    }
    ui.negotiation_offer().ok_or_else(|| {
        HaggleError::SessionRefresh("could not read offered items".to_string())
    })
}
