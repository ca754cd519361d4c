//! Explicit context handed by the control loop to every sub-flow

use crate::config::Settings;
use crate::error::{HaggleError, Result};
use crate::navigator::WindowNavigator;
use crate::negotiation::PurchasePolicy;
use crate::ui::{InputDriver, UiState};
use crate::valuation::PriceIndex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AutomationContext {
    pub ui: Arc<dyn UiState>,
    pub input: Arc<dyn InputDriver>,
    pub settings: Arc<Settings>,
    pub policy: Arc<dyn PurchasePolicy>,
    prices: watch::Receiver<Arc<PriceIndex>>,
    cancel: CancellationToken,
}

impl AutomationContext {
    pub fn new(
        ui: Arc<dyn UiState>,
        input: Arc<dyn InputDriver>,
        settings: Arc<Settings>,
        policy: Arc<dyn PurchasePolicy>,
        prices: watch::Receiver<Arc<PriceIndex>>,
    ) -> Self {
        Self {
            ui,
            input,
            settings,
            policy,
            prices,
            cancel: CancellationToken::new(),
        }
    }

    /// Same collaborators, fresh cancellation token
    pub fn for_new_cycle(&self) -> Self {
        Self {
            cancel: CancellationToken::new(),
            ..self.clone()
        }
    }

    pub fn navigator(&self) -> WindowNavigator {
        WindowNavigator::new(self.ui.clone(), self.input.clone(), self.settings.clone())
    }

    /// The newest published price snapshot
    pub fn latest_prices(&self) -> Arc<PriceIndex> {
        self.prices.borrow().clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Step boundary: unwind if the operator asked to stop
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(HaggleError::Cancelled)
        } else {
            Ok(())
        }
    }
}
