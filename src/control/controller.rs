//! Operator-facing controller owning the cycle task and satellite flows

use super::cycle::{run_cycle, CycleOutcome};
use super::state::{ControlState, StateCell};
use super::AutomationContext;
use crate::commands::{HotkeyPoller, OperatorCommand};
use crate::config::Settings;
use crate::error::Result;
use crate::negotiation::PurchasePolicy;
use crate::types::Key;
use crate::ui::{InputDriver, UiState};
use crate::valuation::{build_index, PriceEntry, PriceIndex};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// An auxiliary automation the operator toggles independently of the
/// haggle cycle. `stop_all` aborts it along with everything else.
pub trait SatelliteFlow: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, ctx: AutomationContext) -> BoxFuture<'static, Result<()>>;
}

struct CycleHandle {
    cancel: CancellationToken,
    task: JoinHandle<CycleOutcome>,
}

/// Owns the single haggle cycle and reacts to operator commands
pub struct Controller {
    ctx: AutomationContext,
    state: StateCell,
    prices: watch::Sender<Arc<PriceIndex>>,
    hotkeys: HotkeyPoller,
    cycle: Option<CycleHandle>,
    /// Aborted cycle that may still be finishing its current poll
    stopping: Option<JoinHandle<CycleOutcome>>,
    satellite: Option<Arc<dyn SatelliteFlow>>,
    satellite_task: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(
        ui: Arc<dyn UiState>,
        input: Arc<dyn InputDriver>,
        settings: Settings,
        policy: Arc<dyn PurchasePolicy>,
    ) -> Self {
        let (prices, prices_rx) = watch::channel(Arc::new(PriceIndex::default()));
        let hotkeys = HotkeyPoller::new(settings.hotkeys.clone());
        let ctx = AutomationContext::new(ui, input, Arc::new(settings), policy, prices_rx);

        Self {
            ctx,
            state: StateCell::new(),
            prices,
            hotkeys,
            cycle: None,
            stopping: None,
            satellite: None,
            satellite_task: None,
        }
    }

    pub fn with_satellite(mut self, flow: Arc<dyn SatelliteFlow>) -> Self {
        self.satellite = Some(flow);
        self
    }

    pub fn state(&self) -> ControlState {
        self.state.get()
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    /// Swap in a new price snapshot; running sessions pick it up at their
    /// next refresh
    pub fn publish_prices(&self, index: PriceIndex) {
        info!("Publishing price index with {} names", index.len());
        self.prices.send_replace(Arc::new(index));
    }

    /// Build the index from fresh quotations and the configured overrides
    pub fn rebuild_prices(&self, base_prices: &[PriceEntry]) {
        let index = build_index(base_prices, &self.ctx.settings.custom_prices);
        self.publish_prices(index);
    }

    pub fn is_cycle_active(&self) -> bool {
        self.cycle
            .as_ref()
            .is_some_and(|cycle| !cycle.task.is_finished())
    }

    /// A stopped cycle has not fully unwound yet; no new cycle starts meanwhile
    pub fn is_stopping(&self) -> bool {
        self.stopping
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn is_satellite_active(&self) -> bool {
        self.satellite_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Feed one host tick worth of key state
    pub fn on_hotkeys(&mut self, is_down: impl Fn(Key) -> bool) {
        for command in self.hotkeys.poll(is_down) {
            self.handle(command);
        }
    }

    pub fn handle(&mut self, command: OperatorCommand) {
        debug!("Operator command {:?}", command);
        match command {
            OperatorCommand::ToggleHaggle => self.toggle_haggle(),
            OperatorCommand::ToggleSatellite => self.toggle_satellite(),
            OperatorCommand::StopAll => self.stop_all(),
        }
    }

    /// Start a cycle, or move the running one toward cancellation.
    ///
    /// Never runs two cycles side by side.
    fn toggle_haggle(&mut self) {
        if self.is_cycle_active() {
            if let Some(cycle) = &self.cycle {
                info!("Stopping haggle cycle");
                self.state.set(ControlState::Cancelling);
                cycle.cancel.cancel();
            }
            return;
        }
        if self.is_stopping() {
            warn!("Previous cycle is still unwinding, start ignored");
            return;
        }
        self.stopping = None;

        info!("Starting haggle cycle");
        self.state.set(ControlState::StartingUp);
        let ctx = self.ctx.for_new_cycle();
        let cancel = ctx.cancel_token();
        let state = self.state.clone();
        let task = tokio::spawn(async move { run_cycle(&ctx, &state).await });
        self.cycle = Some(CycleHandle { cancel, task });
    }

    fn toggle_satellite(&mut self) {
        if self.is_satellite_active() {
            if let Some(task) = self.satellite_task.take() {
                info!("Stopping satellite flow");
                task.abort();
            }
            return;
        }

        let Some(flow) = self.satellite.clone() else {
            warn!("No satellite flow registered");
            return;
        };
        info!("Starting satellite flow {}", flow.name());
        let run = flow.run(self.ctx.for_new_cycle());
        self.satellite_task = Some(tokio::spawn(async move {
            match run.await {
                Ok(()) => info!("Satellite flow {} finished", flow.name()),
                Err(e) if !e.is_fatal() => info!("Satellite flow {} cancelled", flow.name()),
                Err(e) => error!("Satellite flow {} failed: {}", flow.name(), e),
            }
        }));
    }

    /// Hard reset: abort every flow wherever it is, release held keys and
    /// force the state back to idle
    pub fn stop_all(&mut self) {
        info!("Stopping all flows");
        if let Some(cycle) = self.cycle.take() {
            cycle.cancel.cancel();
            cycle.task.abort();
            self.stopping = Some(cycle.task);
        }
        if let Some(task) = self.satellite_task.take() {
            task.abort();
        }
        self.ctx.input.key_up(Key::Control);
        self.state.set(ControlState::Idle);
    }

    /// Wait until a cycle aborted by `stop_all` has fully unwound
    pub async fn await_stopped(&mut self) {
        if let Some(task) = self.stopping.take() {
            if let Err(e) = task.await {
                debug!("Stopped cycle ended: {}", e);
            }
        }
    }

    /// Wait for the current cycle to end. `None` when there was no cycle or
    /// it was aborted.
    pub async fn join_cycle(&mut self) -> Option<CycleOutcome> {
        let cycle = self.cycle.take()?;
        match cycle.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                debug!("Cycle task ended without outcome: {}", e);
                None
            }
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.is_cycle_active() || self.is_satellite_active() {
            self.stop_all();
        }
    }
}
