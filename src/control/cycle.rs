//! One full haggle cycle: navigate in, run rounds until exhausted, clean up

use super::inventory::{clear_inventory, should_clear_inventory};
use super::state::{ControlState, StateCell};
use super::AutomationContext;
use crate::error::{HaggleError, Result};
use crate::negotiation::NegotiationSession;
use crate::types::Window;
use crate::wait::settle;
use std::fmt;
use tracing::{debug, error, info, warn};

/// How a cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing left worth doing
    Completed,
    /// Operator stop observed at a step boundary
    Cancelled,
    /// Never reached the running state; no cleanup was attempted
    StartupFailed(HaggleError),
    /// A running step failed; cleanup ran unless the failure was navigation
    Aborted { step: Step, error: HaggleError },
}

/// Discrete steps of a running iteration, for failure context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Round,
    ClearInventory,
    Reroll,
    Refresh,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Round => "purchase round",
            Step::ClearInventory => "inventory clearing",
            Step::Reroll => "reroll",
            Step::Refresh => "session refresh",
        };
        write!(f, "{}", label)
    }
}

/// Drive one cycle to completion and leave the state at `Idle`.
///
/// The caller has already moved the state to `StartingUp`.
pub async fn run_cycle(ctx: &AutomationContext, state: &StateCell) -> CycleOutcome {
    info!("Starting haggle cycle");

    let mut session = match start_up(ctx).await {
        Ok(session) => session,
        Err(HaggleError::Cancelled) => {
            info!("Cycle cancelled during start-up");
            state.set(ControlState::Idle);
            return CycleOutcome::Cancelled;
        }
        Err(e) => {
            error!("Could not start haggle cycle: {}", e);
            state.set(ControlState::Idle);
            return CycleOutcome::StartupFailed(e);
        }
    };
    state.transition(ControlState::StartingUp, ControlState::Running);

    let mut step = Step::Round;
    let mut skip_cleanup = ctx.settings.debug_only;
    let outcome = match run_rounds(ctx, &mut session, &mut step).await {
        Ok(()) => {
            info!("Haggle cycle finished");
            CycleOutcome::Completed
        }
        Err(HaggleError::Cancelled) => {
            info!("Haggle cycle cancelled by operator");
            CycleOutcome::Cancelled
        }
        Err(e) => {
            error!(
                "Haggle cycle aborted during {} ({} coins, {} rerolls left): {}",
                step,
                session.coins(),
                session.rerolls(),
                e
            );
            // No cleanup after a failed navigation
            skip_cleanup |= e.is_navigation_failure();
            CycleOutcome::Aborted { step, error: e }
        }
    };

    info!(
        "Final offer state (exhausted: {})\n{}",
        session.is_exhausted(),
        session.report()
    );

    if skip_cleanup {
        debug!("Skipping final inventory clearing");
    } else if let Err(e) = clear_inventory(ctx).await {
        warn!("Final inventory clearing failed: {}", e);
    }

    state.set(ControlState::Idle);
    outcome
}

async fn start_up(ctx: &AutomationContext) -> Result<NegotiationSession> {
    ctx.checkpoint()?;
    ctx.navigator().navigate_to_negotiation_target().await?;
    if !ctx.ui.is_visible(Window::NegotiationWindow) {
        return Err(HaggleError::Navigation(
            "negotiation window not open after navigation".to_string(),
        ));
    }
    ctx.checkpoint()?;

    debug!("Initializing negotiation session");
    NegotiationSession::initialize(ctx, ctx.latest_prices())
}

async fn run_rounds(
    ctx: &AutomationContext,
    session: &mut NegotiationSession,
    step: &mut Step,
) -> Result<()> {
    let settings = ctx.settings.clone();

    while session.can_continue() || settings.debug_only {
        ctx.checkpoint()?;
        *step = Step::Round;
        let purchased = session.run_round(ctx).await?;
        if settings.debug_only {
            break;
        }
        settle(settings.settle_delay()).await;

        ctx.checkpoint()?;
        *step = Step::ClearInventory;
        if should_clear_inventory(ctx) {
            clear_inventory(ctx).await?;
        }
        settle(settings.settle_delay()).await;

        ctx.checkpoint()?;
        *step = Step::Reroll;
        if session.is_stale() {
            warn!("Negotiation window closed between steps, reopening it");
            ctx.navigator().navigate_to_negotiation_target().await?;
        }
        let rerolled = session.coins() > 0;
        if rerolled {
            session.reroll(ctx).await?;
        }

        ctx.checkpoint()?;
        *step = Step::Refresh;
        session.refresh(ctx.latest_prices())?;
        if purchased == 0 && !rerolled {
            debug!("Round made no progress, session exhausted");
            session.mark_exhausted();
        }
        settle(settings.settle_delay()).await;
    }

    Ok(())
}
