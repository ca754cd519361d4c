use haggler::control::{run_cycle, ControlState, CycleOutcome, StateCell, Step};
use haggler::error::HaggleError;
use haggler::sim::{catalog_prices, SimEvent, SimulatedHost};
use haggler::types::{Key, Window};
use haggler::ui::UiState;
use haggler::{build_index, AutomationContext, PriceIndex, Settings, ThresholdPolicy};
use std::sync::Arc;
use tokio::sync::watch;

struct Harness {
    host: Arc<SimulatedHost>,
    ctx: AutomationContext,
    state: StateCell,
    _prices: watch::Sender<Arc<PriceIndex>>,
}

fn harness(settings: Settings, build: impl FnOnce(SimulatedHost) -> SimulatedHost) -> Harness {
    let host = Arc::new(build(SimulatedHost::new(&settings)));
    let (prices, prices_rx) = watch::channel(Arc::new(build_index(&catalog_prices(), &[])));
    let ctx = AutomationContext::new(
        host.clone(),
        host.clone(),
        Arc::new(settings),
        Arc::new(ThresholdPolicy::new(5.0)),
        prices_rx,
    );
    let state = StateCell::new();
    state.set(ControlState::StartingUp);

    Harness {
        host,
        ctx,
        state,
        _prices: prices,
    }
}

fn count(events: &[SimEvent], wanted: &SimEvent) -> usize {
    events.iter().filter(|event| *event == wanted).count()
}

fn purchases(events: &[SimEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SimEvent::Purchased(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_cycle_buys_worthwhile_items_and_stashes_them() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[("Astragali", "Grand", 1), ("Scrap Metal", "Lesser", 2)])
    });

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(outcome, CycleOutcome::Completed));
    assert_eq!(h.state.get(), ControlState::Idle);
    assert_eq!(h.host.stored_items(), vec!["Astragali"]);
    assert!(h.host.inventory_items().is_empty());
    assert_eq!(h.host.offers().len(), 1);
    assert!(!h.host.is_held(Key::Control));
}

#[tokio::test(start_paused = true)]
async fn test_window_never_opens_fails_start_up() {
    let h = harness(Settings::default(), |host| host.with_funds(3, 3));
    h.host.set_negotiation_opens(false);

    let outcome = run_cycle(&h.ctx, &h.state).await;

    match outcome {
        CycleOutcome::StartupFailed(HaggleError::Navigation(_)) => {}
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(h.state.get(), ControlState::Idle);

    let events = h.host.events();
    assert_eq!(purchases(&events), 0);
    assert_eq!(count(&events, &SimEvent::Opened(Window::StorageWindow)), 0);
    assert_eq!(h.host.rerolls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reroll_stall_aborts_after_one_clearing_pass() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[("Astragali", "Grand", 1)])
            .with_funds(3, 3)
    });
    h.host.set_reroll_stalls(true);

    let outcome = run_cycle(&h.ctx, &h.state).await;

    match outcome {
        CycleOutcome::Aborted {
            step: Step::Reroll,
            error: HaggleError::Stall { before, observed },
        } => {
            assert_eq!(before, 3);
            assert_eq!(observed, 3);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(h.state.get(), ControlState::Idle);

    let events = h.host.events();
    assert_eq!(count(&events, &SimEvent::Opened(Window::StorageWindow)), 1);
    assert_eq!(h.host.stored_items(), vec!["Astragali"]);
    assert!(!h.host.is_held(Key::Control));
}

#[tokio::test(start_paused = true)]
async fn test_spent_counter_with_coins_left_is_a_stall() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[("Scrap Metal", "Lesser", 1)])
            .with_funds(2, 0)
    });

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(
        outcome,
        CycleOutcome::Aborted {
            step: Step::Reroll,
            ..
        }
    ));
    assert_eq!(h.state.get(), ControlState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_round_observed_between_purchases() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[
            ("Astragali", "Grand", 1),
            ("Burial Medallion", "Exceptional", 1),
            ("Exotic Coinage", "Greater", 2),
        ])
        .with_funds(3, 3)
    });
    let token = h.ctx.cancel_token();
    h.host.set_hook(move |event| {
        if matches!(event, SimEvent::Purchased(_)) {
            token.cancel();
        }
    });

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(outcome, CycleOutcome::Cancelled));
    assert_eq!(h.state.get(), ControlState::Idle);
    assert!(!h.host.is_held(Key::Control));

    let events = h.host.events();
    // The purchase in flight completed, nothing after it started
    assert_eq!(purchases(&events), 1);
    assert_eq!(
        count(
            &events,
            &SimEvent::PurchaseDialogOpened("Burial Medallion".to_string())
        ),
        0
    );
    assert!(!h.host.is_visible(Window::NegotiationSubDialog));
    assert_eq!(h.host.rerolls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_touches_nothing() {
    let h = harness(Settings::default(), |host| host.with_funds(3, 3));
    h.ctx.cancel_token().cancel();

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(outcome, CycleOutcome::Cancelled));
    assert_eq!(h.state.get(), ControlState::Idle);
    assert!(h.host.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_debug_only_evaluates_one_round_without_input() {
    let settings = Settings {
        debug_only: true,
        ..Settings::default()
    };
    let h = harness(settings, |host| {
        host.with_offers(&[("Astragali", "Grand", 1)])
            .with_funds(3, 3)
    });

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(outcome, CycleOutcome::Completed));
    let events = h.host.events();
    assert_eq!(purchases(&events), 0);
    assert_eq!(count(&events, &SimEvent::Opened(Window::StorageWindow)), 0);
    assert_eq!(h.host.rerolls(), 3);
    assert_eq!(h.host.offers().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_full_inventory_cleared_between_rounds() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[("Astragali", "Grand", 1)])
            .with_funds(1, 1)
    });
    h.host.fill_column(10, "Chaos Orb");
    h.host.fill_column(11, "Portal Scroll");

    let outcome = run_cycle(&h.ctx, &h.state).await;

    assert!(matches!(outcome, CycleOutcome::Completed));
    let stored = h.host.stored_items();
    assert!(stored.contains(&"Astragali".to_string()));
    assert!(stored.iter().filter(|name| *name == "Chaos Orb").count() >= 5);
    // The reserved column is never touched
    assert_eq!(
        h.host
            .inventory_items()
            .iter()
            .filter(|name| *name == "Portal Scroll")
            .count(),
        5
    );
    assert_eq!(h.host.rerolls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_purchase_dialog_skips_item() {
    let h = harness(Settings::default(), |host| {
        host.with_offers(&[("Astragali", "Grand", 1)])
    });
    h.host.set_dialog_responds(false);

    let outcome = run_cycle(&h.ctx, &h.state).await;

    // Nothing bought and no coins to reroll, so the session runs dry
    assert!(matches!(outcome, CycleOutcome::Completed));
    assert_eq!(purchases(&h.host.events()), 0);
    assert_eq!(h.host.offers().len(), 1);
    assert!(h.host.stored_items().is_empty());
}

/// Counts label scans, i.e. navigation attempts
struct ScanCounter {
    host: Arc<SimulatedHost>,
    scans: std::sync::atomic::AtomicUsize,
}

impl UiState for ScanCounter {
    fn is_visible(&self, window: Window) -> bool {
        self.host.is_visible(window)
    }

    fn ground_labels(&self) -> Vec<haggler::types::GroundLabel> {
        self.scans.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.host.ground_labels()
    }

    fn inventory_slots(&self) -> Vec<haggler::types::InventorySlot> {
        self.host.inventory_slots()
    }

    fn negotiation_offer(&self) -> Option<haggler::types::OfferSnapshot> {
        self.host.negotiation_offer()
    }
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_storage_is_not_retried_by_cleanup() {
    let settings = Settings::default();
    let host = Arc::new(
        SimulatedHost::new(&settings)
            .with_offers(&[("Astragali", "Grand", 1)])
            .with_funds(1, 1),
    );
    host.fill_column(10, "Chaos Orb");
    host.set_label_visible(Window::StorageWindow, false);
    let ui = Arc::new(ScanCounter {
        host: host.clone(),
        scans: std::sync::atomic::AtomicUsize::new(0),
    });
    let (_prices, prices_rx) = watch::channel(Arc::new(build_index(&catalog_prices(), &[])));
    let ctx = AutomationContext::new(
        ui.clone(),
        host.clone(),
        Arc::new(settings),
        Arc::new(ThresholdPolicy::new(5.0)),
        prices_rx,
    );
    let state = StateCell::new();
    state.set(ControlState::StartingUp);

    let outcome = run_cycle(&ctx, &state).await;

    match outcome {
        CycleOutcome::Aborted {
            step: Step::ClearInventory,
            error: HaggleError::Navigation(_),
        } => {}
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(state.get(), ControlState::Idle);
    // Start-up navigation plus the one failed storage attempt
    assert_eq!(ui.scans.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert!(host.stored_items().is_empty());
    assert!(!host.is_held(Key::Control));
}
