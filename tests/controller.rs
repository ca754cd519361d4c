use futures::future::BoxFuture;
use futures::FutureExt;
use haggler::control::{AutomationContext, ControlState, Controller, CycleOutcome, SatelliteFlow};
use haggler::sim::{catalog_prices, SimEvent, SimulatedHost};
use haggler::types::{Key, Window};
use haggler::{OperatorCommand, Settings, ThresholdPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn controller(build: impl FnOnce(SimulatedHost) -> SimulatedHost) -> (Controller, Arc<SimulatedHost>) {
    let settings = Settings::default();
    let host = Arc::new(build(SimulatedHost::new(&settings)));
    let controller = Controller::new(
        host.clone(),
        host.clone(),
        settings,
        Arc::new(ThresholdPolicy::new(5.0)),
    );
    controller.rebuild_prices(&catalog_prices());
    (controller, host)
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never held");
}

/// Counts how often it was started and never finishes on its own
struct Idler {
    runs: Arc<AtomicUsize>,
}

impl SatelliteFlow for Idler {
    fn name(&self) -> &str {
        "idler"
    }

    fn run(&self, _ctx: AutomationContext) -> BoxFuture<'static, haggler::Result<()>> {
        let runs = self.runs.clone();
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
        .boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_start_cancels_instead_of_spawning() {
    let (mut controller, host) = controller(|host| host.with_funds(3, 3));

    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::StartingUp);
    assert!(controller.is_cycle_active());

    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::Cancelling);

    let outcome = controller.join_cycle().await;
    assert!(matches!(outcome, Some(CycleOutcome::Cancelled)));
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!host
        .events()
        .contains(&SimEvent::Opened(Window::NegotiationWindow)));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_while_running_cancels_at_boundary() {
    let (mut controller, host) = controller(|host| host.with_funds(3, 3));

    controller.handle(OperatorCommand::ToggleHaggle);
    wait_for(|| controller.state() == ControlState::Running).await;

    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::Cancelling);

    let outcome = controller.join_cycle().await;
    assert!(matches!(outcome, Some(CycleOutcome::Cancelled)));
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!host.is_held(Key::Control));

    let opened = host
        .events()
        .iter()
        .filter(|event| **event == SimEvent::Opened(Window::NegotiationWindow))
        .count();
    assert!(opened >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_cycle_after_previous_one_settled() {
    let (mut controller, host) = controller(|host| host.with_funds(3, 3));
    host.set_negotiation_opens(false);

    controller.handle(OperatorCommand::ToggleHaggle);
    let outcome = controller.join_cycle().await;
    assert!(matches!(outcome, Some(CycleOutcome::StartupFailed(_))));
    assert_eq!(controller.state(), ControlState::Idle);

    host.set_negotiation_opens(true);
    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::StartingUp);
    wait_for(|| controller.state() == ControlState::Running).await;
    controller.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_releases_modifier_mid_gesture() {
    let (mut controller, host) = controller(|host| host.with_funds(3, 3));

    controller.handle(OperatorCommand::ToggleHaggle);
    wait_for(|| host.is_held(Key::Control)).await;

    controller.handle(OperatorCommand::StopAll);

    assert!(!host.is_held(Key::Control));
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!controller.is_cycle_active());
    assert!(controller.join_cycle().await.is_none());

    // The aborted task never touches the host again
    let before = host.events().len();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(host.events().len(), before);
    assert!(!host.is_held(Key::Control));
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_aborts_satellite() {
    let runs = Arc::new(AtomicUsize::new(0));
    let (controller, _host) = controller(|host| host);
    let mut controller = controller.with_satellite(Arc::new(Idler { runs: runs.clone() }));

    controller.handle(OperatorCommand::ToggleSatellite);
    assert!(controller.is_satellite_active());
    wait_for(|| runs.load(Ordering::SeqCst) == 1).await;

    controller.handle(OperatorCommand::StopAll);
    assert!(!controller.is_satellite_active());
    assert_eq!(controller.state(), ControlState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_satellite_toggle_without_flow_is_ignored() {
    let (mut controller, _host) = controller(|host| host);

    controller.handle(OperatorCommand::ToggleSatellite);

    assert!(!controller.is_satellite_active());
    assert_eq!(controller.state(), ControlState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_hotkey_held_down_starts_once() {
    let (mut controller, _host) = controller(|host| host.with_funds(3, 3));

    controller.on_hotkeys(|key| key == Key::Function(6));
    assert_eq!(controller.state(), ControlState::StartingUp);

    // Still held on the next tick, must not toggle into cancellation
    controller.on_hotkeys(|key| key == Key::Function(6));
    assert_eq!(controller.state(), ControlState::StartingUp);

    controller.on_hotkeys(|_| false);
    controller.on_hotkeys(|key| key == Key::Function(7));
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!controller.is_cycle_active());
}

#[tokio::test(start_paused = true)]
async fn test_restart_waits_for_stopped_cycle_to_unwind() {
    let (mut controller, host) = controller(|host| host.with_funds(3, 3));

    controller.handle(OperatorCommand::ToggleHaggle);
    wait_for(|| host.is_held(Key::Control)).await;
    controller.handle(OperatorCommand::StopAll);
    assert!(controller.is_stopping());

    // The aborted task has not been polled to completion yet
    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!controller.is_cycle_active());

    controller.await_stopped().await;
    assert!(!controller.is_stopping());

    controller.handle(OperatorCommand::ToggleHaggle);
    assert_eq!(controller.state(), ControlState::StartingUp);
    assert!(controller.is_cycle_active());
    controller.stop_all();
}
