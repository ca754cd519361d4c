//! Polling wait primitive every higher step suspends on

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Re-evaluate `predicate` once per `poll_interval` until it holds or
/// `timeout` elapses.
///
/// Returns `true` as soon as the predicate holds (without sleeping when it
/// already holds on the first poll). On timeout the predicate gets one last
/// evaluation at the deadline, `failure_message` is logged and `false` is
/// returned. Never retries beyond the deadline; that decision belongs to the
/// caller.
pub async fn await_condition<F>(
    mut predicate: F,
    poll_interval: Duration,
    timeout: Duration,
    failure_message: &str,
) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    let poll_interval = poll_interval.max(Duration::from_millis(1));

    loop {
        if predicate() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        // Never sleep past the deadline, so rounding cannot cut the window short
        sleep(poll_interval.min(deadline - now)).await;
    }

    warn!("{} (waited {:?})", failure_message, timeout);
    false
}

/// Fixed delay that lets the host UI catch up with the last input
pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        debug!("Settling for {:?}", delay);
        sleep(delay).await;
    }
}
