//! Command runners behind the `haggler` binary

use crate::config::Settings;
use crate::control::{Controller, CycleOutcome};
use crate::error::Result;
use crate::negotiation::ThresholdPolicy;
use crate::sim::{catalog_prices, SimulatedHost};
use crate::valuation::{build_index, load_price_snapshot, PriceIndex};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
}

/// Render every index name with its resolved value, sorted by name
pub fn format_index(index: &PriceIndex) -> String {
    let mut names = index.names();
    names.sort_unstable();
    names
        .into_iter()
        .map(|name| {
            let value = index.value_of(name).unwrap_or_default();
            format!("{:<40} {:>12.2}\n", name, value)
        })
        .collect()
}

pub fn run_index(prices: &Path, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let base = load_price_snapshot(prices)?;
    let index = build_index(&base, &settings.custom_prices);

    tracing::info!(
        "Built index of {} names from {} quotations and {} overrides",
        index.len(),
        base.len(),
        settings.custom_prices.len()
    );
    print!("{}", format_index(&index));
    Ok(())
}

pub fn run_check_config(config: &Path) -> Result<()> {
    let settings = Settings::load(config)?;
    tracing::info!("Settings in {} are valid", config.display());
    println!(
        "debug_only={} overrides={} hotkeys: start={} stop_all={} satellite={}",
        settings.debug_only,
        settings.custom_prices.len(),
        settings.hotkeys.start,
        settings.hotkeys.stop_all,
        settings.hotkeys.satellite
    );
    Ok(())
}

/// Options of a simulated run
#[derive(Clone, Debug, Default)]
pub struct SimulateOptions {
    pub stall: bool,
    pub no_window: bool,
    pub funds: u32,
}

/// Press the start hotkey against a simulated host and wait for the cycle.
///
/// Ctrl+C acts as the stop-all hotkey.
pub async fn run_simulate(
    config: Option<&Path>,
    prices: Option<&Path>,
    options: SimulateOptions,
) -> Result<Option<CycleOutcome>> {
    let settings = load_settings(config)?;
    let base = match prices {
        Some(path) => load_price_snapshot(path)?,
        None => catalog_prices(),
    };

    let host = Arc::new(SimulatedHost::new(&settings).with_funds(options.funds, options.funds));
    host.set_reroll_stalls(options.stall);
    host.set_negotiation_opens(!options.no_window);

    let policy = Arc::new(ThresholdPolicy::from_settings(&settings.policy));
    let start = settings.hotkeys.start;
    let mut controller = Controller::new(host.clone(), host.clone(), settings, policy);
    controller.rebuild_prices(&base);

    controller.on_hotkeys(|key| key == start);
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.stop_all();
                controller.await_stopped().await;
                break None;
            }
            _ = tokio::time::sleep(TICK) => {
                if !controller.is_cycle_active() {
                    break controller.join_cycle().await;
                }
            }
        }
    };

    match &outcome {
        Some(outcome) => tracing::info!("Cycle ended: {:?}", outcome),
        None => tracing::warn!("Cycle stopped without an outcome"),
    }
    println!("Inventory: {:?}", host.inventory_items());
    println!("Storage:   {:?}", host.stored_items());
    println!("Coins left: {}, rerolls left: {}", host.coins(), host.rerolls());

    Ok(outcome)
}
