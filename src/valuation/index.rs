//! Price index built from market quotations and operator overrides

use super::formula;
use crate::error::{HaggleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, warn};

/// A single market quotation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub name: String,
    pub value: f64,
}

impl PriceEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// How an override determines its price
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePrice {
    /// A fixed value
    Value(f64),
    /// Arithmetic over other items, e.g. `{Exotic Coinage}*0.8`
    Formula(String),
}

/// Operator-defined price that replaces whatever the market says
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceOverride {
    pub name: String,
    #[serde(flatten)]
    pub price: OverridePrice,
}

impl PriceOverride {
    pub fn value(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            price: OverridePrice::Value(value),
        }
    }

    pub fn formula(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: OverridePrice::Formula(formula.into()),
        }
    }

    /// Resolve against the index as built so far
    fn resolve(&self, index: &HashMap<String, Vec<PriceEntry>>) -> Result<f64> {
        match &self.price {
            OverridePrice::Value(value) => Ok(*value),
            OverridePrice::Formula(expression) => {
                debug!(
                    "Override {} references {:?}",
                    self.name,
                    formula::placeholders(expression)
                );
                formula::evaluate(expression, |name| {
                    index.get(name).and_then(|e| e.first()).map(|e| e.value)
                })
                .map_err(|source| HaggleError::Formula {
                    name: self.name.clone(),
                    expression: expression.clone(),
                    source,
                })
            }
        }
    }
}

/// Resolved name to candidate quotations lookup.
///
/// Every name maps to a non-empty list; the first entry is canonical.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceIndex {
    entries: HashMap<String, Vec<PriceEntry>>,
}

impl PriceIndex {
    pub fn get(&self, name: &str) -> Option<&[PriceEntry]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Canonical value for `name`
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.entries
            .get(name)
            .and_then(|entries| entries.first())
            .map(|entry| entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Build the index for one refresh cycle.
///
/// Quotations are grouped by name in list order. Overrides are then applied
/// in order, each replacing its name with a single resolved entry; formulas
/// see the values resolved so far in this same pass. A failing override is
/// logged and leaves its name out of the index, the rest of the build
/// continues.
pub fn build_index(base_prices: &[PriceEntry], overrides: &[PriceOverride]) -> PriceIndex {
    let mut entries: HashMap<String, Vec<PriceEntry>> = HashMap::new();

    for entry in base_prices {
        if !entry.value.is_finite() {
            warn!("Ignoring non-finite quotation for {}", entry.name);
            continue;
        }
        entries
            .entry(entry.name.clone())
            .or_default()
            .push(entry.clone());
    }

    for price_override in overrides {
        match price_override.resolve(&entries) {
            Ok(value) => {
                debug!("Override {} resolved to {}", price_override.name, value);
                entries.insert(
                    price_override.name.clone(),
                    vec![PriceEntry::new(price_override.name.clone(), value)],
                );
            }
            Err(e) => {
                error!("Skipping price override: {}", e);
                entries.remove(&price_override.name);
            }
        }
    }

    PriceIndex { entries }
}

/// Load the latest quotation snapshot, a JSON list of `{name, value}`
pub fn load_price_snapshot(path: impl AsRef<Path>) -> Result<Vec<PriceEntry>> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<PriceEntry> = serde_json::from_str(&raw)?;
    Ok(entries)
}
