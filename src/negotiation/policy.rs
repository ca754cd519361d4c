//! Purchase selection strategies

use super::types::NegotiationItem;
use crate::config::PolicySettings;
use std::collections::{HashMap, HashSet};

/// Decides which priced items are worth buying.
///
/// Kept free of any UI access so selection can be tested on plain items.
pub trait PurchasePolicy: Send + Sync {
    fn should_purchase(&self, item: &NegotiationItem) -> bool;

    /// Categories this policy never buys, reported at session start
    fn disabled_categories(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Buy anything whose total value reaches a threshold
#[derive(Clone, Debug, Default)]
pub struct ThresholdPolicy {
    min_total_value: f64,
    category_minimums: HashMap<String, f64>,
    disabled: HashSet<String>,
}

impl ThresholdPolicy {
    pub fn new(min_total_value: f64) -> Self {
        Self {
            min_total_value,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &PolicySettings) -> Self {
        Self {
            min_total_value: settings.min_total_value,
            category_minimums: settings.category_minimums.clone(),
            disabled: settings.disabled_categories.iter().cloned().collect(),
        }
    }

    pub fn with_category_minimum(mut self, category: impl Into<String>, minimum: f64) -> Self {
        self.category_minimums.insert(category.into(), minimum);
        self
    }

    pub fn disable_category(mut self, category: impl Into<String>) -> Self {
        self.disabled.insert(category.into());
        self
    }
}

impl PurchasePolicy for ThresholdPolicy {
    fn should_purchase(&self, item: &NegotiationItem) -> bool {
        if self.disabled.contains(&item.category) || item.total_price <= 0.0 {
            return false;
        }
        let minimum = self
            .category_minimums
            .get(&item.category)
            .copied()
            .unwrap_or(self.min_total_value);
        item.total_price >= minimum
    }

    fn disabled_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.disabled.iter().cloned().collect();
        categories.sort();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::types::ItemState;

    fn item(category: &str, total: f64) -> NegotiationItem {
        NegotiationItem {
            name: "Test".to_string(),
            category: category.to_string(),
            quantity: 1,
            unit_value: total,
            total_price: total,
            state: ItemState::Priced,
            rect: None,
        }
    }

    #[test]
    fn test_threshold() {
        let policy = ThresholdPolicy::new(5.0);
        assert!(policy.should_purchase(&item("Lesser", 5.0)));
        assert!(!policy.should_purchase(&item("Lesser", 4.9)));
    }

    #[test]
    fn test_unpriced_items_never_bought() {
        let policy = ThresholdPolicy::new(0.0);
        assert!(!policy.should_purchase(&item("Lesser", 0.0)));
    }

    #[test]
    fn test_category_minimum_overrides_default() {
        let policy = ThresholdPolicy::new(5.0).with_category_minimum("Grand", 20.0);
        assert!(!policy.should_purchase(&item("Grand", 10.0)));
        assert!(policy.should_purchase(&item("Greater", 10.0)));
    }

    #[test]
    fn test_disabled_category() {
        let policy = ThresholdPolicy::new(1.0).disable_category("Exceptional");
        assert!(!policy.should_purchase(&item("Exceptional", 500.0)));
        assert_eq!(policy.disabled_categories(), vec!["Exceptional"]);
    }

    #[test]
    fn test_from_settings() {
        let settings = PolicySettings {
            min_total_value: 2.0,
            category_minimums: HashMap::from([("Grand".to_string(), 8.0)]),
            disabled_categories: vec!["Lesser".to_string()],
        };
        let policy = ThresholdPolicy::from_settings(&settings);
        assert!(policy.should_purchase(&item("Greater", 2.0)));
        assert!(!policy.should_purchase(&item("Grand", 7.0)));
        assert!(!policy.should_purchase(&item("Lesser", 100.0)));
    }
}
