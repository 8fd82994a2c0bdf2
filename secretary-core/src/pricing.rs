//! Token pricing for cost estimates.
//!
//! Prices are USD per one million tokens. The table is static and read-only
//! once built; a model without an entry is priced at zero rather than
//! failing the request.

use std::collections::HashMap;
use tracing::warn;

/// Model the default table carries a price for
pub const DEFAULT_PRICED_MODEL: &str = "gpt-4o-mini";

/// Pricing per 1M tokens for a model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelPricing {
    /// USD per 1M input tokens.
    pub input_per_m: f64,
    /// USD per 1M output tokens.
    pub output_per_m: f64,
}

impl ModelPricing {
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for given token counts.
    pub fn compute_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_per_m;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_per_m;
        input_cost + output_cost
    }
}

/// Model name to price lookup table.
#[derive(Debug, Clone)]
pub struct PricingRegistry {
    pricing: HashMap<String, ModelPricing>,
}

impl Default for PricingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingRegistry {
    /// Create a registry with the default price table.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.add(DEFAULT_PRICED_MODEL, ModelPricing::new(0.15, 0.60));
        registry
    }

    /// Create a registry with no prices at all.
    pub fn empty() -> Self {
        Self {
            pricing: HashMap::new(),
        }
    }

    fn add(&mut self, model: &str, pricing: ModelPricing) {
        self.pricing.insert(model.to_string(), pricing);
    }

    pub fn lookup(&self, model: &str) -> Option<ModelPricing> {
        self.pricing.get(model).copied()
    }

    /// Estimated USD cost of a completion.
    ///
    /// Unknown models cost nothing.
    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        match self.lookup(model) {
            Some(pricing) => pricing.compute_cost(input_tokens, output_tokens),
            None => {
                warn!(model, "No pricing entry for model, reporting zero cost");
                0.0
            }
        }
    }
}

/// Round a USD amount to 6 decimal places for reporting.
pub fn round_usd(cost: f64) -> f64 {
    (cost * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_model_prices() {
        let registry = PricingRegistry::new();
        assert!((registry.cost("gpt-4o-mini", 1_000_000, 0) - 0.15).abs() < EPS);
        assert!((registry.cost("gpt-4o-mini", 0, 1_000_000) - 0.60).abs() < EPS);
        assert!((registry.cost("gpt-4o-mini", 10, 5) - 0.0000045).abs() < EPS);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let registry = PricingRegistry::new();
        assert_eq!(registry.lookup("gpt-4o"), None);
        assert_eq!(registry.cost("gpt-4o", 1_000_000, 1_000_000), 0.0);
        assert_eq!(registry.cost("", 42, 7), 0.0);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = PricingRegistry::new();
        assert!(registry.lookup("gpt-4o-mini").is_some());
        assert!(registry.lookup("GPT-4O-MINI").is_none());
    }

    #[test]
    fn test_empty_registry_prices_nothing() {
        let registry = PricingRegistry::empty();
        assert_eq!(registry.cost("gpt-4o-mini", 1_000_000, 1_000_000), 0.0);
    }

    #[test]
    fn test_round_usd() {
        assert_eq!(round_usd(0.0000046), 0.000005);
        assert_eq!(round_usd(0.1234564), 0.123456);
        assert_eq!(round_usd(0.0), 0.0);
    }
}
