use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

/// Vector of non-negative scalars (time, tokens, USD, energy, …), each
/// normalized into `[0,1]` by a policy-supplied scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cost(BTreeMap<String, f64>);

impl Cost {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn validate(&self) -> Result<(), EvidenceError> {
        for (name, value) in self.0.iter() {
            if value.is_nan() {
                return Err(EvidenceError::NanCost {
                    name: name.clone(),
                });
            }
            if *value < 0.0 {
                return Err(EvidenceError::NegativeCost {
                    name: name.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }

    /// Weighted total per policy-supplied per-component scales. Components
    /// absent from `scales` contribute 0 (they are assumed unscaled/unused).
    pub fn total(&self, scales: &BTreeMap<String, f64>) -> f64 {
        self.0
            .iter()
            .map(|(name, value)| scales.get(name).copied().unwrap_or(0.0) * value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_cost_component_is_rejected() {
        let cost = Cost::new().with("time", -1.0);
        assert!(matches!(
            cost.validate(),
            Err(EvidenceError::NegativeCost { .. })
        ));
    }

    #[test]
    fn total_applies_scales_and_defaults_missing_to_zero() {
        let cost = Cost::new().with("time", 2.0).with("tokens", 10.0);
        let mut scales = BTreeMap::new();
        scales.insert("time".to_string(), 0.5);
        // "tokens" intentionally left unscaled.
        assert_eq!(cost.total(&scales), 1.0);
    }
}
