use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "BLAKE2b-256")]
    Blake2b256,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

/// Control parameters for a run. Mutated only by the Auto-Tuner, between
/// cycles, never inside one (spec §4.7). Frozen thresholds (`rho_max`,
/// `ece_max`, `bias_max`, and the LO-xx predicates) can never be loosened by
/// the Auto-Tuner — `validate_transition` enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Base step α₀.
    pub alpha_0: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,

    /// Cost penalty exponent λ_c.
    pub lambda_c: f64,
    /// Per-cost-component normalization scales.
    pub cost_scales: BTreeMap<String, f64>,

    /// Metric weights w_j; must sum to 1.0.
    pub metric_weights: BTreeMap<String, f64>,

    /// CAOS base gain κ, default ≥ 20.
    pub kappa: f64,
    pub caos_half_life: u32,
    pub sr_half_life: u32,
    pub caos_min: f64,

    /// Minimum ΔL∞ for promotion.
    pub beta_min: f64,
    pub sr_min: f64,

    /// Gate thresholds — frozen, the Auto-Tuner may never loosen these.
    pub rho_max: f64,
    pub ece_max: f64,
    pub bias_max: f64,

    pub cost_max: f64,
    pub max_norm: f64,
    pub delta_proj: f64,

    pub eco_energy_max_joules: f64,
    pub eco_carbon_max_grams: f64,

    /// Lyapunov target state I*.
    pub lyapunov_target: Vec<f64>,

    pub hash_algorithm: HashAlgorithm,

    pub agape_enabled: bool,
    pub agape_min: f64,
}

/// Fields the Auto-Tuner is permitted to touch (spec §4.7).
pub const AUTOTUNABLE_FIELDS: &[&str] = &["kappa", "lambda_c", "beta_min", "metric_weights"];

/// Fields frozen against any tuning, ever (spec §4.7, §6 config surface).
pub const FROZEN_FIELDS: &[&str] = &["rho_max", "ece_max", "bias_max"];

impl Policy {
    pub fn default_for_dims(n_params: usize) -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("accuracy".to_string(), 0.4);
        weights.insert("robustness".to_string(), 0.4);
        weights.insert("privacy".to_string(), 0.2);

        let mut cost_scales = BTreeMap::new();
        cost_scales.insert("time".to_string(), 0.25);
        cost_scales.insert("tokens".to_string(), 0.25);
        cost_scales.insert("usd".to_string(), 0.25);
        cost_scales.insert("energy".to_string(), 0.25);

        Self {
            alpha_0: 0.01,
            alpha_min: 1e-6,
            alpha_max: 0.1,
            lambda_c: 0.5,
            cost_scales,
            metric_weights: weights,
            kappa: 20.0,
            caos_half_life: 5,
            sr_half_life: 5,
            caos_min: 1.0,
            beta_min: 0.01,
            sr_min: 0.80,
            rho_max: 1.0,
            ece_max: 0.01,
            bias_max: 1.05,
            cost_max: 0.5,
            max_norm: 10.0,
            delta_proj: 0.1,
            eco_energy_max_joules: 5_000.0,
            eco_carbon_max_grams: 500.0,
            lyapunov_target: vec![0.0; n_params],
            hash_algorithm: HashAlgorithm::Sha256,
            agape_enabled: false,
            agape_min: 0.5,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let policy: Policy = serde_json::from_str(&raw)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum: f64 = self.metric_weights.values().sum();
        if self.metric_weights.is_empty() || (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        for (field, value) in [
            ("lambda_c", self.lambda_c),
            ("kappa", self.kappa),
            ("alpha_0", self.alpha_0),
            ("alpha_min", self.alpha_min),
            ("alpha_max", self.alpha_max),
            ("beta_min", self.beta_min),
            ("cost_max", self.cost_max),
            ("max_norm", self.max_norm),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if !(1.0..=100.0).contains(&self.kappa) {
            return Err(ConfigError::OutOfBounds {
                field: "kappa".to_string(),
                value: self.kappa,
                min: 1.0,
                max: 100.0,
            });
        }
        if !(0.0..=10.0).contains(&self.lambda_c) {
            return Err(ConfigError::OutOfBounds {
                field: "lambda_c".to_string(),
                value: self.lambda_c,
                min: 0.0,
                max: 10.0,
            });
        }
        if self.rho_max > 1.0 {
            return Err(ConfigError::OutOfBounds {
                field: "rho_max".to_string(),
                value: self.rho_max,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }

    /// Enforces that a proposed successor policy never loosens a frozen
    /// threshold. This is what the Auto-Tuner must pass its candidate
    /// through before swapping the live Policy snapshot.
    pub fn validate_transition(&self, proposed: &Policy) -> Result<(), ConfigError> {
        proposed.validate()?;
        if proposed.rho_max > self.rho_max {
            return Err(ConfigError::FrozenThresholdLoosened {
                field: "rho_max".to_string(),
                current: self.rho_max,
                proposed: proposed.rho_max,
            });
        }
        if proposed.ece_max > self.ece_max {
            return Err(ConfigError::FrozenThresholdLoosened {
                field: "ece_max".to_string(),
                current: self.ece_max,
                proposed: proposed.ece_max,
            });
        }
        if proposed.bias_max > self.bias_max {
            return Err(ConfigError::FrozenThresholdLoosened {
                field: "bias_max".to_string(),
                current: self.bias_max,
                proposed: proposed.bias_max,
            });
        }
        Ok(())
    }

    pub fn snapshot_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let canonical =
            serde_json::to_vec(self).expect("Policy serialization is infallible for valid data");
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        let p = Policy::default_for_dims(2);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn loosening_rho_max_is_rejected() {
        let base = Policy::default_for_dims(2);
        let mut proposed = base.clone();
        proposed.rho_max = 1.2;
        assert!(matches!(
            base.validate_transition(&proposed),
            Err(ConfigError::FrozenThresholdLoosened { .. })
        ));
    }

    #[test]
    fn tightening_ece_max_is_allowed() {
        let base = Policy::default_for_dims(2);
        let mut proposed = base.clone();
        proposed.ece_max = 0.005;
        assert!(base.validate_transition(&proposed).is_ok());
    }
}
