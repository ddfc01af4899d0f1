//! The Auto-Tuner (spec §4.7): between cycles, never during one, adjusts a
//! restricted subset of Policy fields (κ, λ_c, β_min, metric weights) via
//! an online AdaGrad-like update with hard bounds. Never relaxes a frozen
//! safety threshold — `Policy::validate_transition` is the final backstop.
//!
//! Grounded on the teacher's bounded-reward-scalar style in
//! `Church-of-FEAR::token::rewards::compute_tech_reward` (a small pure
//! function over a bounded input) and on `governance-core::autonomy`'s
//! `IncidentStats`-style running empirical tracking for the regret
//! diagnostic.

use std::collections::BTreeMap;

use sentinel_types::{ConfigError, Policy, AUTOTUNABLE_FIELDS};

/// Base learning rate for the `lr_t = lr_0 / sqrt(1 + t)` schedule (see
/// DESIGN.md's Open Question decision on the Auto-Tuner's learning-rate
/// schedule).
pub const LR_0: f64 = 0.05;

/// AdaGrad numerical stabilizer.
const ADAGRAD_EPSILON: f64 = 1e-8;

/// One cycle's worth of gradient-style signal for the tunable fields.
/// Supplied by whatever online estimator sits above this crate (policy
/// gradient, bandit feedback, or a fixed heuristic) — this crate only
/// owns the bounded, AdaGrad-shaped update and the regret bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct TuningSignal {
    pub d_kappa: f64,
    pub d_lambda_c: f64,
    pub d_beta_min: f64,
    pub d_metric_weights: BTreeMap<String, f64>,
    /// Realized ΔL∞ this cycle, under the policy actually used.
    pub realized_delta_l_inf: f64,
    /// ΔL∞ a fixed (untouched) policy would have realized this cycle —
    /// the counterfactual baseline for the regret diagnostic.
    pub counterfactual_delta_l_inf: f64,
}

/// Owns the AdaGrad accumulators and the running regret estimate across
/// cycles. Single-owner, mutated only between cycles (spec §5: "Policy …
/// Auto-Tuner is the sole writer, between cycles, atomically").
#[derive(Debug, Clone)]
pub struct AutoTuner {
    step: u64,
    sq_grad_kappa: f64,
    sq_grad_lambda_c: f64,
    sq_grad_beta_min: f64,
    sq_grad_weights: BTreeMap<String, f64>,
    cumulative_realized: f64,
    cumulative_counterfactual: f64,
}

impl Default for AutoTuner {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoTuner {
    pub fn new() -> Self {
        Self {
            step: 0,
            sq_grad_kappa: 0.0,
            sq_grad_lambda_c: 0.0,
            sq_grad_beta_min: 0.0,
            sq_grad_weights: BTreeMap::new(),
            cumulative_realized: 0.0,
            cumulative_counterfactual: 0.0,
        }
    }

    fn learning_rate(&self) -> f64 {
        LR_0 / (1.0 + self.step as f64).sqrt()
    }

    fn adagrad_step(accumulator: &mut f64, gradient: f64, lr: f64) -> f64 {
        *accumulator += gradient * gradient;
        lr * gradient / (accumulator.sqrt() + ADAGRAD_EPSILON)
    }

    /// Produce a candidate Policy reflecting one AdaGrad step, validated
    /// against `current` so no frozen threshold is ever loosened (spec
    /// §4.7). Returns the candidate; the caller is responsible for
    /// swapping it in atomically once accepted.
    pub fn propose(&mut self, current: &Policy, signal: &TuningSignal) -> Result<Policy, ConfigError> {
        let lr = self.learning_rate();
        let mut proposed = current.clone();

        let d_kappa = Self::adagrad_step(&mut self.sq_grad_kappa, signal.d_kappa, lr);
        proposed.kappa = (current.kappa + d_kappa).clamp(1.0, 100.0);

        let d_lambda_c = Self::adagrad_step(&mut self.sq_grad_lambda_c, signal.d_lambda_c, lr);
        proposed.lambda_c = (current.lambda_c + d_lambda_c).clamp(0.0, 10.0);

        let d_beta_min = Self::adagrad_step(&mut self.sq_grad_beta_min, signal.d_beta_min, lr);
        proposed.beta_min = (current.beta_min + d_beta_min).max(0.0);

        for (name, weight) in proposed.metric_weights.iter_mut() {
            let gradient = signal.d_metric_weights.get(name).copied().unwrap_or(0.0);
            let accumulator = self.sq_grad_weights.entry(name.clone()).or_insert(0.0);
            let delta = Self::adagrad_step(accumulator, gradient, lr);
            *weight = (*weight + delta).max(0.0);
        }
        let weight_sum: f64 = proposed.metric_weights.values().sum();
        if weight_sum > 0.0 {
            for weight in proposed.metric_weights.values_mut() {
                *weight /= weight_sum;
            }
        }

        current.validate_transition(&proposed)?;

        self.step += 1;
        self.cumulative_realized += signal.realized_delta_l_inf;
        self.cumulative_counterfactual += signal.counterfactual_delta_l_inf;

        tracing::info!(
            step = self.step,
            kappa = proposed.kappa,
            lambda_c = proposed.lambda_c,
            beta_min = proposed.beta_min,
            regret = self.regret(),
            "auto-tuner proposed a new policy"
        );

        Ok(proposed)
    }

    /// Running regret: counterfactual minus realized cumulative ΔL∞.
    /// Positive regret means the fixed baseline would have outperformed
    /// the tuned policy so far.
    pub fn regret(&self) -> f64 {
        self.cumulative_counterfactual - self.cumulative_realized
    }

    pub fn step(&self) -> u64 {
        self.step
    }
}

/// Fields this crate is permitted to touch, re-exported for callers that
/// want to assert a proposed transition only ever changed these.
pub fn tunable_fields() -> &'static [&'static str] {
    AUTOTUNABLE_FIELDS
}
