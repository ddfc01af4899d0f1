//! Mutator and Evaluator scaffolding (spec §4.5). These traits are the
//! opaque collaborator seam the core depends on; `sentinel-node` wires a
//! real evaluation suite behind the same shape. This crate also ships a
//! deterministic in-memory reference implementation used by the rest of
//! the workspace's tests, grounded on the teacher's job-queue scaffolding
//! (`ac_scheduler_runtime::queue::JobQueue`) and session-handle pattern
//! (`ac_aln_rt::session::Session`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sentinel_types::{
    CalibrationCurve, Cost, Evidence, EthicsEvidenceBundle, MetricSet, SentinelError, State,
};

/// Given the champion and a deterministic seed, produce `N` challengers
/// that differ from the champion and from each other by a measurable
/// distance (spec §4.5).
pub trait Mutator {
    fn propose(&self, champion: &State, n: usize, seed: u64) -> Vec<State>;
}

/// Given a challenger, run the fixed evaluation suite and return Evidence.
/// Same challenger + same suite seed must yield the same Evidence (spec
/// §4.5's determinism requirement). `deadline_ms` is wall-clock; an
/// evaluator that cannot finish in time must return
/// `SentinelError::EvaluationTimeout` rather than block past it.
pub trait Evaluator {
    fn evaluate(&self, challenger: &State, seed: u64, deadline_ms: i64) -> Result<Evidence, SentinelError>;
}

/// Parametric-sweep mutator: perturbs each coordinate of the champion by a
/// seeded Gaussian-ish step. Deterministic given `(champion, n, seed)`.
pub struct ParametricSweepMutator {
    pub step_size: f64,
}

impl Default for ParametricSweepMutator {
    fn default() -> Self {
        Self { step_size: 0.05 }
    }
}

impl Mutator for ParametricSweepMutator {
    fn propose(&self, champion: &State, n: usize, seed: u64) -> Vec<State> {
        (0..n)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed ^ (i as u64).wrapping_mul(0x9E3779B97F4A7C15));
                let params: Vec<f64> = champion
                    .params
                    .iter()
                    .map(|p| p + self.step_size * rng.gen_range(-1.0..=1.0))
                    .collect();
                champion.with_params(params, champion.last_updated_ms)
            })
            .collect()
    }
}

/// Deterministic in-memory evaluator: derives synthetic but reproducible
/// Evidence from the challenger's parameters and the suite seed. Intended
/// for unit/property tests, not as a real evaluation suite (spec's
/// Non-goals: no model training or real evaluation harness is part of the
/// core).
#[derive(Default)]
pub struct InMemoryEvaluator {
    pub timeout_challenger_ids: Vec<String>,
}

impl Evaluator for InMemoryEvaluator {
    fn evaluate(&self, challenger: &State, seed: u64, _deadline_ms: i64) -> Result<Evidence, SentinelError> {
        let challenger_id = format!("challenger-v{}", challenger.version);
        if self.timeout_challenger_ids.contains(&challenger_id) {
            return Err(SentinelError::EvaluationTimeout);
        }

        let mut rng = StdRng::seed_from_u64(seed ^ challenger.version);
        let accuracy = 0.5 + 0.5 * (1.0 - (-challenger.norm()).exp()).min(1.0) * rng.gen_range(0.8..=1.0);
        let robustness = rng.gen_range(0.5..=0.95);
        let privacy = rng.gen_range(0.7..=0.99);

        let mut metrics = MetricSet::new();
        metrics.insert(sentinel_types::Metric::new("accuracy", accuracy.clamp(0.0, 1.0), 0.4));
        metrics.insert(sentinel_types::Metric::new("robustness", robustness, 0.4));
        metrics.insert(sentinel_types::Metric::new("privacy", privacy, 0.2));

        let cost = Cost::new()
            .with("time", rng.gen_range(0.05..=0.3))
            .with("tokens", rng.gen_range(0.05..=0.3))
            .with("usd", rng.gen_range(0.0..=0.1))
            .with("energy", rng.gen_range(0.0..=0.1));

        Ok(Evidence {
            challenger_id,
            metrics,
            cost,
            robustness,
            calibration: CalibrationCurve(vec![(0.9, 0.89, 1.0)]),
            bias_ratio: rng.gen_range(0.95..=1.05),
            pii_detected: false,
            consent: true,
            eco_energy_joules: rng.gen_range(10.0..=200.0),
            eco_carbon_grams: rng.gen_range(1.0..=50.0),
            misinformation_score: 0.0,
            epistemic_uncertainty: rng.gen_range(0.0..=0.3),
            ethics: EthicsEvidenceBundle {
                auditability_complete: true,
                explainability_score: rng.gen_range(0.4..=0.9),
                ..Default::default()
            },
        })
    }
}
