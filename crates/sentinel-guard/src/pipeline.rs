//! The Sigma-Guard fail-closed gate pipeline (spec §4.3).
//!
//! Eleven gates run independently and unconditionally — a failure in one
//! never suppresses the evaluation of another, so the audit trail always
//! carries every gate's result, not just the first failure. The pipeline
//! then folds the eleven (or twelve, with the optional Agape gate) results
//! into one `Verdict` by severity: any Rollback-severity failure wins over
//! any Reject-severity failure, which wins over a clean Promote.

use sentinel_types::{Evidence, GateResult, Policy, State, Verdict};

use crate::laws::{agape_index, evaluate_all, EthicsContext};

/// Everything the pipeline needs beyond `(Evidence, Policy)` — the scalar
/// outputs of the Aggregator, Motor, and the tentative Update Engine
/// candidate, bundled once so the eleven gates each read from one place
/// (grounded on `tsafe-cortex-gate::guardians::GuardInput`-style input
/// bundles in the teacher pack).
pub struct CycleInputs<'a> {
    pub state_before: &'a State,
    /// The state the Update Engine would commit to if this cycle promotes.
    /// `None` when no projection was attempted (e.g. the Aggregator already
    /// rejected the challenger upstream) — the Lyapunov gate is then marked
    /// `NotApplicable` rather than failed.
    pub state_candidate: Option<&'a State>,
    pub policy: &'a Policy,
    pub evidence: &'a Evidence,
    /// ρ = H(L_ψ(k)) / H(k), computed by the Evaluator's sensitivity probe.
    pub rho: f64,
    pub caos_plus: f64,
    pub sr: f64,
    pub delta_l_inf: f64,
    pub cost_increase: f64,
}

/// Severity a failing gate carries into the final `Verdict::action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Reject,
    Rollback,
}

fn lyapunov_v(state: &State, target: &[f64]) -> f64 {
    state
        .params
        .iter()
        .zip(target.iter().chain(std::iter::repeat(&0.0)))
        .map(|(p, t)| (p - t) * (p - t))
        .sum()
}

fn gate_contractivity(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "contractivity";
    let result = if inputs.rho < inputs.policy.rho_max {
        GateResult::pass(name, inputs.rho, inputs.policy.rho_max)
    } else {
        GateResult::fail(
            name,
            inputs.rho,
            inputs.policy.rho_max,
            "rho is not strictly below rho_max",
        )
    };
    (result, Severity::Rollback)
}

fn gate_calibration(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "calibration";
    let ece = inputs.evidence.calibration.ece();
    let result = if ece <= inputs.policy.ece_max {
        GateResult::pass(name, ece, inputs.policy.ece_max)
    } else {
        GateResult::fail(name, ece, inputs.policy.ece_max, "ECE exceeds ece_max")
    };
    (result, Severity::Rollback)
}

fn gate_bias(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "bias";
    let bias = inputs.evidence.bias_ratio;
    let result = if bias <= inputs.policy.bias_max {
        GateResult::pass(name, bias, inputs.policy.bias_max)
    } else {
        GateResult::fail(name, bias, inputs.policy.bias_max, "bias ratio exceeds bias_max")
    };
    (result, Severity::Rollback)
}

fn gate_lyapunov(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "lyapunov";
    let result = match inputs.state_candidate {
        None => GateResult::not_applicable(name, "no candidate state was projected"),
        Some(candidate) => {
            let v_before = lyapunov_v(inputs.state_before, &inputs.policy.lyapunov_target);
            let v_after = lyapunov_v(candidate, &inputs.policy.lyapunov_target);
            if v_after < v_before {
                GateResult::pass(name, v_after, v_before)
            } else {
                GateResult::fail(
                    name,
                    v_after,
                    v_before,
                    "V(I_{t+1}) did not strictly decrease",
                )
            }
        }
    };
    (result, Severity::Rollback)
}

fn gate_sr_minimum(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "sr_minimum";
    let result = if inputs.sr >= inputs.policy.sr_min {
        GateResult::pass(name, inputs.sr, inputs.policy.sr_min)
    } else {
        GateResult::fail(name, inputs.sr, inputs.policy.sr_min, "SR below sr_min")
    };
    (result, Severity::Reject)
}

fn gate_delta_l_inf_growth(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "delta_l_inf_growth";
    let result = if inputs.delta_l_inf >= inputs.policy.beta_min {
        GateResult::pass(name, inputs.delta_l_inf, inputs.policy.beta_min)
    } else {
        GateResult::fail(
            name,
            inputs.delta_l_inf,
            inputs.policy.beta_min,
            "delta L-infinity below beta_min",
        )
    };
    (result, Severity::Reject)
}

fn gate_caos_floor(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "caos_floor";
    let result = if inputs.caos_plus >= inputs.policy.caos_min {
        GateResult::pass(name, inputs.caos_plus, inputs.policy.caos_min)
    } else {
        GateResult::fail(
            name,
            inputs.caos_plus,
            inputs.policy.caos_min,
            "CAOS+ below caos_min",
        )
    };
    (result, Severity::Reject)
}

fn gate_cost_budget(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "cost_budget";
    let result = if inputs.cost_increase <= inputs.policy.cost_max {
        GateResult::pass(name, inputs.cost_increase, inputs.policy.cost_max)
    } else {
        GateResult::fail(
            name,
            inputs.cost_increase,
            inputs.policy.cost_max,
            "cost increase exceeds cost_max",
        )
    };
    (result, Severity::Reject)
}

fn gate_consent(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "consent";
    let consent = inputs.evidence.consent;
    let result = if consent {
        GateResult::pass(name, 1.0, 1.0)
    } else {
        GateResult::fail(name, 0.0, 1.0, "consent flag is false")
    };
    (result, Severity::Rollback)
}

fn gate_eco(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "eco";
    let e = inputs.evidence;
    let p = inputs.policy;
    let eco_ok = e.eco_energy_joules <= p.eco_energy_max_joules
        && e.eco_carbon_grams <= p.eco_carbon_max_grams;
    let result = if eco_ok {
        GateResult::pass(name, 1.0, 1.0)
    } else {
        GateResult::fail(
            name,
            0.0,
            1.0,
            format!(
                "energy {:.1}J/carbon {:.1}g exceeds eco caps",
                e.eco_energy_joules, e.eco_carbon_grams
            ),
        )
    };
    (result, Severity::Rollback)
}

fn gate_ethics(inputs: &CycleInputs) -> (GateResult, Severity) {
    let name = "ethics";
    let ctx = EthicsContext { rho: inputs.rho };
    let verdicts = evaluate_all(inputs.evidence, inputs.policy, &ctx);
    let failed: Vec<_> = verdicts
        .iter()
        .filter_map(|v| match v {
            sentinel_types::EthicsVerdict::Fail { law, evidence } => {
                Some(format!("{}: {}", law.code(), evidence))
            }
            sentinel_types::EthicsVerdict::Pass => None,
        })
        .collect();
    let result = if failed.is_empty() {
        GateResult::pass(name, 0.0, 0.0)
    } else {
        GateResult::fail(name, failed.len() as f64, 0.0, failed.join("; "))
    };
    (result, Severity::Rollback)
}

fn gate_agape(inputs: &CycleInputs) -> Option<(GateResult, Severity)> {
    if !inputs.policy.agape_enabled {
        return None;
    }
    let name = "agape_index";
    let score = agape_index(inputs.evidence, &inputs.evidence.cost, inputs.policy);
    let result = if score >= inputs.policy.agape_min {
        GateResult::pass(name, score, inputs.policy.agape_min)
    } else {
        GateResult::fail(name, score, inputs.policy.agape_min, "agape index below agape_min")
    };
    Some((result, Severity::Reject))
}

/// Run every gate and fold the results into one `Verdict`. Never
/// short-circuits: all gates are always evaluated and recorded, even once a
/// Rollback-severity failure is already known (spec §4.3).
pub fn run(inputs: &CycleInputs) -> Verdict {
    let mut gates: Vec<GateResult> = Vec::with_capacity(12);
    let mut worst: Option<Severity> = None;

    let mut record = |pair: (GateResult, Severity), gates: &mut Vec<GateResult>, worst: &mut Option<Severity>| {
        let (result, severity) = pair;
        if result.is_fail() {
            *worst = Some(match worst {
                Some(Severity::Rollback) => Severity::Rollback,
                _ => severity,
            });
        }
        gates.push(result);
    };

    record(gate_contractivity(inputs), &mut gates, &mut worst);
    record(gate_calibration(inputs), &mut gates, &mut worst);
    record(gate_bias(inputs), &mut gates, &mut worst);
    record(gate_lyapunov(inputs), &mut gates, &mut worst);
    record(gate_sr_minimum(inputs), &mut gates, &mut worst);
    record(gate_delta_l_inf_growth(inputs), &mut gates, &mut worst);
    record(gate_caos_floor(inputs), &mut gates, &mut worst);
    record(gate_cost_budget(inputs), &mut gates, &mut worst);
    record(gate_consent(inputs), &mut gates, &mut worst);
    record(gate_eco(inputs), &mut gates, &mut worst);
    record(gate_ethics(inputs), &mut gates, &mut worst);
    if let Some(pair) = gate_agape(inputs) {
        record(pair, &mut gates, &mut worst);
    }

    for g in &gates {
        if g.is_fail() {
            tracing::debug!(gate = %g.name, measured = g.measured_value, threshold = g.threshold, "gate failed");
        } else {
            tracing::debug!(gate = %g.name, "gate passed");
        }
    }

    let verdict = match worst {
        None => Verdict::promote(gates),
        Some(Severity::Reject) => Verdict::reject(gates, "one or more Reject-severity gates failed"),
        Some(Severity::Rollback) => Verdict::rollback(gates, "one or more Rollback-severity gates failed"),
    };

    match verdict.action {
        sentinel_types::Action::Rollback => {
            tracing::warn!(reason = %verdict.reason, "cycle verdict: rollback")
        }
        sentinel_types::Action::Reject => {
            tracing::warn!(reason = %verdict.reason, "cycle verdict: reject")
        }
        sentinel_types::Action::Promote => tracing::info!("cycle verdict: promote"),
        sentinel_types::Action::Canary => tracing::info!("cycle verdict: canary"),
    }

    debug_assert!(verdict.is_internally_consistent());
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::{CalibrationCurve, Cost, MetricSet};

    fn clean_evidence() -> Evidence {
        Evidence {
            challenger_id: "c1".into(),
            metrics: MetricSet::new(),
            cost: Cost::new(),
            robustness: 0.9,
            calibration: CalibrationCurve(vec![(0.8, 0.8, 1.0)]),
            bias_ratio: 1.0,
            pii_detected: false,
            consent: true,
            eco_energy_joules: 10.0,
            eco_carbon_grams: 5.0,
            misinformation_score: 0.0,
            epistemic_uncertainty: 0.1,
            ethics: Default::default(),
        }
    }

    #[test]
    fn all_gates_passing_promotes() {
        let policy = Policy::default_for_dims(2);
        let before = State::genesis(vec![1.0, 1.0], 0);
        let candidate = State {
            params: vec![0.5, 0.5],
            ..before.clone()
        };
        let evidence = clean_evidence();
        let inputs = CycleInputs {
            state_before: &before,
            state_candidate: Some(&candidate),
            policy: &policy,
            evidence: &evidence,
            rho: 0.5,
            caos_plus: 2.0,
            sr: 0.9,
            delta_l_inf: 0.05,
            cost_increase: 0.1,
        };
        let verdict = run(&inputs);
        assert_eq!(verdict.action, sentinel_types::Action::Promote);
        assert!(verdict.gates.iter().all(|g| !g.is_fail()));
    }

    #[test]
    fn missing_consent_forces_rollback_even_with_every_other_gate_passing() {
        let policy = Policy::default_for_dims(2);
        let before = State::genesis(vec![1.0, 1.0], 0);
        let candidate = State {
            params: vec![0.5, 0.5],
            ..before.clone()
        };
        let mut evidence = clean_evidence();
        evidence.consent = false;
        let inputs = CycleInputs {
            state_before: &before,
            state_candidate: Some(&candidate),
            policy: &policy,
            evidence: &evidence,
            rho: 0.5,
            caos_plus: 2.0,
            sr: 0.9,
            delta_l_inf: 0.05,
            cost_increase: 0.1,
        };
        let verdict = run(&inputs);
        assert_eq!(verdict.action, sentinel_types::Action::Rollback);
        let consent_gate = verdict.gates.iter().find(|g| g.name == "consent").unwrap();
        assert!(consent_gate.is_fail());
        let ethics_gate = verdict.gates.iter().find(|g| g.name == "ethics").unwrap();
        assert!(ethics_gate.is_fail(), "LO-07 should also fail on missing consent");
    }

    #[test]
    fn rollback_severity_wins_over_reject_severity_when_both_fail() {
        let policy = Policy::default_for_dims(2);
        let before = State::genesis(vec![1.0, 1.0], 0);
        let candidate = State {
            params: vec![0.5, 0.5],
            ..before.clone()
        };
        let mut evidence = clean_evidence();
        evidence.consent = false; // Rollback-severity failure
        let inputs = CycleInputs {
            state_before: &before,
            state_candidate: Some(&candidate),
            policy: &policy,
            evidence: &evidence,
            rho: 0.5,
            caos_plus: 2.0,
            sr: 0.1, // Reject-severity failure too
            delta_l_inf: 0.05,
            cost_increase: 0.1,
        };
        let verdict = run(&inputs);
        assert_eq!(verdict.action, sentinel_types::Action::Rollback);
    }

    #[test]
    fn lyapunov_regression_rolls_back_even_when_every_score_gate_passes() {
        let policy = Policy::default_for_dims(2);
        let before = State::genesis(vec![0.1, 0.1], 0);
        // Candidate moves *away* from the Lyapunov target (default origin).
        let candidate = State {
            params: vec![5.0, 5.0],
            ..before.clone()
        };
        let evidence = clean_evidence();
        let inputs = CycleInputs {
            state_before: &before,
            state_candidate: Some(&candidate),
            policy: &policy,
            evidence: &evidence,
            rho: 0.5,
            caos_plus: 2.0,
            sr: 0.9,
            delta_l_inf: 0.05,
            cost_increase: 0.1,
        };
        let verdict = run(&inputs);
        assert_eq!(verdict.action, sentinel_types::Action::Rollback);
        let lyapunov_gate = verdict.gates.iter().find(|g| g.name == "lyapunov").unwrap();
        assert!(lyapunov_gate.is_fail());
    }

    #[test]
    fn no_candidate_state_marks_lyapunov_not_applicable_without_forcing_rollback() {
        let policy = Policy::default_for_dims(2);
        let before = State::genesis(vec![1.0, 1.0], 0);
        let evidence = clean_evidence();
        let inputs = CycleInputs {
            state_before: &before,
            state_candidate: None,
            policy: &policy,
            evidence: &evidence,
            rho: 0.5,
            caos_plus: 2.0,
            sr: 0.9,
            delta_l_inf: 0.05,
            cost_increase: 0.1,
        };
        let verdict = run(&inputs);
        assert_eq!(verdict.action, sentinel_types::Action::Promote);
        let lyapunov_gate = verdict.gates.iter().find(|g| g.name == "lyapunov").unwrap();
        assert_eq!(lyapunov_gate.status, sentinel_types::GateStatus::NotApplicable);
    }
}
