//! End-to-end Guard scenarios mirroring spec §8's S2 and S4.

use sentinel_guard::{run, CycleInputs};
use sentinel_types::{Action, CalibrationCurve, Cost, Evidence, MetricSet, Policy, State};

fn s1_like_evidence() -> Evidence {
    Evidence {
        challenger_id: "s1".into(),
        metrics: MetricSet::new(),
        cost: Cost::new(),
        robustness: 0.76,
        calibration: CalibrationCurve(vec![(0.9, 0.892, 1.0)]),
        bias_ratio: 1.03,
        pii_detected: false,
        consent: true,
        eco_energy_joules: 50.0,
        eco_carbon_grams: 10.0,
        misinformation_score: 0.0,
        epistemic_uncertainty: 0.1,
        ethics: Default::default(),
    }
}

#[test]
fn s2_ethics_veto_via_missing_consent_rolls_back_and_preserves_state() {
    let policy = Policy::default_for_dims(2);
    let before = State::genesis(vec![0.5, 0.5], 0);
    let candidate = before.with_params(vec![0.55, 0.52], 1);

    let mut evidence = s1_like_evidence();
    evidence.consent = false;

    let inputs = CycleInputs {
        state_before: &before,
        state_candidate: Some(&candidate),
        policy: &policy,
        evidence: &evidence,
        rho: 0.95,
        caos_plus: 1.86,
        sr: 0.848,
        delta_l_inf: 0.056,
        cost_increase: 0.15,
    };

    let verdict = run(&inputs);
    assert_eq!(verdict.action, Action::Rollback);
    assert!(verdict
        .gates
        .iter()
        .any(|g| g.name == "consent" && g.is_fail()));
}

#[test]
fn s4_lyapunov_regression_rolls_back_despite_every_score_gate_passing() {
    let policy = Policy::default_for_dims(2);
    let before = State::genesis(vec![0.2, 0.2], 0);
    // Candidate is farther from the Lyapunov target than the starting state.
    let candidate = before.with_params(vec![3.0, 3.0], 1);

    let evidence = s1_like_evidence();

    let inputs = CycleInputs {
        state_before: &before,
        state_candidate: Some(&candidate),
        policy: &policy,
        evidence: &evidence,
        rho: 0.95,
        caos_plus: 1.86,
        sr: 0.848,
        delta_l_inf: 0.056,
        cost_increase: 0.15,
    };

    let verdict = run(&inputs);
    assert_eq!(verdict.action, Action::Rollback);
    assert!(verdict
        .gates
        .iter()
        .any(|g| g.name == "lyapunov" && g.is_fail()));
}
