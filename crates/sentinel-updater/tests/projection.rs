use proptest::prelude::*;
use sentinel_types::{Action, GateResult, Policy, State, Verdict};
use sentinel_updater::update;

fn promote_verdict() -> Verdict {
    Verdict::promote(vec![GateResult::pass("rho", 0.5, 1.0)])
}

proptest! {
    #[test]
    fn committed_state_never_exceeds_max_norm(
        gx in -1.0e4f64..1.0e4,
        gy in -1.0e4f64..1.0e4,
        caos_plus in 1.0f64..1.0e6,
        sr in 0.0f64..1.0,
    ) {
        let mut policy = Policy::default_for_dims(2);
        policy.lyapunov_target = vec![0.0, 0.0];
        let state = State::genesis(vec![0.0, 0.0], 0);
        let verdict = promote_verdict();
        let (next, record) = update(&state, &[gx, gy], &policy, &verdict, caos_plus, sr, 0.1, 1);
        if record.action == Action::Promote {
            prop_assert!(next.norm() <= policy.max_norm + 1e-6);
        }
    }

    #[test]
    fn alpha_eff_is_always_within_its_declared_bounds(
        caos_plus in 1.0f64..1.0e6,
        sr in 0.0f64..1.0,
    ) {
        let policy = Policy::default_for_dims(2);
        let state = State::genesis(vec![0.0, 0.0], 0);
        let verdict = promote_verdict();
        let (_, record) = update(&state, &[1.0, 1.0], &policy, &verdict, caos_plus, sr, 0.1, 1);
        if let Some(alpha_eff) = record.alpha_eff {
            prop_assert!(alpha_eff >= policy.alpha_min - 1e-12);
            prop_assert!(alpha_eff <= policy.alpha_max + 1e-12);
        }
    }
}
