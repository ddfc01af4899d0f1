//! The Update Engine (spec §4.4): projected, gate-gated, step-modulated
//! state advance. Never mutates `State` before every gate has passed —
//! there is no tentative commit visible to other components.

use sentinel_motor::phi;
use sentinel_types::{Action, Policy, State, Verdict};

/// Outcome of one call to [`update`]. Mirrors spec §4.4 step 1/7's result
/// shape (`{action, state_changed, ...}`).
#[derive(Debug, Clone)]
pub struct UpdateRecord {
    pub action: Action,
    pub state_changed: bool,
    pub alpha_eff: Option<f64>,
    /// Set when projection moved the candidate by more than `delta_proj`
    /// (spec §4.4 step 5).
    pub heavy_projection: bool,
}

impl UpdateRecord {
    fn no_op(action: Action) -> Self {
        Self {
            action,
            state_changed: false,
            alpha_eff: None,
            heavy_projection: false,
        }
    }
}

/// Clip each coordinate into the declared box, then renormalize if the
/// resulting vector's norm exceeds `max_norm` (spec §4.4 step 5's
/// `H ∩ S` projection). The box half-width is `max_norm` itself — the
/// crate carries no per-coordinate bounds beyond the global norm cap, so a
/// component-wise clip to `[-max_norm, max_norm]` is the tightest box that
/// never falls afoul of `H` before the `S` (norm) cut is applied.
fn project(params: &[f64], max_norm: f64) -> Vec<f64> {
    let clipped: Vec<f64> = params.iter().map(|p| p.clamp(-max_norm, max_norm)).collect();
    let norm = clipped.iter().map(|p| p * p).sum::<f64>().sqrt();
    if norm > max_norm && norm > 0.0 {
        let scale = max_norm / norm;
        clipped.into_iter().map(|p| p * scale).collect()
    } else {
        clipped
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn lyapunov_v(params: &[f64], target: &[f64]) -> f64 {
    params
        .iter()
        .zip(target.iter().chain(std::iter::repeat(&0.0)))
        .map(|(p, t)| (p - t) * (p - t))
        .sum()
}

fn alpha_eff(policy: &Policy, caos_plus: f64, sr: f64) -> f64 {
    (policy.alpha_0 * phi(caos_plus, sentinel_motor::DEFAULT_GAMMA) * sr)
        .clamp(policy.alpha_min, policy.alpha_max)
}

fn candidate_params(state: &State, gradient: &[f64], policy: &Policy, caos_plus: f64, sr: f64) -> (Vec<f64>, f64) {
    let alpha_eff = alpha_eff(policy, caos_plus, sr);
    let unprojected: Vec<f64> = state
        .params
        .iter()
        .zip(gradient.iter())
        .map(|(p, g)| p + alpha_eff * g)
        .collect();
    (project(&unprojected, policy.max_norm), alpha_eff)
}

/// Produce the provisional post-projection `State` the Guard checks its
/// Lyapunov/contractivity gates against (spec §4.3 gates 1 & 4), before a
/// `Verdict` exists. Uses the exact same `alpha_eff`/projection math as
/// [`update`]'s commit path, so a `Promote` verdict's own re-check in step 6
/// only ever disagrees with this preview if `rho` itself changes between the
/// two calls — it never does within one cycle.
pub fn preview(state: &State, gradient: &[f64], policy: &Policy, caos_plus: f64, sr: f64, now_ms: i64) -> State {
    let (projected, _alpha_eff) = candidate_params(state, gradient, policy, caos_plus, sr);
    state.with_params(projected, now_ms)
}

/// Run the Update Engine for one cycle.
///
/// `gradient` is the opaque direction `G` supplied by the Mutator/Evaluator
/// layer (spec §4.4 step 2) — same dimension as `state.params`. `rho` is
/// passed through only for the Rollback-severity re-check in step 6; the
/// Updater does not recompute it (projection does not change the
/// challenger's measured sensitivity).
pub fn update(
    state: &State,
    gradient: &[f64],
    policy: &Policy,
    verdict: &Verdict,
    caos_plus: f64,
    sr: f64,
    rho: f64,
    now_ms: i64,
) -> (State, UpdateRecord) {
    if verdict.action != Action::Promote {
        return (state.clone(), UpdateRecord::no_op(verdict.action));
    }

    let (projected, alpha_eff) = candidate_params(state, gradient, policy, caos_plus, sr);
    let unprojected: Vec<f64> = state
        .params
        .iter()
        .zip(gradient.iter())
        .map(|(p, g)| p + alpha_eff * g)
        .collect();
    let heavy_projection = euclidean_distance(&unprojected, &projected) > policy.delta_proj;

    let v_before = lyapunov_v(&state.params, &policy.lyapunov_target);
    let v_after = lyapunov_v(&projected, &policy.lyapunov_target);

    if v_after >= v_before || rho >= policy.rho_max {
        tracing::warn!(
            v_before,
            v_after,
            rho,
            rho_max = policy.rho_max,
            "post-projection re-check failed, rolling back the update"
        );
        return (
            state.clone(),
            UpdateRecord {
                action: Action::Rollback,
                state_changed: false,
                alpha_eff: Some(alpha_eff),
                heavy_projection,
            },
        );
    }

    let committed = state.with_params(projected, now_ms);
    tracing::info!(
        version = committed.version,
        alpha_eff,
        heavy_projection,
        "state committed"
    );
    (
        committed,
        UpdateRecord {
            action: Action::Promote,
            state_changed: true,
            alpha_eff: Some(alpha_eff),
            heavy_projection,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::GateResult;

    fn promote_verdict() -> Verdict {
        Verdict::promote(vec![GateResult::pass("rho", 0.5, 1.0)])
    }

    #[test]
    fn non_promote_verdict_leaves_state_untouched() {
        let policy = Policy::default_for_dims(2);
        let state = State::genesis(vec![0.5, 0.5], 0);
        let verdict = Verdict::reject(vec![GateResult::fail("sr_minimum", 0.1, 0.8, "low sr")], "low sr");
        let (next, record) = update(&state, &[1.0, 1.0], &policy, &verdict, 2.0, 0.9, 0.5, 1);
        assert_eq!(next, state);
        assert!(!record.state_changed);
        assert_eq!(record.action, Action::Reject);
    }

    #[test]
    fn promotion_commits_and_bumps_version() {
        let policy = Policy::default_for_dims(2);
        let state = State::genesis(vec![0.1, 0.1], 0);
        let verdict = promote_verdict();
        let (next, record) = update(&state, &[1.0, 1.0], &policy, &verdict, 2.0, 0.9, 0.5, 1);
        assert!(record.state_changed);
        assert_eq!(record.action, Action::Promote);
        assert_eq!(next.version, state.version + 1);
        assert!(next.norm() <= policy.max_norm + 1e-9);
    }

    #[test]
    fn projection_clips_to_max_norm() {
        let policy = Policy::default_for_dims(2);
        let state = State::genesis(vec![0.0, 0.0], 0);
        let verdict = promote_verdict();
        // A huge gradient with a generous alpha should still respect max_norm.
        let mut aggressive_policy = policy.clone();
        aggressive_policy.alpha_0 = aggressive_policy.alpha_max;
        let (next, _) = update(&state, &[1000.0, 1000.0], &aggressive_policy, &verdict, 1e6, 1.0, 0.1, 1);
        assert!(next.norm() <= aggressive_policy.max_norm + 1e-9);
    }

    #[test]
    fn lyapunov_regression_after_projection_rolls_back() {
        let mut policy = Policy::default_for_dims(2);
        policy.lyapunov_target = vec![0.0, 0.0];
        policy.alpha_0 = policy.alpha_max;
        let state = State::genesis(vec![0.05, 0.05], 0);
        let verdict = promote_verdict();
        // Gradient pushes directly away from the Lyapunov target.
        let (next, record) = update(&state, &[10.0, 10.0], &policy, &verdict, 1e6, 1.0, 0.1, 1);
        assert_eq!(record.action, Action::Rollback);
        assert!(!record.state_changed);
        assert_eq!(next, state);
    }

    #[test]
    fn rho_at_or_above_ceiling_after_projection_rolls_back() {
        let policy = Policy::default_for_dims(2);
        let state = State::genesis(vec![0.1, 0.1], 0);
        let verdict = promote_verdict();
        let (next, record) = update(&state, &[0.0, 0.0], &policy, &verdict, 2.0, 0.9, policy.rho_max, 1);
        assert_eq!(record.action, Action::Rollback);
        assert_eq!(next, state);
    }
}
