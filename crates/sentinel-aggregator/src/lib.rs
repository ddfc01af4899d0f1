//! L∞ meta-score aggregation (spec §4.1).
//!
//! The meta-score is a weighted harmonic mean over bounded metrics,
//! multiplied by a cost-decay factor and a 0/1 ethics indicator. The
//! harmonic mean makes the score non-compensatory: a single near-zero
//! metric collapses the whole score toward zero regardless of how strong
//! the other metrics are, by design, to prevent Goodhart substitution.

use std::cmp::Ordering;

use sentinel_types::{Cost, EvidenceError, MetricSet, Policy};

/// Full detail record behind one `L∞` computation, kept around for the
/// PCAg and for tie-breaking.
#[derive(Debug, Clone)]
pub struct LInfDetail {
    pub base: f64,
    pub cost_total: f64,
    pub cost_penalty: f64,
    pub ethics_indicator: f64,
    pub l_inf: f64,
    /// Names of metrics that were below their ε-floor and got clamped.
    pub clamped_metrics: Vec<String>,
}

/// Compute `L∞` from `(metrics, cost, ethics_ok, policy)` (spec §4.1).
///
/// Any `m_j < ε` is clamped to `ε` and flagged in `clamped_metrics`. An
/// empty metric set, a negative cost component, or a NaN anywhere is a
/// fail-closed `EvidenceError` — never silently substituted.
pub fn compute_l_inf(
    metrics: &MetricSet,
    cost: &Cost,
    ethics_ok: bool,
    policy: &Policy,
) -> Result<LInfDetail, EvidenceError> {
    metrics.validate()?;
    cost.validate()?;

    let mut sum_q = 0.0;
    let mut clamped_metrics = Vec::new();
    for m in metrics.iter() {
        if m.value < m.epsilon {
            clamped_metrics.push(m.name.clone());
        }
        sum_q += m.weight / m.floored_value().max(m.epsilon);
    }
    let base = 1.0 / sum_q;

    let cost_total = cost.total(&policy.cost_scales);
    let cost_penalty = (-policy.lambda_c * cost_total).exp();
    let ethics_indicator = if ethics_ok { 1.0 } else { 0.0 };

    Ok(LInfDetail {
        base,
        cost_total,
        cost_penalty,
        ethics_indicator,
        l_inf: base * cost_penalty * ethics_indicator,
        clamped_metrics,
    })
}

/// One candidate's identity for tie-breaking (spec §4.1): when two
/// challengers tie on `L∞` to within `1e-9`, lower cost wins; ties again →
/// lower parameter-vector norm; ties again → deterministic hash order.
#[derive(Debug, Clone)]
pub struct TieBreakCandidate {
    pub l_inf: f64,
    pub cost_total: f64,
    pub param_norm: f64,
    pub challenger_hash: String,
}

const TIE_EPSILON: f64 = 1e-9;

/// Returns `Ordering::Less` if `a` should be preferred over `b`.
pub fn compare_candidates(a: &TieBreakCandidate, b: &TieBreakCandidate) -> Ordering {
    if (a.l_inf - b.l_inf).abs() > TIE_EPSILON {
        // Higher L∞ wins, so reverse the natural f64 ordering.
        return b
            .l_inf
            .partial_cmp(&a.l_inf)
            .unwrap_or(Ordering::Equal);
    }
    if (a.cost_total - b.cost_total).abs() > TIE_EPSILON {
        return a
            .cost_total
            .partial_cmp(&b.cost_total)
            .unwrap_or(Ordering::Equal);
    }
    if (a.param_norm - b.param_norm).abs() > TIE_EPSILON {
        return a
            .param_norm
            .partial_cmp(&b.param_norm)
            .unwrap_or(Ordering::Equal);
    }
    a.challenger_hash.cmp(&b.challenger_hash)
}

/// Picks the preferred candidate out of a non-empty slice.
pub fn pick_winner(candidates: &[TieBreakCandidate]) -> Option<&TieBreakCandidate> {
    candidates
        .iter()
        .min_by(|a, b| compare_candidates(a, b))
}
