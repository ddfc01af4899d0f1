use sentinel_types::{SRState, SrComponents, DEFAULT_EPSILON};

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Raw, pre-smoothing observations for the four SR-Ω∞ reflexive axes (spec
/// §4.2): awareness (calibration quality), ethics_ok (0/1 veto),
/// autocorrection (risk-reduction rate), metacognition (ΔL∞ / ΔCost).
#[derive(Debug, Clone, Copy)]
pub struct SrRaw {
    pub awareness: f64,
    pub ethics_ok: f64,
    pub autocorrection: f64,
    pub metacognition: f64,
}

/// Pure recomputation of the harmonic-mean SR-Ω∞ value from already-smoothed
/// axis values, with no EMA state involved (used by the PCAg verifier).
pub fn sr_from_axes(awareness: f64, ethics_ok: f64, autocorrection: f64, metacognition: f64) -> f64 {
    let axes = [awareness, ethics_ok, autocorrection, metacognition];
    let sum_inv: f64 = axes.iter().map(|a| 1.0 / a.max(DEFAULT_EPSILON)).sum();
    4.0 / sum_inv
}

/// Push one cycle's raw axis observations through the Motor's EMA and
/// compute the harmonic-mean SR-Ω∞ value: `SR = 4 / Σ(1/max(ε, axis_i))`.
/// Non-compensatory: a single axis at (or near) zero collapses SR toward
/// zero regardless of the other three. `ethics_ok` bypasses the EMA
/// entirely — it is a per-cycle veto, not a trend, so smoothing it would let
/// a history of `ethics_ok = 1.0` mask a single `ethics_ok = 0` cycle and
/// violate the spec's "SR = 0 whenever ethics_ok = 0" invariant.
pub fn compute_sr(state: &mut SRState, raw: SrRaw) -> SrComponents {
    let awareness = clamp01(state.awareness.push(clamp01(raw.awareness)));
    let ethics_ok = clamp01(raw.ethics_ok);
    let autocorrection = clamp01(state.autocorrection.push(clamp01(raw.autocorrection)));
    let metacognition = clamp01(state.metacognition.push(clamp01(raw.metacognition)));

    let sr = sr_from_axes(awareness, ethics_ok, autocorrection, metacognition);

    SrComponents {
        awareness,
        ethics_ok,
        autocorrection,
        metacognition,
        sr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sr_harmonic_mean_stays_within_the_axis_range() {
        // The harmonic mean of n positive numbers always lies in
        // [min(axes), max(axes)]; it is never above the max or below the
        // min. (Note: spec §8 describes this informally as "SR ≤
        // min(axes)", which would not hold for a true harmonic mean — see
        // DESIGN.md for the resolution in favor of the literal §4.2
        // formula.)
        let mut state = SRState::new(5);
        let raw = SrRaw {
            awareness: 0.9,
            ethics_ok: 1.0,
            autocorrection: 0.5,
            metacognition: 0.8,
        };
        let out = compute_sr(&mut state, raw);
        let axes = [out.awareness, out.ethics_ok, out.autocorrection, out.metacognition];
        let min_axis = axes.into_iter().fold(f64::INFINITY, f64::min);
        let max_axis = axes.into_iter().fold(f64::NEG_INFINITY, f64::max);
        assert!(out.sr >= min_axis - 1e-9);
        assert!(out.sr <= max_axis + 1e-9);
    }

    #[test]
    fn ethics_veto_collapses_sr_toward_zero() {
        let mut state = SRState::new(5);
        let raw = SrRaw {
            awareness: 0.95,
            ethics_ok: 0.0,
            autocorrection: 0.95,
            metacognition: 0.95,
        };
        let out = compute_sr(&mut state, raw);
        assert!(out.sr < 0.01, "sr={}", out.sr);
    }
}
