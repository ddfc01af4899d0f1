use sentinel_types::{CAOSState, CaosComponents, CaosForm};

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Raw, pre-smoothing observations for one cycle feeding the four CAOS+
/// components (spec §4.2).
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyInputs {
    pub pass_rate_at_k: f64,
    pub calibration_margin: f64,
    pub external_validation: f64,
}

impl ConsistencyInputs {
    /// Weighted mean of the three sub-signals, equally weighted by default.
    pub fn combine(&self) -> f64 {
        clamp01((self.pass_rate_at_k + self.calibration_margin + self.external_validation) / 3.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AutoevolutionInputs {
    pub delta_l_inf: f64,
    pub cost_norm: f64,
}

impl AutoevolutionInputs {
    const EPSILON: f64 = 1e-6;

    /// `ΔL∞⁺ / (cost_norm + ε)`, non-negative part only.
    pub fn combine(&self) -> f64 {
        clamp01(self.delta_l_inf.max(0.0) / (self.cost_norm.max(0.0) + Self::EPSILON))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IncognoscibleInputs {
    pub ensemble_disagreement: f64,
    pub ood_energy: f64,
}

impl IncognoscibleInputs {
    pub fn combine(&self) -> f64 {
        clamp01((self.ensemble_disagreement + self.ood_energy) / 2.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SilenceInputs {
    pub noise: f64,
    pub redundancy: f64,
    pub entropy: f64,
}

impl SilenceInputs {
    /// Weighted anti-sum with recommended weights 2:1:1 — high noise,
    /// redundancy, or entropy all pull silence down.
    pub fn combine(&self) -> f64 {
        let weighted = (2.0 * self.noise + self.redundancy + self.entropy) / 4.0;
        clamp01(1.0 - weighted)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaosRaw {
    pub consistency: f64,
    pub autoevolution: f64,
    pub incognoscible: f64,
    pub silence: f64,
}

/// `γ` scale used by the `φ_CAOS` compatibility view (spec §4.2).
pub const DEFAULT_GAMMA: f64 = 1.0;

/// Cap applied to `CAOS⁺` purely for numerical safety (spec §4.2
/// invariants: "CAOS⁺ capped for numerical safety").
pub const CAOS_PLUS_CAP: f64 = 1.0e6;

/// Pure recomputation of both CAOS+ forms from already-smoothed component
/// values, with no EMA state involved. This is what a PCAg verifier calls:
/// the smoothed `(c, a, o, s)` are already recorded in the PCAg, so replay
/// only needs to redo the deterministic exponential/tanh algebra, never the
/// EMA history that produced them.
pub fn caos_plus_from_components(c: f64, a: f64, o: f64, s: f64, kappa: f64, gamma: f64) -> (f64, f64) {
    let kappa = kappa.max(0.0);
    let base = 1.0 + kappa * c * a;
    let exponent = o * s;
    let caos_plus = base.powf(exponent).min(CAOS_PLUS_CAP);

    // tanh(gamma * log(1 + CAOS+ - 1)); the "+1-1" is kept to mirror the
    // spec's literal form rather than silently simplifying it to log(CAOS+).
    let phi_caos = (gamma * (1.0 + caos_plus - 1.0).ln()).tanh();
    (caos_plus, phi_caos)
}

/// Push one cycle's raw component observations through the Motor's EMA and
/// compute both CAOS+ forms. The exponential form is canonical; `φ_CAOS` is
/// a derived display-only view (spec §9 Open Question 1).
pub fn compute_caos(state: &mut CAOSState, raw: CaosRaw, kappa: f64, gamma: f64) -> CaosComponents {
    let c = clamp01(state.consistency.push(clamp01(raw.consistency)));
    let a = clamp01(state.autoevolution.push(clamp01(raw.autoevolution)));
    let o = clamp01(state.incognoscible.push(clamp01(raw.incognoscible)));
    let s = clamp01(state.silence.push(clamp01(raw.silence)));

    let (caos_plus, phi_caos) = caos_plus_from_components(c, a, o, s, kappa, gamma);

    CaosComponents {
        consistency: c,
        autoevolution: a,
        incognoscible: o,
        silence: s,
        caos_plus,
        phi_caos,
        canonical_form: CaosForm::Exponential,
    }
}

/// Saturating map used by the Updater to scale α₀ (spec §4.4 step 3):
/// `φ(CAOS⁺) = tanh(γ · log(CAOS⁺))`, i.e. `φ_CAOS`, clamped to `[0,1)`.
pub fn phi(caos_plus: f64, gamma: f64) -> f64 {
    clamp01((gamma * caos_plus.max(1.0).ln()).tanh())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kappa_zero_reduces_caos_plus_to_one() {
        let mut state = CAOSState::new(5);
        let raw = CaosRaw {
            consistency: 0.9,
            autoevolution: 0.9,
            incognoscible: 0.9,
            silence: 0.9,
        };
        let out = compute_caos(&mut state, raw, 0.0, DEFAULT_GAMMA);
        assert!((out.caos_plus - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_exponent_reduces_caos_plus_to_one() {
        let mut state = CAOSState::new(5);
        let raw = CaosRaw {
            consistency: 0.9,
            autoevolution: 0.9,
            incognoscible: 0.0,
            silence: 0.0,
        };
        let out = compute_caos(&mut state, raw, 20.0, DEFAULT_GAMMA);
        assert!((out.caos_plus - 1.0).abs() < 1e-9);
    }

    #[test]
    fn caos_plus_is_monotone_non_decreasing_in_each_component() {
        let mut lo_state = CAOSState::new(5);
        let mut hi_state = CAOSState::new(5);
        let lo = compute_caos(
            &mut lo_state,
            CaosRaw {
                consistency: 0.3,
                autoevolution: 0.3,
                incognoscible: 0.3,
                silence: 0.3,
            },
            20.0,
            DEFAULT_GAMMA,
        );
        let hi = compute_caos(
            &mut hi_state,
            CaosRaw {
                consistency: 0.6,
                autoevolution: 0.6,
                incognoscible: 0.6,
                silence: 0.6,
            },
            20.0,
            DEFAULT_GAMMA,
        );
        assert!(hi.caos_plus >= lo.caos_plus);
    }
}
