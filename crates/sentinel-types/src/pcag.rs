use serde::{Deserialize, Serialize};

use crate::cost::Cost;
use crate::ethics::EthicsVerdict;
use crate::gate::GateResult;
use crate::metric::MetricSet;
use crate::verdict::Verdict;

/// Which of the two CAOS+ forms (spec §4.2, §9 Open Question 1) was used as
/// the canonical computation feeding α_eff. The exponential form is always
/// canonical; `φ_CAOS` is retained only as a derived display view, but the
/// PCAg still records which one a reader should treat as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaosForm {
    Exponential,
    PhiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaosComponents {
    pub consistency: f64,
    pub autoevolution: f64,
    pub incognoscible: f64,
    pub silence: f64,
    pub caos_plus: f64,
    pub phi_caos: f64,
    pub canonical_form: CaosForm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrComponents {
    pub awareness: f64,
    pub ethics_ok: f64,
    pub autocorrection: f64,
    pub metacognition: f64,
    pub sr: f64,
}

/// Self-contained decision record for one cycle (spec §4.6). A verifier
/// holding only the PCAg and the referenced Policy must be able to
/// recompute `L∞`, `CAOS+`, `SR`, and re-run every gate, and obtain the same
/// Verdict — see `sentinel_cycle::pcag_verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pcag {
    pub cycle_id: String,
    pub champion_hash: String,
    pub challenger_hash: String,

    pub metrics: MetricSet,
    pub cost: Cost,
    pub ethics_evidence: Vec<EthicsVerdict>,

    pub caos: CaosComponents,
    pub sr: SrComponents,

    pub alpha_eff: f64,

    pub l_inf_champion: f64,
    pub l_inf_challenger: f64,
    pub delta_l_inf: f64,

    pub gates: Vec<GateResult>,
    pub verdict: Verdict,

    pub evidence_merkle_root: String,
    pub policy_snapshot_hash: String,
}
