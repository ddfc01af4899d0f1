use serde::{Deserialize, Serialize};

use crate::cost::Cost;
use crate::metric::MetricSet;

/// Bucketed calibration curve: `(predicted_confidence, observed_accuracy,
/// bucket_weight)` triples, used to derive ECE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationCurve(pub Vec<(f64, f64, f64)>);

impl CalibrationCurve {
    /// Expected Calibration Error: the weighted mean absolute gap between
    /// predicted confidence and observed accuracy across buckets.
    pub fn ece(&self) -> f64 {
        let total_weight: f64 = self.0.iter().map(|(_, _, w)| w).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        self.0
            .iter()
            .map(|(conf, acc, w)| w * (conf - acc).abs())
            .sum::<f64>()
            / total_weight
    }
}

/// Evidence specific to the fourteen LO-xx ethics predicates that has no
/// natural home among the scoring fields below. Grounded on the teacher's
/// `EvidenceBundle` concept referenced from `policyengine::reversalconditions`
/// ("10-tag ALN evidence object").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EthicsEvidenceBundle {
    pub anthropomorphism_claim: bool,
    pub occult_claim: bool,
    pub physical_harm_risk: f64,
    pub security_vulnerability_detected: bool,
    pub autonomy_override_detected: bool,
    pub equity_violation_detected: bool,
    pub auditability_complete: bool,
    pub explainability_score: f64,
}

/// Per-challenger observation bundle produced by the Evaluator. Immutable
/// once produced; consumed once by the Aggregator and the Guard. Only its
/// hash survives in the PCAg after the cycle (spec §3 Ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub challenger_id: String,
    pub metrics: MetricSet,
    pub cost: Cost,
    pub robustness: f64,
    pub calibration: CalibrationCurve,
    /// Ratio of outcome rates between protected and unprotected groups.
    pub bias_ratio: f64,
    pub pii_detected: bool,
    pub consent: bool,
    pub eco_energy_joules: f64,
    pub eco_carbon_grams: f64,
    pub misinformation_score: f64,
    /// Ensemble disagreement / OOD energy, normalized to `[0,1]`; feeds the
    /// Motor's Incognoscible (O) component.
    pub epistemic_uncertainty: f64,
    pub ethics: EthicsEvidenceBundle,
}
