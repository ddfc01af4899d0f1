use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    Pass,
    Fail,
    NotApplicable,
}

/// The result of one Guard-pipeline gate. Every gate produces one of these,
/// even after an earlier gate has already failed — the pipeline never
/// short-circuits in a way that would hide a lower-severity failure from the
/// audit log (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub name: String,
    pub status: GateStatus,
    pub measured_value: f64,
    pub threshold: f64,
    pub rationale: String,
}

impl GateResult {
    pub fn pass(name: impl Into<String>, measured_value: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            status: GateStatus::Pass,
            measured_value,
            threshold,
            rationale: "within bounds".to_string(),
        }
    }

    pub fn fail(
        name: impl Into<String>,
        measured_value: f64,
        threshold: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: GateStatus::Fail,
            measured_value,
            threshold,
            rationale: rationale.into(),
        }
    }

    pub fn not_applicable(name: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: GateStatus::NotApplicable,
            measured_value: f64::NAN,
            threshold: f64::NAN,
            rationale: rationale.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.status == GateStatus::Fail
    }
}
