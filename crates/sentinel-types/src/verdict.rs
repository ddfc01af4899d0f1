use serde::{Deserialize, Serialize};

use crate::gate::GateResult;

/// Distinguishes discarding a challenger from unwinding a tentative state
/// change (spec §4.3): Reject preserves state, Rollback additionally
/// reverts any tentative update and records a higher-severity incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Promote,
    Canary,
    Reject,
    Rollback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub all_passed: bool,
    pub gates: Vec<GateResult>,
    pub action: Action,
    pub reason: String,
}

impl Verdict {
    pub fn promote(gates: Vec<GateResult>) -> Self {
        debug_assert!(gates.iter().all(|g| !g.is_fail()));
        Self {
            all_passed: true,
            gates,
            action: Action::Promote,
            reason: "all gates passed".to_string(),
        }
    }

    pub fn reject(gates: Vec<GateResult>, reason: impl Into<String>) -> Self {
        Self {
            all_passed: false,
            gates,
            action: Action::Reject,
            reason: reason.into(),
        }
    }

    pub fn rollback(gates: Vec<GateResult>, reason: impl Into<String>) -> Self {
        Self {
            all_passed: false,
            gates,
            action: Action::Rollback,
            reason: reason.into(),
        }
    }

    /// Fail-closed conjunctivity (spec §8): for every non-Promote verdict at
    /// least one gate failed, and a Promote verdict has no failed gate.
    pub fn is_internally_consistent(&self) -> bool {
        let any_fail = self.gates.iter().any(|g| g.is_fail());
        match self.action {
            Action::Promote => !any_fail,
            Action::Reject | Action::Rollback => any_fail,
            Action::Canary => true,
        }
    }
}
