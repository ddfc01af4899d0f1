//! Shared data model and error taxonomy for the sentinel evolutionary
//! controller core (spec §3). Every other crate in the workspace depends on
//! this one; it owns no behavior beyond validation of its own invariants.

pub mod caos_state;
pub mod cost;
pub mod error;
pub mod ethics;
pub mod evidence;
pub mod gate;
pub mod ids;
pub mod ledger_entry;
pub mod metric;
pub mod pcag;
pub mod policy;
pub mod state;
pub mod verdict;

pub use caos_state::{CAOSState, Ema, SRState};
pub use cost::Cost;
pub use error::{ConfigError, EvidenceError, LedgerError, SentinelError};
pub use ethics::{ethics_indicator, EthicsLaw, EthicsVerdict};
pub use evidence::{CalibrationCurve, Evidence, EthicsEvidenceBundle};
pub use gate::{GateResult, GateStatus};
pub use ids::CycleId;
pub use ledger_entry::{genesis_hash, LedgerEntry};
pub use metric::{Metric, MetricSet, DEFAULT_EPSILON};
pub use pcag::{CaosComponents, CaosForm, Pcag, SrComponents};
pub use policy::{HashAlgorithm, Policy, AUTOTUNABLE_FIELDS, FROZEN_FIELDS};
pub use state::State;
pub use verdict::{Action, Verdict};
