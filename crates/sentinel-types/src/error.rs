use thiserror::Error;

use crate::ethics::EthicsLaw;

/// Error taxonomy for the sentinel core. Every error is typed and carries
/// enough context to reproduce; nothing is ever coerced to a numeric code
/// and nothing is swallowed — it either surfaces as a `Verdict` or as one of
/// these variants (see spec §7 propagation policy).
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("evaluator did not return before the cycle deadline")]
    EvaluationTimeout,

    #[error("gate '{gate}' failed: measured {measured}, threshold {threshold}")]
    GateFailure {
        gate: String,
        measured: f64,
        threshold: f64,
    },

    #[error("ethics violation: {law:?} — {evidence}")]
    EthicsViolation { law: EthicsLaw, evidence: String },

    #[error("projection into H∩S produced an out-of-bounds state: {0}")]
    Projection(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Missing, malformed, NaN, or out-of-range metric/cost. Fatal to the cycle;
/// never retried.
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("metric set is empty")]
    EmptyMetricSet,

    #[error("metric '{name}' is NaN")]
    NanMetric { name: String },

    #[error("metric '{name}' out of [0,1]: {value}")]
    MetricOutOfRange { name: String, value: f64 },

    #[error("cost component '{name}' is negative: {value}")]
    NegativeCost { name: String, value: f64 },

    #[error("cost component '{name}' is NaN")]
    NanCost { name: String },

    #[error("weights do not sum to 1.0 (got {sum})")]
    WeightsDoNotSumToOne { sum: f64 },
}

/// Hash mismatch, sequence gap, or append failure. Fatal: the ledger refuses
/// to commit further cycles until repaired.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("hash chain broken at sequence {sequence}: expected prev_hash {expected}, found {found}")]
    ChainBroken {
        sequence: u64,
        expected: String,
        found: String,
    },

    #[error("payload hash mismatch at sequence {sequence}")]
    PayloadHashMismatch { sequence: u64 },

    #[error("append failed: {0}")]
    AppendFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no entry at sequence {0}")]
    NotFound(u64),
}

/// Invalid Policy: weights not summing to 1, negative λ, a frozen threshold
/// loosened. The core refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("metric weights must sum to 1.0, got {sum}")]
    WeightsDoNotSumToOne { sum: f64 },

    #[error("field '{field}' must be non-negative, got {value}")]
    Negative { field: String, value: f64 },

    #[error("frozen threshold '{field}' cannot be loosened: current {current}, proposed {proposed}")]
    FrozenThresholdLoosened {
        field: String,
        current: f64,
        proposed: f64,
    },

    #[error("field '{field}' out of bounds [{min}, {max}]: {value}")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown configuration field: '{0}'")]
    UnknownField(String),

    #[error("io error loading policy: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error loading policy: {0}")]
    Parse(#[from] serde_json::Error),
}
