use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The mutable object advanced by the Update Engine. Exclusively owned by
/// the Updater; every other component receives a read-only view (spec §3
/// Ownership). Superseded versions are never destroyed — they remain
/// reachable through the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub params: Vec<f64>,
    pub version: u64,
    pub snapshot_hash: String,
    pub last_updated_ms: i64,
}

impl State {
    pub fn genesis(params: Vec<f64>, now_ms: i64) -> Self {
        let mut state = Self {
            params,
            version: 0,
            snapshot_hash: String::new(),
            last_updated_ms: now_ms,
        };
        state.snapshot_hash = state.compute_snapshot_hash();
        state
    }

    pub fn norm(&self) -> f64 {
        self.params.iter().map(|p| p * p).sum::<f64>().sqrt()
    }

    /// Content-addressed hash over the full state, recomputed on every
    /// commit (spec §4.4 step 7).
    pub fn compute_snapshot_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        for p in &self.params {
            hasher.update(p.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Produce the next version with new parameters, stamping a fresh
    /// snapshot hash. Does not check `H∩S` bounds — the caller (Updater) is
    /// responsible for projecting first.
    pub fn with_params(&self, params: Vec<f64>, now_ms: i64) -> Self {
        let mut next = Self {
            params,
            version: self.version + 1,
            snapshot_hash: String::new(),
            last_updated_ms: now_ms,
        };
        next.snapshot_hash = next.compute_snapshot_hash();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_hash_changes_with_params() {
        let a = State::genesis(vec![0.5, 0.5], 0);
        let b = a.with_params(vec![0.6, 0.5], 1);
        assert_ne!(a.snapshot_hash, b.snapshot_hash);
        assert_eq!(b.version, a.version + 1);
    }

    #[test]
    fn norm_is_euclidean() {
        let s = State::genesis(vec![3.0, 4.0], 0);
        assert!((s.norm() - 5.0).abs() < 1e-12);
    }
}
