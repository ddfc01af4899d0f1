use serde::{Deserialize, Serialize};

use crate::pcag::Pcag;

/// Genesis `previous_hash`: 32 zero bytes, hex-encoded (`0^n`, spec §3).
pub fn genesis_hash() -> String {
    "0".repeat(64)
}

/// One append-only, hash-chained ledger record (spec §3, §4.6). `payload` is
/// the full PCAg for the cycle. `sequence` is strictly increasing;
/// `payload_hash = H(canonical(payload))`; `previous_hash` equals the prior
/// entry's hash chain value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub timestamp_ms: i64,
    pub previous_hash: String,
    pub payload_hash: String,
    pub payload: Pcag,
    pub signature: Option<String>,
}
