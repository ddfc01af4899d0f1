use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic-ish, sortable identifier: millisecond timestamp prefix plus
/// random tail. Not a full ULID implementation, just enough to give ledger
/// readers a roughly time-ordered `cycle_id` without a crate dependency the
/// rest of the stack doesn't already pull in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CycleId(u128);

impl CycleId {
    pub fn new() -> Self {
        let ts = Utc::now().timestamp_millis().max(0) as u128;
        let mut tail = [0u8; 10];
        rand::thread_rng().fill_bytes(&mut tail);
        let tail_val = tail.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128);
        Self((ts << 80) | (tail_val & ((1u128 << 80) - 1)))
    }

    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sortable_by_time() {
        let a = CycleId::new();
        let b = CycleId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let id = CycleId::from_raw(42);
        assert_eq!(id.to_string().len(), 32);
    }
}
