//! WORM ledger and Proof-Carrying Artifact (PCAg) generator/verifier
//! (spec §4.6). Grounded on `church_of_fear_ledger::ledger::MoralLedger`.

pub mod canonical;
pub mod ledger;
pub mod pcag;

pub use canonical::{canonical_bytes, chain_hash, hash_bytes, CANONICAL_PRECISION};
pub use ledger::Ledger;
pub use pcag::verify as pcag_verify;
