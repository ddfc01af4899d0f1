//! Append-only, hash-chained WORM ledger (spec §4.6). Grounded directly on
//! `church_of_fear_ledger::ledger::MoralLedger` — `open_or_create` replays
//! the file to recover `last_hash`, `append` is the only mutation, the
//! genesis value is 32 zero bytes hex-encoded.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use sentinel_types::{genesis_hash, HashAlgorithm, LedgerEntry, LedgerError, Pcag};

use crate::canonical::{canonical_bytes, chain_hash, hash_bytes};

/// Append-only, hash-chained ledger of `LedgerEntry` records, one per
/// line of a JSONL file. Entries are never deleted or rewritten (spec
/// §4.6: "compaction is out of scope").
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    last_hash: String,
    next_sequence: u64,
    hash_algorithm: HashAlgorithm,
}

impl Ledger {
    /// Opens an existing ledger file or creates an empty one, replaying it
    /// to recover `last_hash` and `next_sequence`. Fails closed on the
    /// first inconsistency it finds while replaying.
    pub fn open_or_create(path: impl AsRef<std::path::Path>, hash_algorithm: HashAlgorithm) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut last_hash = genesis_hash();
        let mut next_sequence = 0u64;

        let reader = BufReader::new(File::open(&path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LedgerEntry = serde_json::from_str(&line).map_err(LedgerError::Serialization)?;
            if entry.sequence != next_sequence {
                return Err(LedgerError::SequenceGap {
                    expected: next_sequence,
                    found: entry.sequence,
                });
            }
            if entry.previous_hash != last_hash {
                return Err(LedgerError::ChainBroken {
                    sequence: entry.sequence,
                    expected: last_hash,
                    found: entry.previous_hash,
                });
            }
            last_hash = chain_hash(&entry.previous_hash, &entry.payload_hash, hash_algorithm);
            next_sequence += 1;
        }

        Ok(Self {
            path,
            last_hash,
            next_sequence,
            hash_algorithm,
        })
    }

    /// The only mutation this type exposes. Computes `payload_hash`,
    /// derives the next `entry_hash` from `previous_hash ‖ payload_hash`,
    /// and writes one JSON line.
    pub fn append(&mut self, payload: Pcag, timestamp_ms: i64) -> Result<LedgerEntry, LedgerError> {
        let payload_bytes = canonical_bytes(&payload)?;
        let payload_hash = hash_bytes(&payload_bytes, self.hash_algorithm);

        let entry = LedgerEntry {
            sequence: self.next_sequence,
            timestamp_ms,
            previous_hash: self.last_hash.clone(),
            payload_hash,
            payload,
            signature: None,
        };

        let serialized = serde_json::to_string(&entry).map_err(LedgerError::Serialization)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(LedgerError::Io)?;
        writeln!(file, "{}", serialized).map_err(LedgerError::Io)?;

        self.last_hash = chain_hash(&entry.previous_hash, &entry.payload_hash, self.hash_algorithm);
        self.next_sequence += 1;

        tracing::info!(
            sequence = entry.sequence,
            action = ?entry.payload.verdict.action,
            "ledger entry appended"
        );

        Ok(entry)
    }

    /// Returns the entry at `sequence`, or `LedgerError::NotFound`.
    pub fn get(&self, sequence: u64) -> Result<LedgerEntry, LedgerError> {
        let reader = BufReader::new(File::open(&self.path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LedgerEntry = serde_json::from_str(&line).map_err(LedgerError::Serialization)?;
            if entry.sequence == sequence {
                return Ok(entry);
            }
        }
        Err(LedgerError::NotFound(sequence))
    }

    /// Walks the whole ledger and returns the first inconsistency (sequence
    /// gap, broken hash chain, or a payload whose hash no longer matches
    /// its recorded `payload_hash` — a tamper signature). Returns `Ok(())`
    /// when the chain is fully intact (spec §4.6 `verify_chain`).
    pub fn verify_chain(&self) -> Result<(), LedgerError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut expected_sequence = 0u64;
        let mut expected_prev_hash = genesis_hash();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LedgerEntry = serde_json::from_str(&line).map_err(LedgerError::Serialization)?;

            if entry.sequence != expected_sequence {
                return Err(LedgerError::SequenceGap {
                    expected: expected_sequence,
                    found: entry.sequence,
                });
            }
            if entry.previous_hash != expected_prev_hash {
                return Err(LedgerError::ChainBroken {
                    sequence: entry.sequence,
                    expected: expected_prev_hash,
                    found: entry.previous_hash,
                });
            }

            let recomputed_payload_hash = hash_bytes(&canonical_bytes(&entry.payload)?, self.hash_algorithm);
            if recomputed_payload_hash != entry.payload_hash {
                return Err(LedgerError::PayloadHashMismatch {
                    sequence: entry.sequence,
                });
            }

            expected_prev_hash = chain_hash(&entry.previous_hash, &entry.payload_hash, self.hash_algorithm);
            expected_sequence += 1;
        }

        Ok(())
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::{
        Action, CaosComponents, CaosForm, CycleId, SrComponents, Verdict,
    };
    use sentinel_types::{Cost, MetricSet};

    fn sample_pcag(tag: &str) -> Pcag {
        Pcag {
            cycle_id: CycleId::new().to_string(),
            champion_hash: format!("champion-{tag}"),
            challenger_hash: format!("challenger-{tag}"),
            metrics: MetricSet::new(),
            cost: Cost::new(),
            ethics_evidence: vec![],
            caos: CaosComponents {
                consistency: 0.8,
                autoevolution: 0.4,
                incognoscible: 0.3,
                silence: 0.8,
                caos_plus: 1.8,
                phi_caos: 0.5,
                canonical_form: CaosForm::Exponential,
            },
            sr: SrComponents {
                awareness: 0.9,
                ethics_ok: 1.0,
                autocorrection: 0.8,
                metacognition: 0.7,
                sr: 0.84,
            },
            alpha_eff: 0.01,
            l_inf_champion: 0.7,
            l_inf_challenger: 0.75,
            delta_l_inf: 0.05,
            gates: vec![],
            verdict: Verdict::promote(vec![]),
            evidence_merkle_root: "deadbeef".repeat(8),
            policy_snapshot_hash: "cafebabe".repeat(8),
        }
    }

    #[test]
    fn append_then_verify_chain_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = Ledger::open_or_create(&path, HashAlgorithm::Sha256).unwrap();

        ledger.append(sample_pcag("a"), 1).unwrap();
        ledger.append(sample_pcag("b"), 2).unwrap();
        ledger.append(sample_pcag("c"), 3).unwrap();

        assert_eq!(ledger.next_sequence(), 3);
        assert!(ledger.verify_chain().is_ok());

        let reopened = Ledger::open_or_create(&path, HashAlgorithm::Sha256).unwrap();
        assert_eq!(reopened.next_sequence(), 3);
        assert_eq!(reopened.last_hash(), ledger.last_hash());
    }

    #[test]
    fn get_returns_not_found_for_unknown_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = Ledger::open_or_create(&path, HashAlgorithm::Sha256).unwrap();
        ledger.append(sample_pcag("a"), 1).unwrap();
        assert!(matches!(ledger.get(99), Err(LedgerError::NotFound(99))));
    }

    #[test]
    fn tampering_with_a_payload_byte_is_detected_on_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = Ledger::open_or_create(&path, HashAlgorithm::Sha256).unwrap();
        ledger.append(sample_pcag("a"), 1).unwrap();
        ledger.append(sample_pcag("b"), 2).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = raw.lines().map(str::to_string).collect();
        lines[0] = lines[0].replace("champion-a", "champion-X");
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        let tampered = Ledger::open_or_create(&path, HashAlgorithm::Sha256);
        // Tampering the payload changes the serialized line without
        // updating payload_hash/previous_hash, so either the replay during
        // open_or_create or the explicit verify_chain call must surface it.
        match tampered {
            Err(_) => {}
            Ok(ledger) => assert!(ledger.verify_chain().is_err()),
        }
    }

    #[test]
    fn action_is_recorded_verbatim_through_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let mut ledger = Ledger::open_or_create(&path, HashAlgorithm::Sha256).unwrap();
        let entry = ledger.append(sample_pcag("a"), 1).unwrap();
        assert_eq!(entry.payload.verdict.action, Action::Promote);
        let fetched = ledger.get(0).unwrap();
        assert_eq!(fetched.payload.verdict.action, Action::Promote);
    }
}
