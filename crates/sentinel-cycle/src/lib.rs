//! Orchestrates one controller cycle end-to-end (spec §2, §6) and owns the
//! `Controller`'s reader-writer discipline over `State`/`Policy`/`CAOSState`/
//! `SRState`/`Ledger` (spec §5). Grounded on `src/main.rs`'s
//! `AppState` (`Arc<RwLock<Ledger>>`) pattern — here a `Controller` plays the
//! same role as a single-writer owner wrapping the core subsystems behind
//! one facade, the way `tsafe-cortex-gate::guardians::GuardianSet` wires
//! several guard/engine collaborators behind one constructor.

use sentinel_aggregator::{compute_l_inf, pick_winner, LInfDetail, TieBreakCandidate};
use sentinel_guard::{evaluate_all, CycleInputs, EthicsContext};
use sentinel_ledger::Ledger;
use sentinel_motor::{compute_caos, compute_sr, AutoevolutionInputs, CaosRaw, ConsistencyInputs, IncognoscibleInputs, SilenceInputs, SrRaw, DEFAULT_GAMMA};
use sentinel_types::{
    ethics_indicator, Action, CAOSState, CaosComponents, CaosForm, CycleId, EthicsVerdict, Evidence, GateResult,
    LedgerError, Pcag, Policy, SRState, SentinelError, SrComponents, State, Verdict,
};

/// Evaluates a challenger and reports the opaque direction `G` the Update
/// Engine should move the champion toward. Mirrors the Mutator/Evaluator
/// scaffolding contract (spec §4.5) via `sentinel_scaffold`'s traits,
/// without depending on that crate directly (it is a dev-only reference
/// implementation, not part of this crate's public contract).
pub trait Mutator {
    fn propose(&self, champion: &State, n: usize, seed: u64) -> Vec<State>;
}

pub trait Evaluator {
    fn evaluate(&self, challenger: &State, seed: u64, deadline_ms: i64) -> Result<Evidence, SentinelError>;
}

struct Candidate {
    state: State,
    evidence: Evidence,
    l_inf_detail: LInfDetail,
    ethics_verdicts: Vec<EthicsVerdict>,
    rho: f64,
}

/// ρ = H(L_ψ(k)) / H(k) is supposed to come from the Evaluator's dedicated
/// sensitivity probe (spec §4.3); this crate's `Evidence` shape carries no
/// such probe output, so the reference wiring here derives ρ from the
/// challenger's reported epistemic uncertainty, clamped into `[0,1]`. See
/// DESIGN.md's wiring-decisions entry.
fn derive_rho(evidence: &Evidence) -> f64 {
    evidence.epistemic_uncertainty.clamp(0.0, 1.0)
}

fn evaluate_candidate(
    state: State,
    evidence: Evidence,
    policy: &Policy,
) -> Result<Candidate, SentinelError> {
    let rho = derive_rho(&evidence);
    let ctx = EthicsContext { rho };
    let ethics_verdicts = evaluate_all(&evidence, policy, &ctx);
    let ethics_ok = ethics_indicator(&ethics_verdicts) > 0.0;
    let l_inf_detail = compute_l_inf(&evidence.metrics, &evidence.cost, ethics_ok, policy)?;
    Ok(Candidate {
        state,
        evidence,
        l_inf_detail,
        ethics_verdicts,
        rho,
    })
}

fn evidence_merkle_root(evidence: &Evidence, policy: &Policy) -> Result<String, LedgerError> {
    let bytes = sentinel_ledger::canonical_bytes(evidence)?;
    Ok(sentinel_ledger::hash_bytes(&bytes, policy.hash_algorithm))
}

/// A degenerate, all-zero CAOS/SR reading recorded when no challenger
/// survives evaluation this cycle. Uses the same pure recomputation
/// functions a PCAg verifier calls, so this artifact still replays cleanly
/// even though the Motor's EMA state was never touched.
fn zeroed_caos_sr(policy: &Policy) -> (CaosComponents, SrComponents) {
    let (caos_plus, phi_caos) = sentinel_motor::caos_plus_from_components(0.0, 0.0, 0.0, 0.0, policy.kappa, DEFAULT_GAMMA);
    let caos = CaosComponents {
        consistency: 0.0,
        autoevolution: 0.0,
        incognoscible: 0.0,
        silence: 0.0,
        caos_plus,
        phi_caos,
        canonical_form: CaosForm::Exponential,
    };
    let sr_value = sentinel_motor::sr_from_axes(0.0, 0.0, 0.0, 0.0);
    let sr = SrComponents {
        awareness: 0.0,
        ethics_ok: 0.0,
        autocorrection: 0.0,
        metacognition: 0.0,
        sr: sr_value,
    };
    (caos, sr)
}

/// Owns one `State`'s mutable cycle-to-cycle context: the champion itself,
/// its `Policy` snapshot, the Motor's smoothed histories, and the ledger —
/// exactly the set of resources spec §5 calls single-writer/single-owner.
/// `Mutator`/`Evaluator` are supplied per call, never owned, matching the
/// spec's literal `cycle(state, policy, mutator, evaluator)` entrypoint
/// shape.
pub struct Controller {
    state: State,
    policy: Policy,
    caos_state: CAOSState,
    sr_state: SRState,
    ledger: Ledger,
    champion_l_inf: f64,
}

impl Controller {
    pub fn new(state: State, policy: Policy, ledger: Ledger, champion_l_inf: f64) -> Self {
        let caos_state = CAOSState::new(policy.caos_half_life);
        let sr_state = SRState::new(policy.sr_half_life);
        Self {
            state,
            policy,
            caos_state,
            sr_state,
            ledger,
            champion_l_inf,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn champion_l_inf(&self) -> f64 {
        self.champion_l_inf
    }

    /// The Auto-Tuner's sole write path (spec §5: "Policy … Auto-Tuner is
    /// the sole writer, between cycles, atomically (swap a new immutable
    /// snapshot)"). Never called from inside [`Controller::cycle`].
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn ledger_verify(&self) -> Result<(), LedgerError> {
        self.ledger.verify_chain()
    }

    /// Run one full cycle: Mutator → Evaluator → Aggregator(L∞) →
    /// Motor(CAOS+, SR) → Guard → Updater → Ledger (spec §2). Only a
    /// `LedgerError` propagates as `Err` — everything upstream of the
    /// ledger append (a rejected challenger, a failed gate, every evaluator
    /// timing out) is instead folded into the returned `Pcag`'s `Verdict`,
    /// matching the entrypoint's "never throws, all failures are encoded in
    /// the PCAg" contract. A ledger append failure is the one condition
    /// spec §7 treats as fatal rather than recordable — there is no
    /// trustworthy ledger left to record it in — so it alone surfaces as
    /// `Err` and the controller's `State` is left untouched.
    pub fn cycle(
        &mut self,
        mutator: &dyn Mutator,
        evaluator: &dyn Evaluator,
        n_challengers: usize,
        seed: u64,
        deadline_ms: i64,
        now_ms: i64,
    ) -> Result<Pcag, LedgerError> {
        let champion = self.state.clone();
        let l_inf_champion_before = self.champion_l_inf;

        let proposals = mutator.propose(&champion, n_challengers.max(1), seed);
        let mut candidates = Vec::with_capacity(proposals.len());
        let mut timeouts = 0usize;
        for challenger in proposals {
            match evaluator.evaluate(&challenger, seed, deadline_ms) {
                Ok(evidence) => match evaluate_candidate(challenger, evidence, &self.policy) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(err) => {
                        tracing::warn!(error = %err, "challenger dropped: evidence failed validation");
                    }
                },
                Err(SentinelError::EvaluationTimeout) => {
                    timeouts += 1;
                    tracing::warn!("challenger dropped: evaluation timed out");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "challenger dropped: evaluator error");
                }
            }
        }

        if candidates.is_empty() {
            tracing::warn!(timeouts, "no challenger survived evaluation this cycle");
            let pcag = self.build_no_survivor_pcag(&champion, l_inf_champion_before, now_ms)?;
            return Ok(pcag);
        }

        let tie_break: Vec<TieBreakCandidate> = candidates
            .iter()
            .map(|c| TieBreakCandidate {
                l_inf: c.l_inf_detail.l_inf,
                cost_total: c.l_inf_detail.cost_total,
                param_norm: c.state.norm(),
                challenger_hash: c.state.snapshot_hash.clone(),
            })
            .collect();
        let winner_hash = pick_winner(&tie_break)
            .expect("candidates is non-empty, so pick_winner always returns Some")
            .challenger_hash
            .clone();
        let winner = candidates
            .into_iter()
            .find(|c| c.state.snapshot_hash == winner_hash)
            .expect("winner_hash was drawn from this same candidate set");

        let delta_l_inf = winner.l_inf_detail.l_inf - l_inf_champion_before;
        let ece = winner.evidence.calibration.ece();

        let caos_raw = CaosRaw {
            consistency: ConsistencyInputs {
                pass_rate_at_k: winner.evidence.robustness,
                calibration_margin: 1.0 - ece,
                external_validation: 1.0 - winner.evidence.epistemic_uncertainty,
            }
            .combine(),
            autoevolution: AutoevolutionInputs {
                delta_l_inf,
                cost_norm: winner.l_inf_detail.cost_total,
            }
            .combine(),
            incognoscible: IncognoscibleInputs {
                ensemble_disagreement: winner.evidence.epistemic_uncertainty,
                ood_energy: winner.evidence.epistemic_uncertainty,
            }
            .combine(),
            silence: SilenceInputs {
                noise: winner.evidence.misinformation_score,
                redundancy: 0.0,
                entropy: winner.evidence.epistemic_uncertainty,
            }
            .combine(),
        };
        let caos = compute_caos(&mut self.caos_state, caos_raw, self.policy.kappa, DEFAULT_GAMMA);

        let ethics_ok_axis = if ethics_indicator(&winner.ethics_verdicts) > 0.0 { 1.0 } else { 0.0 };
        let metacognition = AutoevolutionInputs {
            delta_l_inf,
            cost_norm: winner.l_inf_detail.cost_total,
        }
        .combine();
        let sr_raw = SrRaw {
            awareness: 1.0 - ece,
            ethics_ok: ethics_ok_axis,
            autocorrection: winner.evidence.robustness,
            metacognition,
        };
        let sr = compute_sr(&mut self.sr_state, sr_raw);

        let gradient: Vec<f64> = winner
            .state
            .params
            .iter()
            .zip(champion.params.iter())
            .map(|(challenger, champion)| challenger - champion)
            .collect();

        let preview_candidate = sentinel_updater::preview(&champion, &gradient, &self.policy, caos.caos_plus, sr.sr, now_ms);

        let guard_inputs = CycleInputs {
            state_before: &champion,
            state_candidate: Some(&preview_candidate),
            policy: &self.policy,
            evidence: &winner.evidence,
            rho: winner.rho,
            caos_plus: caos.caos_plus,
            sr: sr.sr,
            delta_l_inf,
            cost_increase: winner.l_inf_detail.cost_total,
        };
        let guard_verdict = sentinel_guard::run(&guard_inputs);

        let (next_state, update_record) = sentinel_updater::update(
            &champion,
            &gradient,
            &self.policy,
            &guard_verdict,
            caos.caos_plus,
            sr.sr,
            winner.rho,
            now_ms,
        );

        let final_verdict = if guard_verdict.action == Action::Promote && update_record.action != Action::Promote {
            let mut gates = guard_verdict.gates.clone();
            gates.push(GateResult::fail(
                "post_projection_recheck",
                0.0,
                1.0,
                "Lyapunov or contractivity regressed after projection",
            ));
            Verdict::rollback(gates, "post-projection Lyapunov/contractivity re-check failed")
        } else {
            guard_verdict
        };

        let evidence_merkle_root = evidence_merkle_root(&winner.evidence, &self.policy)?;
        let pcag = Pcag {
            cycle_id: CycleId::new().to_string(),
            champion_hash: champion.snapshot_hash.clone(),
            challenger_hash: winner.state.snapshot_hash.clone(),
            metrics: winner.evidence.metrics.clone(),
            cost: winner.evidence.cost.clone(),
            ethics_evidence: winner.ethics_verdicts.clone(),
            caos,
            sr,
            alpha_eff: update_record.alpha_eff.unwrap_or(0.0),
            l_inf_champion: l_inf_champion_before,
            l_inf_challenger: winner.l_inf_detail.l_inf,
            delta_l_inf,
            gates: final_verdict.gates.clone(),
            verdict: final_verdict,
            evidence_merkle_root,
            policy_snapshot_hash: self.policy.snapshot_hash(),
        };

        let entry = self.ledger.append(pcag, now_ms)?;
        if update_record.action == Action::Promote {
            self.state = next_state;
            self.champion_l_inf = winner.l_inf_detail.l_inf;
        }
        Ok(entry.payload)
    }

    fn build_no_survivor_pcag(
        &mut self,
        champion: &State,
        l_inf_champion_before: f64,
        now_ms: i64,
    ) -> Result<Pcag, LedgerError> {
        let (caos, sr) = zeroed_caos_sr(&self.policy);
        let gate = GateResult::fail(
            "evaluation",
            0.0,
            1.0,
            "no challenger evaluation succeeded before the deadline",
        );
        let verdict = Verdict::rollback(vec![gate], "every challenger timed out or failed evaluation this cycle");
        let merkle_root = sentinel_ledger::hash_bytes(b"no-surviving-evidence", self.policy.hash_algorithm);
        let pcag = Pcag {
            cycle_id: CycleId::new().to_string(),
            champion_hash: champion.snapshot_hash.clone(),
            challenger_hash: champion.snapshot_hash.clone(),
            metrics: sentinel_types::MetricSet::new(),
            cost: sentinel_types::Cost::new(),
            ethics_evidence: vec![],
            caos,
            sr,
            alpha_eff: 0.0,
            l_inf_champion: l_inf_champion_before,
            l_inf_challenger: 0.0,
            delta_l_inf: 0.0 - l_inf_champion_before,
            gates: verdict.gates.clone(),
            verdict,
            evidence_merkle_root: merkle_root,
            policy_snapshot_hash: self.policy.snapshot_hash(),
        };
        let entry = self.ledger.append(pcag, now_ms)?;
        Ok(entry.payload)
    }
}

/// Re-derive a PCAg's scalars and gates bit-identically from only the PCAg
/// and its referenced Policy (spec §6 `pcag_verify`). Delegates entirely to
/// `sentinel_ledger::pcag_verify`; kept as a free function here (rather than
/// a `Controller` method) since replay never touches live controller state.
pub fn pcag_verify(pcag: &Pcag, policy: &Policy) -> Result<Verdict, SentinelError> {
    sentinel_ledger::pcag_verify(pcag, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_scaffold::{InMemoryEvaluator, Mutator as ScaffoldMutator, ParametricSweepMutator};

    struct ScaffoldMutatorAdapter(ParametricSweepMutator);
    impl Mutator for ScaffoldMutatorAdapter {
        fn propose(&self, champion: &State, n: usize, seed: u64) -> Vec<State> {
            self.0.propose(champion, n, seed)
        }
    }

    struct ScaffoldEvaluatorAdapter(InMemoryEvaluator);
    impl Evaluator for ScaffoldEvaluatorAdapter {
        fn evaluate(&self, challenger: &State, seed: u64, deadline_ms: i64) -> Result<Evidence, SentinelError> {
            sentinel_scaffold::Evaluator::evaluate(&self.0, challenger, seed, deadline_ms)
        }
    }

    fn controller() -> (Controller, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let policy = Policy::default_for_dims(2);
        let ledger = Ledger::open_or_create(&path, policy.hash_algorithm).unwrap();
        let state = State::genesis(vec![0.1, 0.1], 0);
        (Controller::new(state, policy, ledger, 0.0), dir)
    }

    #[test]
    fn a_cycle_always_appends_exactly_one_ledger_entry() {
        let (mut controller, _dir) = controller();
        let mutator = ScaffoldMutatorAdapter(ParametricSweepMutator::default());
        let evaluator = ScaffoldEvaluatorAdapter(InMemoryEvaluator::default());
        let pcag = controller.cycle(&mutator, &evaluator, 3, 7, 1_000, 1).unwrap();
        assert_eq!(pcag.gates.len(), pcag.verdict.gates.len());
        assert!(controller.ledger_verify().is_ok());
    }

    #[test]
    fn every_challenger_timing_out_rolls_back_without_mutating_state() {
        let (mut controller, _dir) = controller();
        let mutator = ScaffoldMutatorAdapter(ParametricSweepMutator::default());
        let before = controller.state().clone();
        let timeout_all = ScaffoldEvaluatorAdapter(InMemoryEvaluator {
            timeout_challenger_ids: (0..10).map(|v| format!("challenger-v{v}")).collect(),
        });
        let pcag = controller.cycle(&mutator, &timeout_all, 3, 7, 1_000, 1).unwrap();
        assert_eq!(pcag.verdict.action, Action::Rollback);
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn a_produced_pcag_replays_to_the_same_verdict() {
        let (mut controller, _dir) = controller();
        let mutator = ScaffoldMutatorAdapter(ParametricSweepMutator::default());
        let evaluator = ScaffoldEvaluatorAdapter(InMemoryEvaluator::default());
        let pcag = controller.cycle(&mutator, &evaluator, 3, 11, 1_000, 1).unwrap();
        let replayed = pcag_verify(&pcag, controller.policy()).unwrap();
        assert_eq!(replayed.action, pcag.verdict.action);
    }

    #[test]
    fn missing_consent_rolls_back_an_otherwise_clean_challenger() {
        struct AlwaysNoConsent;
        impl Evaluator for AlwaysNoConsent {
            fn evaluate(&self, challenger: &State, seed: u64, deadline_ms: i64) -> Result<Evidence, SentinelError> {
                let inner = InMemoryEvaluator::default();
                let mut evidence = sentinel_scaffold::Evaluator::evaluate(&inner, challenger, seed, deadline_ms)?;
                evidence.consent = false;
                Ok(evidence)
            }
        }
        let (mut controller, _dir) = controller();
        let mutator = ScaffoldMutatorAdapter(ParametricSweepMutator::default());
        let pcag = controller.cycle(&mutator, &AlwaysNoConsent, 2, 5, 1_000, 1).unwrap();
        assert_eq!(pcag.verdict.action, Action::Rollback);
    }
}
