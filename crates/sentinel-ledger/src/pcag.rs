//! Proof-Carrying Artifact generator and verifier (spec §4.6). A PCAg is
//! self-verifying: given only the PCAg and the referenced Policy, `verify`
//! must reproduce `L∞`, `CAOS+`, `SR`, and the Verdict bit-identically
//! (within the declared floating-point tolerance).

use sentinel_types::{ethics_indicator, CaosComponents, Policy, SentinelError, SrComponents, Verdict};

/// Tolerance used when comparing a recomputed scalar against the one
/// recorded in the PCAg — covers floating-point noise, not algorithmic
/// disagreement.
const REPLAY_TOLERANCE: f64 = 1e-6;

fn mismatch(what: &str, recomputed: f64, recorded: f64) -> SentinelError {
    SentinelError::Internal(format!(
        "PCAg replay mismatch on {what}: recomputed {recomputed}, recorded {recorded}"
    ))
}

/// Recompute the derived scalars a PCAg carries and check they still
/// reproduce what was recorded, then return the stored `Verdict` once
/// satisfied. This does not re-run the Mutator/Evaluator (their outputs —
/// metrics, cost, ethics evidence — are themselves part of what's being
/// verified, not re-derived), but every pure-math step downstream of them
/// is fully replayed.
pub fn verify(pcag: &sentinel_types::Pcag, policy: &Policy) -> Result<Verdict, SentinelError> {
    let ethics_ok = ethics_indicator(&pcag.ethics_evidence) > 0.0;
    let l_inf_detail = sentinel_aggregator::compute_l_inf(&pcag.metrics, &pcag.cost, ethics_ok, policy)?;
    if (l_inf_detail.l_inf - pcag.l_inf_challenger).abs() > REPLAY_TOLERANCE {
        return Err(mismatch("l_inf_challenger", l_inf_detail.l_inf, pcag.l_inf_challenger));
    }

    let recomputed_delta = pcag.l_inf_challenger - pcag.l_inf_champion;
    if (recomputed_delta - pcag.delta_l_inf).abs() > REPLAY_TOLERANCE {
        return Err(mismatch("delta_l_inf", recomputed_delta, pcag.delta_l_inf));
    }

    verify_caos(&pcag.caos, policy)?;
    verify_sr(&pcag.sr)?;

    let phi = sentinel_motor::phi(pcag.caos.caos_plus, sentinel_motor::DEFAULT_GAMMA);
    let alpha_eff = (policy.alpha_0 * phi * pcag.sr.sr).clamp(policy.alpha_min, policy.alpha_max);
    // alpha_eff is only meaningful when the Updater actually ran, i.e. the
    // verdict promoted; a Reject/Rollback cycle's recorded alpha_eff is 0
    // by convention and is not replayed.
    if pcag.verdict.action == sentinel_types::Action::Promote
        && (alpha_eff - pcag.alpha_eff).abs() > REPLAY_TOLERANCE
    {
        return Err(mismatch("alpha_eff", alpha_eff, pcag.alpha_eff));
    }

    if !pcag.verdict.is_internally_consistent() {
        return Err(SentinelError::Internal(
            "recorded verdict is not internally consistent with its own gate results".to_string(),
        ));
    }

    Ok(pcag.verdict.clone())
}

fn verify_caos(caos: &CaosComponents, policy: &Policy) -> Result<(), SentinelError> {
    let (caos_plus, phi_caos) = sentinel_motor::caos_plus_from_components(
        caos.consistency,
        caos.autoevolution,
        caos.incognoscible,
        caos.silence,
        policy.kappa,
        sentinel_motor::DEFAULT_GAMMA,
    );
    if (caos_plus - caos.caos_plus).abs() > REPLAY_TOLERANCE {
        return Err(mismatch("caos_plus", caos_plus, caos.caos_plus));
    }
    if (phi_caos - caos.phi_caos).abs() > REPLAY_TOLERANCE {
        return Err(mismatch("phi_caos", phi_caos, caos.phi_caos));
    }
    Ok(())
}

fn verify_sr(sr: &SrComponents) -> Result<(), SentinelError> {
    let recomputed = sentinel_motor::sr_from_axes(sr.awareness, sr.ethics_ok, sr.autocorrection, sr.metacognition);
    if (recomputed - sr.sr).abs() > REPLAY_TOLERANCE {
        return Err(mismatch("sr", recomputed, sr.sr));
    }
    Ok(())
}
