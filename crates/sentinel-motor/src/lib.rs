//! Dynamics Motor: the CAOS+ amplifier and the SR-Ω∞ reflexive modulator,
//! both smoothed through a single shared EMA primitive owned here rather
//! than scattered across trackers (spec §4.2, §9).

pub mod caos;
pub mod sr;

pub use caos::{
    caos_plus_from_components, compute_caos, phi, AutoevolutionInputs, CaosRaw, ConsistencyInputs,
    IncognoscibleInputs, SilenceInputs, CAOS_PLUS_CAP, DEFAULT_GAMMA,
};
pub use sr::{compute_sr, sr_from_axes, SrRaw};
