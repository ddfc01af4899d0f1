use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Bounded exponential moving average with an explicit half-life, shared by
/// `CAOSState` and `SRState`. `alpha = 1 - exp(-ln2 / half_life)` (spec
/// §4.2 Smoothing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
    history: VecDeque<f64>,
    window: usize,
}

impl Ema {
    pub fn new(half_life: u32, window: usize) -> Self {
        let half_life = half_life.max(1) as f64;
        Self {
            alpha: 1.0 - (-std::f64::consts::LN_2 / half_life).exp(),
            value: None,
            history: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    pub fn push(&mut self, sample: f64) -> f64 {
        let smoothed = match self.value {
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
            None => sample,
        };
        self.value = Some(smoothed);
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(smoothed);
        smoothed
    }

    pub fn current(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    /// Stability, reported as `1 / (1 + CV)` over the history window (spec
    /// §4.2).
    pub fn stability(&self) -> f64 {
        if self.history.len() < 2 {
            return 1.0;
        }
        let n = self.history.len() as f64;
        let mean = self.history.iter().sum::<f64>() / n;
        if mean.abs() < 1e-12 {
            return 1.0;
        }
        let variance = self.history.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let cv = variance.sqrt() / mean.abs();
        1.0 / (1.0 + cv)
    }
}

/// Smoothed history of the CAOS+ components `(C, A, O, S)`. Updated only
/// through the Motor; single-owner, not shared across cycles of the same
/// State (spec §3, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CAOSState {
    pub consistency: Ema,
    pub autoevolution: Ema,
    pub incognoscible: Ema,
    pub silence: Ema,
}

impl CAOSState {
    pub fn new(half_life: u32) -> Self {
        Self {
            consistency: Ema::new(half_life, 32),
            autoevolution: Ema::new(half_life, 32),
            incognoscible: Ema::new(half_life, 32),
            silence: Ema::new(half_life, 32),
        }
    }
}

/// Smoothed history of three of the four SR-Ω∞ reflexive axes. `ethics_ok`
/// is deliberately absent: it is a per-cycle veto rather than a trend, so
/// the Motor applies it unsmoothed straight from the raw observation (see
/// `sentinel_motor::sr::compute_sr`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SRState {
    pub awareness: Ema,
    pub autocorrection: Ema,
    pub metacognition: Ema,
}

impl SRState {
    pub fn new(half_life: u32) -> Self {
        Self {
            awareness: Ema::new(half_life, 32),
            autocorrection: Ema::new(half_life, 32),
            metacognition: Ema::new(half_life, 32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_converges_toward_a_constant_input() {
        let mut ema = Ema::new(5, 16);
        for _ in 0..50 {
            ema.push(0.7);
        }
        assert!((ema.current() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn stability_is_one_for_constant_history() {
        let mut ema = Ema::new(5, 16);
        for _ in 0..10 {
            ema.push(0.5);
        }
        assert!((ema.stability() - 1.0).abs() < 1e-9);
    }
}
