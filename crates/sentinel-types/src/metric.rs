use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

/// Default ε-floor applied to any metric below it before aggregation.
pub const DEFAULT_EPSILON: f64 = 1e-3;

/// A named scalar in `[0,1]` with a weight in `[0,1]` and an ε-floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            value,
            weight,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Value clamped to the ε-floor, as used inside aggregation.
    pub fn floored_value(&self) -> f64 {
        self.value.max(self.epsilon)
    }

    pub fn validate(&self) -> Result<(), EvidenceError> {
        if self.value.is_nan() {
            return Err(EvidenceError::NanMetric {
                name: self.name.clone(),
            });
        }
        if !(0.0..=1.0).contains(&self.value) {
            return Err(EvidenceError::MetricOutOfRange {
                name: self.name.clone(),
                value: self.value,
            });
        }
        Ok(())
    }
}

/// An unordered multiset of metrics, keyed by name. Order is irrelevant to
/// aggregation (spec §3: "order is irrelevant to aggregation"); a
/// `BTreeMap` is used purely so iteration — and therefore canonical
/// serialization downstream — is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSet(BTreeMap<String, Metric>);

impl MetricSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, metric: Metric) {
        self.0.insert(metric.name.clone(), metric);
    }

    pub fn from_iter(metrics: impl IntoIterator<Item = Metric>) -> Self {
        let mut set = Self::new();
        for m in metrics {
            set.insert(m);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.0.values()
    }

    pub fn validate(&self) -> Result<(), EvidenceError> {
        if self.0.is_empty() {
            return Err(EvidenceError::EmptyMetricSet);
        }
        let sum: f64 = self.0.values().map(|m| m.weight).sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EvidenceError::WeightsDoNotSumToOne { sum });
        }
        for m in self.0.values() {
            m.validate()?;
        }
        Ok(())
    }
}
