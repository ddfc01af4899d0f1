use serde::{Deserialize, Serialize};

/// The fourteen ethical predicates enforced by the Guard pipeline.
///
/// LO-01 bars anthropomorphism claims; LO-04 enforces risk contractivity;
/// LO-05 requires privacy (no PII without consent); LO-07 requires explicit
/// consent; LO-09 bounds bias; LO-12 bounds ecological cost; LO-14 bars
/// misinformation. The remaining laws round out the full catalogue named in
/// the glossary (occultism, physical harm, emotional harm, security,
/// autonomy, equity, auditability, explainability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EthicsLaw {
    #[serde(rename = "LO-01")]
    Anthropomorphism,
    #[serde(rename = "LO-02")]
    Occultism,
    #[serde(rename = "LO-03")]
    PhysicalHarm,
    #[serde(rename = "LO-04")]
    RiskContractivity,
    #[serde(rename = "LO-05")]
    Privacy,
    #[serde(rename = "LO-06")]
    Security,
    #[serde(rename = "LO-07")]
    Consent,
    #[serde(rename = "LO-08")]
    Autonomy,
    #[serde(rename = "LO-09")]
    Bias,
    #[serde(rename = "LO-10")]
    Equity,
    #[serde(rename = "LO-11")]
    Auditability,
    #[serde(rename = "LO-12")]
    EcologicalCost,
    #[serde(rename = "LO-13")]
    Explainability,
    #[serde(rename = "LO-14")]
    Truthfulness,
}

impl EthicsLaw {
    pub const ALL: [EthicsLaw; 14] = [
        EthicsLaw::Anthropomorphism,
        EthicsLaw::Occultism,
        EthicsLaw::PhysicalHarm,
        EthicsLaw::RiskContractivity,
        EthicsLaw::Privacy,
        EthicsLaw::Security,
        EthicsLaw::Consent,
        EthicsLaw::Autonomy,
        EthicsLaw::Bias,
        EthicsLaw::Equity,
        EthicsLaw::Auditability,
        EthicsLaw::EcologicalCost,
        EthicsLaw::Explainability,
        EthicsLaw::Truthfulness,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EthicsLaw::Anthropomorphism => "LO-01",
            EthicsLaw::Occultism => "LO-02",
            EthicsLaw::PhysicalHarm => "LO-03",
            EthicsLaw::RiskContractivity => "LO-04",
            EthicsLaw::Privacy => "LO-05",
            EthicsLaw::Security => "LO-06",
            EthicsLaw::Consent => "LO-07",
            EthicsLaw::Autonomy => "LO-08",
            EthicsLaw::Bias => "LO-09",
            EthicsLaw::Equity => "LO-10",
            EthicsLaw::Auditability => "LO-11",
            EthicsLaw::EcologicalCost => "LO-12",
            EthicsLaw::Explainability => "LO-13",
            EthicsLaw::Truthfulness => "LO-14",
        }
    }
}

/// Tagged union over a single ethics predicate's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum EthicsVerdict {
    Pass,
    Fail { law: EthicsLaw, evidence: String },
}

impl EthicsVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, EthicsVerdict::Pass)
    }
}

/// The aggregate 0/1 ethics indicator used by the Aggregator (spec §4.1
/// step 4): `1` iff every one of LO-01…LO-14 passed.
pub fn ethics_indicator(verdicts: &[EthicsVerdict]) -> f64 {
    if verdicts.iter().all(EthicsVerdict::is_pass) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_is_one_only_when_all_pass() {
        let all_pass = vec![EthicsVerdict::Pass, EthicsVerdict::Pass];
        assert_eq!(ethics_indicator(&all_pass), 1.0);

        let one_fail = vec![
            EthicsVerdict::Pass,
            EthicsVerdict::Fail {
                law: EthicsLaw::Consent,
                evidence: "consent=false".into(),
            },
        ];
        assert_eq!(ethics_indicator(&one_fail), 0.0);
    }

    #[test]
    fn all_fourteen_laws_have_distinct_codes() {
        let codes: std::collections::HashSet<_> =
            EthicsLaw::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes.len(), 14);
    }
}
