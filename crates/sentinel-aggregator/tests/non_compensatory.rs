//! Property-based check of L∞'s non-compensatoriness (spec §8): as the
//! minimum metric approaches zero, L∞ approaches zero independent of the
//! other metrics' values.

use proptest::prelude::*;
use sentinel_aggregator::compute_l_inf;
use sentinel_types::{Cost, Metric, MetricSet, Policy};

proptest! {
    #[test]
    fn l_inf_collapses_as_the_worst_metric_floors(
        good_a in 0.5f64..1.0,
        good_b in 0.5f64..1.0,
        worst_exp in 3u32..12u32,
    ) {
        let worst = 10f64.powi(-(worst_exp as i32));
        let metrics = MetricSet::from_iter([
            Metric::new("a", good_a, 1.0 / 3.0),
            Metric::new("b", good_b, 1.0 / 3.0),
            Metric::new("worst", worst, 1.0 / 3.0),
        ]);
        let cost = Cost::new();
        let policy = Policy::default_for_dims(2);
        let detail = compute_l_inf(&metrics, &cost, true, &policy).unwrap();

        // The harmonic mean is bounded by roughly `weight / floored_worst`
        // in the denominator, so L∞ must stay small regardless of how good
        // `a` and `b` are.
        prop_assert!(detail.l_inf <= worst.max(1e-3) * 3.5 + 1e-9);
    }

    #[test]
    fn l_inf_is_zero_one_bounded(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        cost_total in 0.0f64..5.0,
    ) {
        let metrics = MetricSet::from_iter([
            Metric::new("a", a, 0.5),
            Metric::new("b", b, 0.5),
        ]);
        let cost = Cost::new().with("x", cost_total);
        let mut policy = Policy::default_for_dims(2);
        policy.cost_scales.clear();
        policy.cost_scales.insert("x".to_string(), 1.0);
        let detail = compute_l_inf(&metrics, &cost, true, &policy).unwrap();
        prop_assert!(detail.l_inf >= 0.0);
        prop_assert!(detail.l_inf <= 1.0 + 1e-9);
    }
}
