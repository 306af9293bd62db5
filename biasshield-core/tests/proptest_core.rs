//! Property-based tests for the fairness calculators using proptest.

use chrono::NaiveDate;
use proptest::prelude::*;

use biasshield_core::remediation::simulate;
use biasshield_core::synth::{Archetype, generate_series};
use biasshield_core::trend::{TimeRange, Trend, analyze_trend, filter_by_time_range};
use biasshield_core::{
    AttributePair, IntersectionalRecord, Noise, ProtectedAttribute, RemediationStrategy,
    apply_remediation, calculate_improvement, compute_disparate_impact,
    generate_intersectional_data, moving_average,
};

fn strategy() -> impl Strategy<Value = RemediationStrategy> {
    prop::sample::select(RemediationStrategy::ALL.to_vec())
}

fn attribute() -> impl Strategy<Value = ProtectedAttribute> {
    prop::sample::select(ProtectedAttribute::ALL.to_vec())
}

fn rates() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, 1..8)
}

// --- Remediation properties ---

proptest! {
    #[test]
    fn zero_strength_is_identity(values in rates(), strategy in strategy()) {
        prop_assert_eq!(apply_remediation(&values, strategy, 0.0), values);
    }

    #[test]
    fn remediated_values_stay_in_unit_interval(
        values in rates(),
        strategy in strategy(),
        strength in -1.0f64..2.0,
    ) {
        let out = apply_remediation(&values, strategy, strength);
        prop_assert_eq!(out.len(), values.len());
        for v in out {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn full_threshold_optimization_equalizes(values in rates()) {
        let out = apply_remediation(&values, RemediationStrategy::ThresholdOptimization, 1.0);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for v in out {
            prop_assert_eq!(v, max);
        }
    }

    #[test]
    fn privileged_value_is_untouched(
        values in rates(),
        strategy in strategy(),
        strength in 0.0f64..=1.0,
    ) {
        let out = apply_remediation(&values, strategy, strength);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let idx = values.iter().position(|&v| v == max).unwrap();
        prop_assert_eq!(out[idx], values[idx]);
    }

    #[test]
    fn unchanged_values_have_no_improvement(values in rates()) {
        prop_assert_eq!(calculate_improvement(&values, &values), 0.0);
    }

    #[test]
    fn threshold_improvement_scales_with_strength(values in rates(), strength in 0.0f64..=1.0) {
        let result = simulate(&values, RemediationStrategy::ThresholdOptimization, strength);
        let spread = values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            - values.iter().copied().fold(f64::INFINITY, f64::min);
        if spread > 1e-3 {
            prop_assert!((result.improvement_percent - strength * 100.0).abs() < 1e-6);
        }
    }
}

// --- Disparity properties ---

fn record(rate: f64) -> IntersectionalRecord {
    IntersectionalRecord {
        primary_value: "A".into(),
        secondary_value: "B".into(),
        approval_rate: rate,
        false_positive_rate: 0.1,
        false_negative_rate: 0.1,
        disparate_impact: 0.0,
    }
}

proptest! {
    #[test]
    fn disparate_impact_is_at_most_one(values in rates()) {
        let records: Vec<_> = values.iter().copied().map(record).collect();
        let out = compute_disparate_impact(&records);
        prop_assert!(out.iter().all(|r| r.disparate_impact <= 1.0 + 1e-12));
        prop_assert!(out.iter().any(|r| (r.disparate_impact - 1.0).abs() < 1e-12));
    }

    #[test]
    fn attribute_pairs_are_unordered(a in attribute(), b in attribute()) {
        prop_assert_eq!(AttributePair::new(a, b), AttributePair::new(b, a));
        prop_assert_eq!(AttributePair::new(a, b).is_none(), a == b);
    }

    #[test]
    fn synthesized_rates_stay_in_bounds(seed in any::<u64>()) {
        let data = generate_intersectional_data(&mut Noise::seeded(seed, 0.02));
        prop_assert_eq!(data.len(), 10);
        for pair in AttributePair::all() {
            let records = data.get(pair.first(), pair.second()).unwrap();
            for r in records {
                prop_assert!((0.10..=0.95).contains(&r.approval_rate));
                prop_assert!((0.05..=0.30).contains(&r.false_positive_rate));
                prop_assert!((0.05..=0.30).contains(&r.false_negative_rate));
                prop_assert!(r.disparate_impact <= 1.0 + 1e-12);
            }
        }
    }
}

// --- Trend properties ---

proptest! {
    #[test]
    fn moving_average_preserves_length(
        values in prop::collection::vec(0.0f64..1.0, 0..30),
        window in 0usize..8,
    ) {
        let out = moving_average(&values, window);
        prop_assert_eq!(out.len(), values.len());
        let gaps = out.iter().filter(|v| v.is_none()).count();
        if window > 0 && values.len() >= window {
            prop_assert_eq!(gaps, 2 * (window / 2));
        } else {
            prop_assert_eq!(gaps, 0);
        }
    }

    #[test]
    fn shrinking_series_is_improving(start in 0.05f64..1.0, len in 2usize..24) {
        let values: Vec<f64> = (0..len).map(|i| start * 0.8f64.powi(i as i32)).collect();
        let analysis = analyze_trend(&values);
        prop_assert!(analysis.sufficient_data);
        prop_assert_eq!(analysis.trend, Trend::Improving);
    }

    #[test]
    fn temporal_metrics_stay_in_unit_interval(seed in any::<u64>(), attr in attribute()) {
        let now = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let series = generate_series(
            Archetype::for_attribute(attr),
            now,
            &mut Noise::seeded(seed, 0.02),
        );
        for r in &series {
            for v in [
                r.approval_disparity,
                r.false_positive_disparity,
                r.false_negative_disparity,
                r.demographic_parity,
                r.equalized_odds,
            ] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn filtered_series_keeps_whole_months(day in 1u32..=28, month in 1u32..=12) {
        let now = NaiveDate::from_ymd_opt(2026, month, day).unwrap();
        let series = generate_series(Archetype::Cyclical, now, &mut Noise::none());
        for range in [TimeRange::Month, TimeRange::Quarter, TimeRange::Year] {
            let kept = filter_by_time_range(&series, range, now);
            prop_assert_eq!(kept.len() as u32, range.months().unwrap());
        }
        prop_assert_eq!(filter_by_time_range(&series, TimeRange::All, now).len(), series.len());
    }
}
