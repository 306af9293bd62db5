//! Per-attribute fairness report as served by the backend's `/fairness`
//! endpoint, plus the built-in sample report used when it is unreachable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::compute_attribute_disparity;
use crate::types::{AttributeBiasSummary, GroupMetrics, ProtectedAttribute};

/// Rates and disparities for one protected attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasMetrics {
    pub approval_rates: BTreeMap<String, f64>,
    pub approval_disparity: f64,
    pub fp_rates: BTreeMap<String, f64>,
    pub fn_rates: BTreeMap<String, f64>,
    pub fp_disparity: f64,
    pub fn_disparity: f64,
}

impl BiasMetrics {
    /// Builds wire metrics from a summary. Undefined error rates are omitted
    /// from the rate maps; disparities are recomputed.
    pub fn from_summary(summary: &AttributeBiasSummary) -> Self {
        let disparity = compute_attribute_disparity(&summary.groups);
        let mut metrics = Self {
            approval_disparity: disparity.approval_disparity,
            fp_disparity: disparity.fp_disparity,
            fn_disparity: disparity.fn_disparity,
            ..Self::default()
        };
        for (group, m) in &summary.groups {
            metrics.approval_rates.insert(group.clone(), m.approval_rate);
            if let Some(fpr) = m.false_positive_rate {
                metrics.fp_rates.insert(group.clone(), fpr);
            }
            if let Some(fnr) = m.false_negative_rate {
                metrics.fn_rates.insert(group.clone(), fnr);
            }
        }
        metrics
    }

    /// Converts to per-group metrics. Sample counts are not part of the wire
    /// format and come back as zero.
    pub fn to_summary(&self, attribute: ProtectedAttribute) -> AttributeBiasSummary {
        let groups = self
            .approval_rates
            .iter()
            .map(|(group, &approval_rate)| {
                (
                    group.clone(),
                    GroupMetrics {
                        approval_rate,
                        false_positive_rate: self.fp_rates.get(group).copied(),
                        false_negative_rate: self.fn_rates.get(group).copied(),
                        count: 0,
                    },
                )
            })
            .collect();
        AttributeBiasSummary::new(attribute, groups)
    }

    /// Group with the highest approval rate.
    pub fn highest_approval(&self) -> Option<(&str, f64)> {
        self.approval_rates
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(g, r)| (g.as_str(), *r))
    }

    /// Group with the lowest approval rate.
    pub fn lowest_approval(&self) -> Option<(&str, f64)> {
        self.approval_rates
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(g, r)| (g.as_str(), *r))
    }
}

/// Fairness metrics for the four attributes the backend reports on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub gender: BiasMetrics,
    pub race: BiasMetrics,
    pub age_group: BiasMetrics,
    pub disability_status: BiasMetrics,
}

impl FairnessReport {
    /// Attributes in report order.
    pub fn attributes(&self) -> [(ProtectedAttribute, &BiasMetrics); 4] {
        [
            (ProtectedAttribute::Gender, &self.gender),
            (ProtectedAttribute::Race, &self.race),
            (ProtectedAttribute::AgeGroup, &self.age_group),
            (ProtectedAttribute::DisabilityStatus, &self.disability_status),
        ]
    }

    /// Metrics for an attribute, `None` for attributes the report omits.
    pub fn get(&self, attribute: ProtectedAttribute) -> Option<&BiasMetrics> {
        match attribute {
            ProtectedAttribute::Gender => Some(&self.gender),
            ProtectedAttribute::Race => Some(&self.race),
            ProtectedAttribute::AgeGroup => Some(&self.age_group),
            ProtectedAttribute::DisabilityStatus => Some(&self.disability_status),
            ProtectedAttribute::IncomeLevel => None,
        }
    }

    /// Attribute with the largest approval disparity.
    pub fn most_biased(&self) -> (ProtectedAttribute, f64) {
        self.attributes()
            .into_iter()
            .map(|(attr, m)| (attr, m.approval_disparity))
            .fold((ProtectedAttribute::Gender, 0.0), |best, cur| {
                if cur.1.abs() > best.1.abs() { cur } else { best }
            })
    }
}

fn metrics(
    approval: &[(&str, f64)],
    approval_disparity: f64,
    fp: &[f64],
    fn_: &[f64],
    fp_disparity: f64,
    fn_disparity: f64,
) -> BiasMetrics {
    let names = approval.iter().map(|(name, _)| name.to_string());
    BiasMetrics {
        approval_rates: approval.iter().map(|(n, r)| (n.to_string(), *r)).collect(),
        approval_disparity,
        fp_rates: names.clone().zip(fp.iter().copied()).collect(),
        fn_rates: names.zip(fn_.iter().copied()).collect(),
        fp_disparity,
        fn_disparity,
    }
}

/// The backend's demo metrics, used as the local fallback report.
pub fn sample_fairness_report() -> FairnessReport {
    FairnessReport {
        gender: metrics(
            &[("Male", 0.72), ("Female", 0.64)],
            0.08,
            &[0.15, 0.12],
            &[0.10, 0.18],
            0.03,
            0.08,
        ),
        race: metrics(
            &[
                ("White", 0.75),
                ("Black", 0.62),
                ("Asian", 0.70),
                ("Hispanic", 0.65),
            ],
            0.13,
            &[0.16, 0.11, 0.14, 0.12],
            &[0.09, 0.19, 0.12, 0.16],
            0.05,
            0.10,
        ),
        age_group: metrics(
            &[("Under 25", 0.65), ("25-60", 0.72), ("Over 60", 0.68)],
            0.07,
            &[0.13, 0.15, 0.14],
            &[0.18, 0.10, 0.15],
            0.02,
            0.08,
        ),
        disability_status: metrics(
            &[("Yes", 0.62), ("No", 0.73)],
            0.11,
            &[0.12, 0.15],
            &[0.20, 0.09],
            0.03,
            0.11,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_report_disparities_match_rates() {
        let report = sample_fairness_report();
        for (attr, m) in report.attributes() {
            let recomputed = m.to_summary(attr).disparity();
            assert!(
                (recomputed.approval_disparity - m.approval_disparity).abs() < 1e-9,
                "{attr}"
            );
            assert!((recomputed.fp_disparity - m.fp_disparity).abs() < 1e-9, "{attr}");
            assert!((recomputed.fn_disparity - m.fn_disparity).abs() < 1e-9, "{attr}");
        }
    }

    #[test]
    fn test_summary_round_trip_preserves_rates() {
        let report = sample_fairness_report();
        let summary = report.race.to_summary(ProtectedAttribute::Race);
        assert_eq!(summary.groups.len(), 4);
        assert_eq!(summary.groups["Black"].false_negative_rate, Some(0.19));
        let back = BiasMetrics::from_summary(&summary);
        assert_eq!(back.approval_rates, report.race.approval_rates);
        assert_eq!(back.fp_rates, report.race.fp_rates);
    }

    #[test]
    fn test_from_summary_omits_undefined_rates() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "A".to_string(),
            GroupMetrics {
                approval_rate: 0.5,
                false_positive_rate: None,
                false_negative_rate: Some(0.2),
                count: 3,
            },
        );
        let m = BiasMetrics::from_summary(&AttributeBiasSummary::new(
            ProtectedAttribute::Gender,
            groups,
        ));
        assert!(m.fp_rates.is_empty());
        assert_eq!(m.fn_rates.len(), 1);
    }

    #[test]
    fn test_highest_and_lowest() {
        let report = sample_fairness_report();
        assert_eq!(report.race.highest_approval(), Some(("White", 0.75)));
        assert_eq!(report.race.lowest_approval(), Some(("Black", 0.62)));
    }

    #[test]
    fn test_most_biased_and_missing_attribute() {
        let report = sample_fairness_report();
        assert_eq!(report.most_biased().0, ProtectedAttribute::Race);
        assert!(report.get(ProtectedAttribute::IncomeLevel).is_none());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(sample_fairness_report()).unwrap();
        assert_eq!(json["gender"]["approval_rates"]["Male"], 0.72);
        assert_eq!(json["disability_status"]["fn_disparity"], 0.11);
    }
}
