//! Group-level rates, disparate impact and disparity spreads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AttributeDisparity, GroupMetrics, IntersectionalRecord};

/// One labelled decision: what the model did and what it should have done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub group: String,
    pub approved: bool,
    pub should_approve: bool,
}

impl OutcomeRecord {
    pub fn new(group: impl Into<String>, approved: bool, should_approve: bool) -> Self {
        Self {
            group: group.into(),
            approved,
            should_approve,
        }
    }
}

#[derive(Default)]
struct Confusion {
    true_positive: usize,
    false_positive: usize,
    true_negative: usize,
    false_negative: usize,
}

impl Confusion {
    fn record(&mut self, approved: bool, should_approve: bool) {
        match (approved, should_approve) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_negative += 1,
        }
    }

    fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    fn into_metrics(self) -> GroupMetrics {
        let total = self.total();
        GroupMetrics {
            approval_rate: (self.true_positive + self.false_positive) as f64 / total as f64,
            false_positive_rate: ratio(
                self.false_positive,
                self.false_positive + self.true_negative,
            ),
            false_negative_rate: ratio(
                self.false_negative,
                self.false_negative + self.true_positive,
            ),
            count: total,
        }
    }
}

/// `None` when the denominator is zero.
fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// Groups outcomes by label and computes approval, false positive and false
/// negative rates per group.
///
/// A group with no negative ground-truth cases gets `None` as its false
/// positive rate; likewise for positives and the false negative rate.
pub fn compute_group_metrics(records: &[OutcomeRecord]) -> BTreeMap<String, GroupMetrics> {
    let mut by_group: BTreeMap<String, Confusion> = BTreeMap::new();
    for record in records {
        by_group
            .entry(record.group.clone())
            .or_default()
            .record(record.approved, record.should_approve);
    }

    let metrics: BTreeMap<String, GroupMetrics> = by_group
        .into_iter()
        .map(|(group, confusion)| (group, confusion.into_metrics()))
        .collect();

    for (group, m) in &metrics {
        if m.false_positive_rate.is_none() || m.false_negative_rate.is_none() {
            tracing::debug!(group = %group, "Undefined error rate for group");
        }
    }
    metrics
}

/// Recomputes disparate impact against the highest approval rate in `records`.
///
/// The privileged record gets exactly 1.0 and every other record at most 1.0.
/// When every rate is zero all groups are equal and each gets 1.0.
pub fn compute_disparate_impact(records: &[IntersectionalRecord]) -> Vec<IntersectionalRecord> {
    let max_rate = records
        .iter()
        .map(|r| r.approval_rate)
        .fold(f64::NEG_INFINITY, f64::max);

    records
        .iter()
        .map(|r| {
            let disparate_impact = if max_rate > 0.0 {
                r.approval_rate / max_rate
            } else {
                1.0
            };
            IntersectionalRecord {
                disparate_impact,
                ..r.clone()
            }
        })
        .collect()
}

fn spread(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max, n) = values.fold((f64::INFINITY, f64::NEG_INFINITY, 0usize), |acc, v| {
        (acc.0.min(v), acc.1.max(v), acc.2 + 1)
    });
    if n < 2 { 0.0 } else { max - min }
}

/// Max-minus-min of each rate across groups. Undefined rates are skipped and
/// a field with fewer than two defined values has zero disparity.
pub fn compute_attribute_disparity(groups: &BTreeMap<String, GroupMetrics>) -> AttributeDisparity {
    AttributeDisparity {
        approval_disparity: spread(groups.values().map(|m| m.approval_rate)),
        fp_disparity: spread(groups.values().filter_map(|m| m.false_positive_rate)),
        fn_disparity: spread(groups.values().filter_map(|m| m.false_negative_rate)),
    }
}

/// Disparate-impact ratio below which a group is commonly flagged.
pub const FOUR_FIFTHS_THRESHOLD: f64 = 0.80;

/// Records whose disparate impact falls below the four-fifths threshold.
pub fn flag_adverse_impact(records: &[IntersectionalRecord]) -> Vec<&IntersectionalRecord> {
    records
        .iter()
        .filter(|r| r.disparate_impact < FOUR_FIFTHS_THRESHOLD)
        .collect()
}
