//! Intersectional approval-rate synthesis for every pair of protected attributes.

use std::collections::BTreeMap;

use super::noise::Noise;
use crate::types::{AttributePair, IntersectionalRecord, ProtectedAttribute};

/// Approval rate every combination starts from.
pub const BASE_APPROVAL_RATE: f64 = 0.70;

const APPROVAL_BOUNDS: (f64, f64) = (0.10, 0.95);
const ERROR_RATE_BOUNDS: (f64, f64) = (0.05, 0.30);

/// Additive approval offset for a single attribute value.
pub fn value_offset(attribute: ProtectedAttribute, value: &str) -> f64 {
    use ProtectedAttribute::*;
    match (attribute, value) {
        (Gender, "Male") => 0.08,
        (Gender, "Female") => -0.02,
        (Gender, "Non-binary") => -0.06,
        (Race, "White") => 0.07,
        (Race, "Black") => -0.13,
        (Race, "Asian") => 0.03,
        (Race, "Hispanic") => -0.09,
        (Race, "Other") => -0.05,
        (AgeGroup, "Under 25") => -0.08,
        (AgeGroup, "25-34") => 0.0,
        (AgeGroup, "35-44") => 0.05,
        (AgeGroup, "45-60") => 0.04,
        (AgeGroup, "Over 60") => -0.04,
        (IncomeLevel, "Low") => -0.15,
        (IncomeLevel, "Medium") => 0.0,
        (IncomeLevel, "High") => 0.12,
        (DisabilityStatus, "Yes") => -0.10,
        (DisabilityStatus, "No") => 0.03,
        _ => 0.0,
    }
}

/// Extra penalties for value pairs that fare worse together than their
/// individual offsets predict.
const INTERACTIONS: &[(&str, &str, f64)] = &[
    ("Female", "Black", -0.07),
    ("Female", "Hispanic", -0.05),
    ("Non-binary", "Under 25", -0.03),
    ("Black", "Low", -0.06),
    ("Hispanic", "Low", -0.04),
    ("Black", "Yes", -0.05),
    ("Under 25", "Low", -0.05),
    ("Over 60", "Yes", -0.04),
    ("Female", "Low", -0.03),
];

/// Interaction offset for a value pair, in either order.
pub fn interaction_offset(a: &str, b: &str) -> f64 {
    INTERACTIONS
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, offset)| *offset)
        .unwrap_or(0.0)
}

fn max_offset(attribute: ProtectedAttribute) -> f64 {
    attribute
        .values()
        .iter()
        .map(|v| value_offset(attribute, v))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Approximate approval rate of the most privileged combination in a pair.
pub fn reference_rate(pair: AttributePair) -> f64 {
    (BASE_APPROVAL_RATE + max_offset(pair.first()) + max_offset(pair.second()))
        .clamp(APPROVAL_BOUNDS.0, APPROVAL_BOUNDS.1)
}

/// Deterministic approval rate for one combination.
pub fn combined_approval_rate(
    pair: AttributePair,
    primary_value: &str,
    secondary_value: &str,
) -> f64 {
    let rate = BASE_APPROVAL_RATE
        + value_offset(pair.first(), primary_value)
        + value_offset(pair.second(), secondary_value)
        + interaction_offset(primary_value, secondary_value);
    rate.clamp(APPROVAL_BOUNDS.0, APPROVAL_BOUNDS.1)
}

fn false_positive_rate(approval_rate: f64) -> f64 {
    0.40 - 0.30 * approval_rate
}

fn false_negative_rate(approval_rate: f64) -> f64 {
    0.45 - 0.40 * approval_rate
}

/// Records for every attribute pair, keyed by the canonical unordered pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionalData {
    records: BTreeMap<AttributePair, Vec<IntersectionalRecord>>,
}

impl IntersectionalData {
    /// Records for a pair of attributes, regardless of argument order.
    /// `None` when the pair is missing or both attributes are the same.
    pub fn get(
        &self,
        a: ProtectedAttribute,
        b: ProtectedAttribute,
    ) -> Option<&[IntersectionalRecord]> {
        let pair = AttributePair::new(a, b)?;
        self.records.get(&pair).map(Vec::as_slice)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &AttributePair> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The combination with the lowest disparate impact for a pair.
    pub fn most_disadvantaged(
        &self,
        a: ProtectedAttribute,
        b: ProtectedAttribute,
    ) -> Option<&IntersectionalRecord> {
        self.get(a, b)?
            .iter()
            .min_by(|x, y| x.disparate_impact.total_cmp(&y.disparate_impact))
    }

    /// String-keyed view (`gender_race`, ...) for JSON output.
    pub fn to_keyed_map(&self) -> BTreeMap<String, &[IntersectionalRecord]> {
        self.records
            .iter()
            .map(|(pair, records)| (pair.key(), records.as_slice()))
            .collect()
    }
}

/// Builds intersectional records for all ten attribute pairs.
///
/// Approval rates are deterministic. Noise, when enabled, only perturbs the
/// error rates.
pub fn generate_intersectional_data(noise: &mut Noise) -> IntersectionalData {
    let mut records = BTreeMap::new();

    for pair in AttributePair::all() {
        let reference = reference_rate(pair);
        let mut pair_records = Vec::new();

        for primary in pair.first().values() {
            for secondary in pair.second().values() {
                let approval_rate = combined_approval_rate(pair, primary, secondary);
                let fpr = (false_positive_rate(approval_rate) + noise.sample())
                    .clamp(ERROR_RATE_BOUNDS.0, ERROR_RATE_BOUNDS.1);
                let fnr = (false_negative_rate(approval_rate) + noise.sample())
                    .clamp(ERROR_RATE_BOUNDS.0, ERROR_RATE_BOUNDS.1);

                pair_records.push(IntersectionalRecord {
                    primary_value: primary.to_string(),
                    secondary_value: secondary.to_string(),
                    approval_rate,
                    false_positive_rate: fpr,
                    false_negative_rate: fnr,
                    disparate_impact: approval_rate / reference,
                });
            }
        }

        tracing::debug!(
            pair = %pair.key(),
            records = pair_records.len(),
            reference,
            "Synthesized intersectional records"
        );
        records.insert(pair, pair_records);
    }

    IntersectionalData { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProtectedAttribute::*;

    fn find<'a>(
        records: &'a [IntersectionalRecord],
        primary: &str,
        secondary: &str,
    ) -> &'a IntersectionalRecord {
        records
            .iter()
            .find(|r| r.primary_value == primary && r.secondary_value == secondary)
            .unwrap()
    }

    #[test]
    fn test_all_pairs_present_with_full_cross_product() {
        let data = generate_intersectional_data(&mut Noise::none());
        assert_eq!(data.len(), 10);
        let gender_race = data.get(Gender, Race).unwrap();
        assert_eq!(gender_race.len(), 3 * 5);
        let age_income = data.get(AgeGroup, IncomeLevel).unwrap();
        assert_eq!(age_income.len(), 5 * 3);
    }

    #[test]
    fn test_lookup_is_order_independent() {
        let data = generate_intersectional_data(&mut Noise::none());
        assert_eq!(data.get(Gender, Race), data.get(Race, Gender));
        assert!(data.get(Gender, Gender).is_none());
    }

    #[test]
    fn test_interaction_penalty_applied() {
        let data = generate_intersectional_data(&mut Noise::none());
        let records = data.get(Race, Gender).unwrap();
        let female_black = find(records, "Female", "Black");
        // 0.70 - 0.02 - 0.13 - 0.07
        assert!((female_black.approval_rate - 0.48).abs() < 1e-9);

        let male_white = find(records, "Male", "White");
        assert!((male_white.approval_rate - 0.85).abs() < 1e-9);
        assert!((male_white.disparate_impact - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_within_bounds() {
        let data = generate_intersectional_data(&mut Noise::seeded(3, 0.02));
        for pair in AttributePair::all() {
            for r in data.get(pair.first(), pair.second()).unwrap() {
                assert!((0.10..=0.95).contains(&r.approval_rate));
                assert!((0.05..=0.30).contains(&r.false_positive_rate));
                assert!((0.05..=0.30).contains(&r.false_negative_rate));
                assert!(r.disparate_impact > 0.0 && r.disparate_impact <= 1.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_deterministic_without_noise() {
        let a = generate_intersectional_data(&mut Noise::none());
        let b = generate_intersectional_data(&mut Noise::none());
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_rates_decrease_with_approval() {
        let data = generate_intersectional_data(&mut Noise::none());
        let records = data.get(Gender, IncomeLevel).unwrap();
        let low = find(records, "Non-binary", "Low");
        let high = find(records, "Male", "High");
        assert!(low.approval_rate < high.approval_rate);
        assert!(low.false_negative_rate > high.false_negative_rate);
        assert!(low.false_positive_rate >= high.false_positive_rate);
    }

    #[test]
    fn test_most_disadvantaged() {
        let data = generate_intersectional_data(&mut Noise::none());
        let worst = data.most_disadvantaged(Race, IncomeLevel).unwrap();
        assert_eq!(worst.primary_value, "Black");
        assert_eq!(worst.secondary_value, "Low");
    }

    #[test]
    fn test_keyed_map_uses_canonical_keys() {
        let data = generate_intersectional_data(&mut Noise::none());
        let keyed = data.to_keyed_map();
        assert!(keyed.contains_key("gender_race"));
        assert!(!keyed.contains_key("race_gender"));
    }
}
