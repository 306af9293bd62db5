//! Core value types shared by the synthesizers, calculators and the backend client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BiasShieldError;

/// A protected attribute tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedAttribute {
    Gender,
    Race,
    AgeGroup,
    IncomeLevel,
    DisabilityStatus,
}

impl ProtectedAttribute {
    /// Every attribute, in canonical order.
    pub const ALL: [ProtectedAttribute; 5] = [
        ProtectedAttribute::Gender,
        ProtectedAttribute::Race,
        ProtectedAttribute::AgeGroup,
        ProtectedAttribute::IncomeLevel,
        ProtectedAttribute::DisabilityStatus,
    ];

    /// The fixed value enumeration for this attribute.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            Self::Gender => &["Male", "Female", "Non-binary"],
            Self::Race => &["White", "Black", "Asian", "Hispanic", "Other"],
            Self::AgeGroup => &["Under 25", "25-34", "35-44", "45-60", "Over 60"],
            Self::IncomeLevel => &["Low", "Medium", "High"],
            Self::DisabilityStatus => &["Yes", "No"],
        }
    }

    /// Wire name, e.g. `age_group`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Race => "race",
            Self::AgeGroup => "age_group",
            Self::IncomeLevel => "income_level",
            Self::DisabilityStatus => "disability_status",
        }
    }

    /// Human-readable label, e.g. `Age Group`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gender => "Gender",
            Self::Race => "Race",
            Self::AgeGroup => "Age Group",
            Self::IncomeLevel => "Income Level",
            Self::DisabilityStatus => "Disability Status",
        }
    }
}

impl fmt::Display for ProtectedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectedAttribute {
    type Err = BiasShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "gender" => Ok(Self::Gender),
            "race" => Ok(Self::Race),
            "age_group" | "age" => Ok(Self::AgeGroup),
            "income_level" | "income" => Ok(Self::IncomeLevel),
            "disability_status" | "disability" => Ok(Self::DisabilityStatus),
            _ => Err(BiasShieldError::invalid_input(format!(
                "unknown protected attribute '{}'",
                s
            ))),
        }
    }
}

/// Unordered pair of two distinct protected attributes.
///
/// The two attributes are stored sorted, so `(race, gender)` and
/// `(gender, race)` produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributePair {
    first: ProtectedAttribute,
    second: ProtectedAttribute,
}

impl AttributePair {
    /// Returns `None` when both attributes are the same.
    pub fn new(a: ProtectedAttribute, b: ProtectedAttribute) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> ProtectedAttribute {
        self.first
    }

    pub fn second(&self) -> ProtectedAttribute {
        self.second
    }

    /// All ten unordered pairs of distinct attributes.
    pub fn all() -> Vec<AttributePair> {
        let attrs = ProtectedAttribute::ALL;
        let mut pairs = Vec::with_capacity(10);
        for (i, a) in attrs.iter().enumerate() {
            for b in &attrs[i + 1..] {
                pairs.extend(Self::new(*a, *b));
            }
        }
        pairs
    }

    /// Canonical string key, e.g. `gender_race`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.first, self.second)
    }
}

impl fmt::Display for AttributePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.first.label(), self.second.label())
    }
}

/// Outcome rates for one group of one attribute.
///
/// Error rates are `None` when their denominator is zero, e.g. a group with
/// no negative ground-truth cases has no defined false positive rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub approval_rate: f64,
    pub false_positive_rate: Option<f64>,
    pub false_negative_rate: Option<f64>,
    pub count: usize,
}

/// Per-group metrics for a single protected attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBiasSummary {
    pub attribute: Option<ProtectedAttribute>,
    pub groups: BTreeMap<String, GroupMetrics>,
}

impl AttributeBiasSummary {
    pub fn new(attribute: ProtectedAttribute, groups: BTreeMap<String, GroupMetrics>) -> Self {
        Self {
            attribute: Some(attribute),
            groups,
        }
    }

    /// Group names and approval rates in map order.
    pub fn approval_rates(&self) -> Vec<(String, f64)> {
        self.groups
            .iter()
            .map(|(name, m)| (name.clone(), m.approval_rate))
            .collect()
    }

    /// Max-minus-min disparities, recomputed from the current groups.
    pub fn disparity(&self) -> AttributeDisparity {
        crate::aggregate::compute_attribute_disparity(&self.groups)
    }
}

/// Max-minus-min spread of each rate across the groups of one attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDisparity {
    pub approval_disparity: f64,
    pub fp_disparity: f64,
    pub fn_disparity: f64,
}

/// One combination of values from two protected attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionalRecord {
    pub primary_value: String,
    pub secondary_value: String,
    pub approval_rate: f64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,
    pub disparate_impact: f64,
}

impl IntersectionalRecord {
    /// Display label, e.g. `Female + Black`.
    pub fn label(&self) -> String {
        format!("{} + {}", self.primary_value, self.secondary_value)
    }
}

/// Fairness metrics for one attribute in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalRecord {
    /// First day of the month.
    pub date: NaiveDate,
    pub approval_disparity: f64,
    pub false_positive_disparity: f64,
    pub false_negative_disparity: f64,
    pub demographic_parity: f64,
    pub equalized_odds: f64,
}

/// Renders an optional rate as a percentage, or `N/A` when undefined.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) if r.is_finite() => format!("{:.1}%", r * 100.0),
        _ => "N/A".to_string(),
    }
}
