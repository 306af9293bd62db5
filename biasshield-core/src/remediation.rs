//! Remediation simulator.
//!
//! Applies a simple per-group adjustment toward the privileged group's rate to
//! preview how a mitigation strategy might narrow a disparity. These are
//! illustrative linear and multiplicative adjustments, not implementations of
//! the mitigation algorithms they are named after.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BiasShieldError;
use crate::types::AttributeDisparity;

/// Disparity above which a field gets a targeted suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.05;

/// Floor applied to a group's rate before computing a reweighing ratio.
const REWEIGHING_FLOOR: f64 = 0.001;

/// Extra pull applied by the adversarial and representation strategies.
const AGGRESSIVE_FACTOR: f64 = 1.2;

/// Mitigation strategy to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStrategy {
    ThresholdOptimization,
    Reweighing,
    AdversarialDebiasing,
    FairRepresentations,
}

impl RemediationStrategy {
    pub const ALL: [RemediationStrategy; 4] = [
        RemediationStrategy::ThresholdOptimization,
        RemediationStrategy::Reweighing,
        RemediationStrategy::AdversarialDebiasing,
        RemediationStrategy::FairRepresentations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThresholdOptimization => "threshold_optimization",
            Self::Reweighing => "reweighing",
            Self::AdversarialDebiasing => "adversarial_debiasing",
            Self::FairRepresentations => "fair_representations",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ThresholdOptimization => {
                "Adjusts decision thresholds per group to equalize approval rates"
            }
            Self::Reweighing => "Reweights training samples so each group carries equal influence",
            Self::AdversarialDebiasing => {
                "Trains against an adversary that tries to predict the protected attribute"
            }
            Self::FairRepresentations => {
                "Learns a representation that hides the protected attribute"
            }
        }
    }

    fn adjust(self, value: f64, privileged: f64, strength: f64) -> f64 {
        match self {
            // Interpolation form: exact at both s = 0 and s = 1.
            Self::ThresholdOptimization => value * (1.0 - strength) + privileged * strength,
            Self::Reweighing => {
                let ratio = privileged / value.max(REWEIGHING_FLOOR);
                value * (1.0 + (ratio - 1.0) * strength)
            }
            Self::AdversarialDebiasing | Self::FairRepresentations => {
                value + (privileged - value) * strength * AGGRESSIVE_FACTOR
            }
        }
    }
}

impl fmt::Display for RemediationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemediationStrategy {
    type Err = BiasShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "threshold_optimization" | "threshold" => Ok(Self::ThresholdOptimization),
            "reweighing" => Ok(Self::Reweighing),
            "adversarial_debiasing" | "adversarial" => Ok(Self::AdversarialDebiasing),
            "fair_representations" | "representations" => Ok(Self::FairRepresentations),
            _ => Err(BiasShieldError::invalid_input(format!(
                "unknown remediation strategy '{}'",
                s
            ))),
        }
    }
}

/// Index of the first maximum value.
fn privileged_index(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn normalize_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    }
}

/// Moves every non-privileged value toward the privileged (largest) value.
///
/// The privileged value is left as is. Strength is clamped into `[0, 1]` and
/// every output is clamped into `[0, 1]`. At strength 1 threshold optimization
/// equalizes all groups; reweighing and the aggressive strategies do not
/// generally land exactly on the privileged value.
pub fn apply_remediation(values: &[f64], strategy: RemediationStrategy, strength: f64) -> Vec<f64> {
    let Some(privileged) = privileged_index(values) else {
        return Vec::new();
    };
    let strength = normalize_strength(strength);
    let privileged_value = values[privileged];

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let adjusted = if i == privileged {
                v
            } else {
                strategy.adjust(v, privileged_value, strength)
            };
            adjusted.clamp(0.0, 1.0)
        })
        .collect()
}

fn spread(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Percent reduction in max-minus-min spread. Zero when the original spread
/// is zero.
pub fn calculate_improvement(original: &[f64], remediated: &[f64]) -> f64 {
    let original_spread = spread(original);
    if original_spread == 0.0 {
        return 0.0;
    }
    (original_spread - spread(remediated)) / original_spread * 100.0
}

/// Outcome of one simulated remediation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationResult {
    pub original_values: Vec<f64>,
    pub remediated_values: Vec<f64>,
    pub strategy: RemediationStrategy,
    pub strength: f64,
    pub improvement_percent: f64,
}

/// Runs the remediation and measures its improvement.
pub fn simulate(values: &[f64], strategy: RemediationStrategy, strength: f64) -> RemediationResult {
    let remediated_values = apply_remediation(values, strategy, strength);
    let improvement_percent = calculate_improvement(values, &remediated_values);
    tracing::debug!(
        %strategy,
        strength,
        improvement_percent,
        "Simulated remediation"
    );
    RemediationResult {
        original_values: values.to_vec(),
        remediated_values,
        strategy,
        strength: normalize_strength(strength),
        improvement_percent,
    }
}

/// Suggestions for the disparities of one attribute.
///
/// Targeted suggestions come first in approval, false positive, false
/// negative order, followed by two general ones.
pub fn get_remediation_suggestions(disparity: &AttributeDisparity) -> Vec<String> {
    let mut suggestions = Vec::new();

    if disparity.approval_disparity > SUGGESTION_THRESHOLD {
        suggestions.push(format!(
            "Approval rates differ by {:.1} percentage points; consider threshold optimization \
             to equalize approval rates across groups.",
            disparity.approval_disparity * 100.0
        ));
    }
    if disparity.fp_disparity > SUGGESTION_THRESHOLD {
        suggestions.push(format!(
            "False positive rates differ by {:.1} percentage points; apply equalized odds \
             post-processing to balance false approvals.",
            disparity.fp_disparity * 100.0
        ));
    }
    if disparity.fn_disparity > SUGGESTION_THRESHOLD {
        suggestions.push(format!(
            "False negative rates differ by {:.1} percentage points; reweigh training data so \
             qualified applicants in every group are represented.",
            disparity.fn_disparity * 100.0
        ));
    }

    suggestions.push(
        "Review features correlated with protected attributes for proxy bias.".to_string(),
    );
    suggestions.push(
        "Monitor fairness metrics continuously and audit after each model update.".to_string(),
    );
    suggestions
}

/// Whether the session currently shows baseline or adjusted values.
#[derive(Debug, Clone, PartialEq)]
pub enum RemediationState {
    Original,
    Remediated(RemediationResult),
}

/// Baseline group rates with an optional applied remediation.
///
/// Transitions happen only through [`apply`](Self::apply) and
/// [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct RemediationSession {
    groups: Vec<String>,
    baseline: Vec<f64>,
    state: RemediationState,
}

impl RemediationSession {
    pub fn new(groups: Vec<(String, f64)>) -> Self {
        let (groups, baseline) = groups.into_iter().unzip();
        Self {
            groups,
            baseline,
            state: RemediationState::Original,
        }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn state(&self) -> &RemediationState {
        &self.state
    }

    pub fn is_remediated(&self) -> bool {
        matches!(self.state, RemediationState::Remediated(_))
    }

    /// Applies a strategy to the baseline, replacing any earlier remediation.
    pub fn apply(&mut self, strategy: RemediationStrategy, strength: f64) -> RemediationResult {
        let result = simulate(&self.baseline, strategy, strength);
        self.state = RemediationState::Remediated(result.clone());
        result
    }

    pub fn reset(&mut self) {
        self.state = RemediationState::Original;
    }

    /// Values currently on display.
    pub fn current_values(&self) -> &[f64] {
        match &self.state {
            RemediationState::Original => &self.baseline,
            RemediationState::Remediated(result) => &result.remediated_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reweighing_scenario() {
        let out = apply_remediation(&[0.80, 0.60], RemediationStrategy::Reweighing, 0.5);
        assert_eq!(out[0], 0.80);
        assert!(approx(out[1], 0.70));
    }

    #[test]
    fn test_threshold_full_strength_equalizes() {
        let values = [0.9, 0.42, 0.66, 0.13];
        let out = apply_remediation(&values, RemediationStrategy::ThresholdOptimization, 1.0);
        assert!(out.iter().all(|&v| v == 0.9));
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let values = [0.3, 0.75, 0.5];
        for strategy in RemediationStrategy::ALL {
            let out = apply_remediation(&values, strategy, 0.0);
            for (a, b) in out.iter().zip(&values) {
                assert!(approx(*a, *b), "{strategy}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_aggressive_strategies_overshoot_and_clamp() {
        let out = apply_remediation(&[0.9, 0.5], RemediationStrategy::AdversarialDebiasing, 1.0);
        // 0.5 + 0.4 * 1.2 = 0.98
        assert!(approx(out[1], 0.98));
        let clamped =
            apply_remediation(&[0.99, 0.1], RemediationStrategy::FairRepresentations, 1.0);
        assert_eq!(clamped[1], 1.0);
    }

    #[test]
    fn test_first_max_is_privileged() {
        let out = apply_remediation(&[0.7, 0.7, 0.5], RemediationStrategy::Reweighing, 1.0);
        assert_eq!(out[0], 0.7);
        assert!(approx(out[1], 0.7));
    }

    #[test]
    fn test_out_of_range_strength_is_clamped() {
        let values = [0.8, 0.4];
        assert_eq!(
            apply_remediation(&values, RemediationStrategy::ThresholdOptimization, 5.0),
            apply_remediation(&values, RemediationStrategy::ThresholdOptimization, 1.0)
        );
        assert_eq!(
            apply_remediation(&values, RemediationStrategy::ThresholdOptimization, f64::NAN),
            values.to_vec()
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(apply_remediation(&[], RemediationStrategy::Reweighing, 0.5).is_empty());
        assert_eq!(calculate_improvement(&[], &[]), 0.0);
    }

    #[test]
    fn test_improvement() {
        assert_eq!(calculate_improvement(&[0.8, 0.6], &[0.8, 0.6]), 0.0);
        assert!(approx(calculate_improvement(&[0.8, 0.6], &[0.8, 0.7]), 50.0));
        assert_eq!(calculate_improvement(&[0.5, 0.5], &[0.9, 0.1]), 0.0);
    }

    #[test]
    fn test_suggestions_order() {
        let s = get_remediation_suggestions(&AttributeDisparity {
            approval_disparity: 0.13,
            fp_disparity: 0.02,
            fn_disparity: 0.10,
        });
        assert_eq!(s.len(), 4);
        assert!(s[0].contains("Approval rates"));
        assert!(s[1].contains("False negative"));
        assert!(s[2].contains("proxy bias"));
        assert!(s[3].contains("Monitor"));
    }

    #[test]
    fn test_suggestions_threshold_is_strict() {
        let s = get_remediation_suggestions(&AttributeDisparity {
            approval_disparity: 0.05,
            fp_disparity: 0.0,
            fn_disparity: 0.0,
        });
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "threshold-optimization".parse::<RemediationStrategy>().unwrap(),
            RemediationStrategy::ThresholdOptimization
        );
        assert_eq!(
            "Fair Representations".parse::<RemediationStrategy>().unwrap(),
            RemediationStrategy::FairRepresentations
        );
        assert!("magic".parse::<RemediationStrategy>().is_err());
        assert_eq!(RemediationStrategy::Reweighing.to_string(), "reweighing");
    }

    #[test]
    fn test_session_transitions() {
        let mut session = RemediationSession::new(vec![
            ("Male".to_string(), 0.72),
            ("Female".to_string(), 0.64),
        ]);
        assert!(!session.is_remediated());
        assert_eq!(session.current_values(), &[0.72, 0.64]);

        let improvement = session
            .apply(RemediationStrategy::ThresholdOptimization, 1.0)
            .improvement_percent;
        assert!(approx(improvement, 100.0));
        assert!(session.is_remediated());
        assert_eq!(session.current_values(), &[0.72, 0.72]);

        session.reset();
        assert_eq!(session.state(), &RemediationState::Original);
        assert_eq!(session.current_values(), session.baseline());
    }
}
