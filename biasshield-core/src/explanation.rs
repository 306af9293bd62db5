//! Template-based natural-language reports.
//!
//! These render the same letters and reports the backend produces for
//! `/explain-loan`, `/explain-bias` and `/remediation-strategy`, so the
//! dashboard can still show them when the backend is down.

use crate::fairness::{BiasMetrics, FairnessReport};
use crate::predict::{LoanApplication, Prediction};

/// Disparity, in percentage points, above which bias is rated high.
const HIGH_BIAS_POINTS: f64 = 10.0;
/// Disparity, in percentage points, above which bias is rated moderate and
/// flagged as a regulatory concern.
const MODERATE_BIAS_POINTS: f64 = 5.0;

/// Overall severity of the disparities in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasLevel {
    Low,
    Moderate,
    High,
}

impl BiasLevel {
    pub fn from_points(max_disparity_points: f64) -> Self {
        if max_disparity_points > HIGH_BIAS_POINTS {
            Self::High
        } else if max_disparity_points > MODERATE_BIAS_POINTS {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

fn title_case(feature: &str) -> String {
    feature
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `$1,234,567.89`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Decision letter for a single application.
pub fn loan_explanation(application: &LoanApplication, prediction: &Prediction) -> String {
    let probability = prediction.approval_probability * 100.0;
    let mut message = String::new();

    if prediction.approved {
        message.push_str(&format!(
            "We are pleased to inform you that your loan application has been approved with an \
             approval probability of {probability:.1}%. Our BiasShield system has carefully \
             evaluated your application, taking into account various factors that contribute to \
             your creditworthiness.\n\nThe key factors that positively influenced this decision \
             include:\n"
        ));
        for (factor, impact) in prediction.top_factors(3) {
            message.push_str(&format!(
                "- {}: This factor had a {:.1}% impact on your approval\n",
                title_case(factor),
                impact * 100.0
            ));
        }
        message.push_str(&format!(
            "\nYour credit score of {} and income of {} demonstrate financial stability, which \
             are important indicators of your ability to repay the loan.\n\n",
            application.credit_score,
            format_currency(application.income)
        ));
        message.push_str(
            "Recommendations:\n\
             1. Maintain your current credit score by making timely payments\n\
             2. Consider setting up automatic payments to avoid any missed deadlines\n\
             3. Review your loan terms carefully before proceeding\n\n\
             Thank you for choosing our services. If you have any questions about your approval \
             or the next steps, please don't hesitate to contact our customer service team.\n",
        );
    } else {
        message.push_str(&format!(
            "We regret to inform you that your loan application has not been approved at this \
             time. Our BiasShield system has carefully evaluated your application and determined \
             that it does not meet our current lending criteria. The decision was made with an \
             approval probability of {probability:.1}%.\n\nThe key factors that influenced this \
             decision include:\n"
        ));
        for (factor, impact) in prediction.top_factors(3) {
            message.push_str(&format!(
                "- {}: This factor had a {:.1}% impact on the decision\n",
                title_case(factor),
                impact * 100.0
            ));
        }
        message.push_str(
            "\nRecommendations to improve your future applications:\n\
             1. Work on improving your credit score through timely bill payments\n\
             2. Reduce existing debt before applying for new credit\n\
             3. Consider applying for a smaller loan amount relative to your income\n\
             4. Wait 3-6 months before reapplying to allow time for credit improvements\n\n\
             We encourage you to review your credit report for any inaccuracies. If you believe \
             this decision was made in error, you can request a detailed explanation of the \
             decision.\n",
        );
    }

    message.push_str("\nBiasShield Decision System\n");
    message
}

/// Attribute labels and approval disparities in percentage points, largest
/// magnitude first.
fn sorted_disparities(report: &FairnessReport) -> Vec<(&'static str, f64, &BiasMetrics)> {
    let mut disparities: Vec<_> = report
        .attributes()
        .into_iter()
        .map(|(attr, m)| (attr.label(), m.approval_disparity * 100.0, m))
        .collect();
    disparities.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    disparities
}

/// Markdown bias analysis of a fairness report.
pub fn bias_explanation(report: &FairnessReport) -> String {
    let disparities = sorted_disparities(report);
    let max_points = disparities.first().map(|d| d.1.abs()).unwrap_or(0.0);
    let level = BiasLevel::from_points(max_points);

    let mut message = String::from("## Bias Analysis Report\n\n### Summary of Findings\n\n");
    message.push_str(match level {
        BiasLevel::High => {
            "**High Bias Alert**: Significant disparities detected in approval rates across \
             protected attributes.\n\n"
        }
        BiasLevel::Moderate => {
            "**Moderate Bias Alert**: Some disparities detected in approval rates across \
             protected attributes.\n\n"
        }
        BiasLevel::Low => {
            "**Low Bias Alert**: Minimal disparities detected in approval rates across \
             protected attributes.\n\n"
        }
    });

    message.push_str("### Detailed Analysis\n\n");
    for (label, points, metrics) in &disparities {
        message.push_str(&format!("**{label}**:\n"));
        message.push_str(&format!("- Approval rate disparity: {points:.1}%\n"));
        if let Some((group, rate)) = metrics.highest_approval() {
            message.push_str(&format!(
                "- Highest approval rate: {group} ({:.1}%)\n",
                rate * 100.0
            ));
        }
        if let Some((group, rate)) = metrics.lowest_approval() {
            message.push_str(&format!(
                "- Lowest approval rate: {group} ({:.1}%)\n",
                rate * 100.0
            ));
        }
        if points.abs() > MODERATE_BIAS_POINTS {
            message.push_str(
                "- **Regulatory concern**: This disparity exceeds the typical 5% threshold for \
                 regulatory scrutiny.\n",
            );
        }
        message.push('\n');
    }

    message.push_str("### Conclusion\n\n");
    message.push_str(match level {
        BiasLevel::High => {
            "The model shows significant bias that requires immediate attention. Implementing \
             bias mitigation techniques is strongly recommended before deploying this model in \
             production.\n"
        }
        BiasLevel::Moderate => {
            "The model shows moderate bias that should be addressed. Consider implementing bias \
             mitigation techniques to improve fairness before full deployment.\n"
        }
        BiasLevel::Low => {
            "The model shows acceptable levels of bias, but continuous monitoring is recommended \
             to ensure fairness is maintained over time.\n"
        }
    });
    message
}

/// Markdown remediation plan focused on the most biased attribute.
pub fn remediation_strategy(report: &FairnessReport) -> String {
    let (most_biased, _) = report.most_biased();

    let mut message = String::from("## Bias Remediation Strategy\n\n### Technical Strategies\n\n");
    message.push_str(&format!(
        "1. **Fairness Constraints**:\n\
         \x20  - Implement Demographic Parity constraints during model training\n\
         \x20  - Apply Equalized Odds constraints to balance error rates across groups\n\
         \x20  - Focus particularly on {} fairness, which shows the highest disparity\n\n",
        most_biased.label()
    ));
    message.push_str(
        "2. **Data Rebalancing**:\n\
         \x20  - Apply instance weighting to compensate for underrepresented groups\n\
         \x20  - Use reweighing techniques from the AIF360 toolkit\n\
         \x20  - Consider synthetic data generation for minority groups\n\n\
         3. **Model Adjustments**:\n\
         \x20  - Optimize classification thresholds separately for each demographic group\n\
         \x20  - Implement adversarial debiasing techniques\n\
         \x20  - Consider ensemble methods that combine multiple fair classifiers\n\n\
         ### Feature Engineering Approaches\n\n\
         1. **Feature Selection**:\n\
         \x20  - Remove or reduce weight of features highly correlated with protected attributes\n\
         \x20  - Identify and eliminate proxy variables that may encode bias\n\n\
         2. **Feature Transformation**:\n\
         \x20  - Apply fairness-aware feature transformations\n\
         \x20  - Develop composite features that are less correlated with protected attributes\n\n\
         ### Policy Recommendations\n\n\
         1. **Process Changes**:\n\
         \x20  - Implement a second-level review for rejected applications from protected groups\n\
         \x20  - Establish clear documentation requirements for all lending decisions\n\n\
         2. **Monitoring Framework**:\n\
         \x20  - Set up continuous monitoring of approval rates across demographic groups\n\
         \x20  - Establish disparity thresholds that trigger automatic reviews\n\
         \x20  - Conduct regular fairness audits with detailed reporting\n\n\
         ### Implementation Considerations\n\n\
         1. **Performance Tradeoffs**:\n\
         \x20  - Some fairness constraints may slightly reduce overall model accuracy\n\
         \x20  - Establish acceptable thresholds for both fairness and performance\n\n\
         2. **Regulatory Compliance**:\n\
         \x20  - Document all bias mitigation efforts for regulatory review\n\
         \x20  - Ensure compliance with ECOA, FHA, and FCRA requirements\n\
         \x20  - Prepare explanations for any remaining disparities\n\n\
         3. **Validation Approach**:\n\
         \x20  - Test remediation strategies on historical data before implementation\n\
         \x20  - Use A/B testing to validate improvements in fairness metrics\n\
         \x20  - Establish a feedback loop for continuous improvement\n",
    );
    message
}
