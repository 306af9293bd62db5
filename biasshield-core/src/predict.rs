//! Loan application types and the rule-based fallback predictor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const MIN_CREDIT_SCORE: u32 = 600;
const MIN_INCOME: f64 = 50_000.0;
const MAX_LOAN_TO_INCOME: f64 = 3.0;

/// A single loan application, in the backend's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub gender: String,
    pub race: String,
    pub age: u32,
    pub income: f64,
    pub credit_score: u32,
    pub loan_amount: f64,
    pub employment_type: String,
    pub education_level: String,
    pub citizenship_status: String,
    pub language_proficiency: String,
    pub disability_status: String,
    pub criminal_record: String,
    pub zip_code_group: String,
}

impl LoanApplication {
    /// Age band used by the fairness report.
    pub fn age_group(&self) -> &'static str {
        age_group(self.age)
    }
}

impl Default for LoanApplication {
    fn default() -> Self {
        Self {
            gender: "Female".into(),
            race: "White".into(),
            age: 35,
            income: 65_000.0,
            credit_score: 700,
            loan_amount: 150_000.0,
            employment_type: "Full-time".into(),
            education_level: "Bachelor's".into(),
            citizenship_status: "Citizen".into(),
            language_proficiency: "Fluent".into(),
            disability_status: "No".into(),
            criminal_record: "No".into(),
            zip_code_group: "Urban".into(),
        }
    }
}

/// Approval decision with per-feature importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub approved: bool,
    pub approval_probability: f64,
    pub explanation: BTreeMap<String, f64>,
}

impl Prediction {
    /// The `n` most important features, largest first.
    pub fn top_factors(&self, n: usize) -> Vec<(&str, f64)> {
        let mut factors: Vec<(&str, f64)> = self
            .explanation
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        factors.sort_by(|a, b| b.1.total_cmp(&a.1));
        factors.truncate(n);
        factors
    }
}

/// `Under 25`, `25-60` or `Over 60`.
pub fn age_group(age: u32) -> &'static str {
    match age {
        0..=25 => "Under 25",
        26..=60 => "25-60",
        _ => "Over 60",
    }
}

/// Static feature importances reported alongside local decisions.
fn feature_importance() -> BTreeMap<String, f64> {
    [
        ("credit_score", 0.40),
        ("income", 0.30),
        ("loan_amount", 0.20),
        ("age", 0.05),
        ("gender", 0.03),
        ("race", 0.02),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Approves when the credit score, income and loan-to-income ratio all pass.
pub fn predict_locally(application: &LoanApplication) -> Prediction {
    let approved = application.credit_score >= MIN_CREDIT_SCORE
        && application.income >= MIN_INCOME
        && application.loan_amount <= application.income * MAX_LOAN_TO_INCOME;

    Prediction {
        approved,
        approval_probability: if approved { 0.8 } else { 0.2 },
        explanation: feature_importance(),
    }
}
