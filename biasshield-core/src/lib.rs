//! # BiasShield Core
//!
//! Core library for the BiasShield loan-approval fairness dashboard.
//! Provides synthetic intersectional and temporal fairness metrics, group
//! disparity calculation, a remediation simulator, trend analysis, and a
//! backend client that falls back to local substitutes when the prediction
//! service is unreachable.

pub mod aggregate;
pub mod calendar;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod explanation;
pub mod fairness;
pub mod predict;
pub mod remediation;
pub mod synth;
pub mod trend;
pub mod types;

// Re-export commonly used types at the crate root.
pub use aggregate::{
    OutcomeRecord, compute_attribute_disparity, compute_disparate_impact, compute_group_metrics,
};
pub use client::{Backend, HttpBackend, OfflineBackend};
pub use config::{BackendConfig, DashboardConfig, SynthesisConfig, TrendConfig, load_config};
pub use dashboard::{Dashboard, DataSource, Sourced};
pub use error::{BackendError, BiasShieldError, Result};
pub use fairness::{BiasMetrics, FairnessReport, sample_fairness_report};
pub use predict::{LoanApplication, Prediction, predict_locally};
pub use remediation::{
    RemediationResult, RemediationSession, RemediationState, RemediationStrategy,
    apply_remediation, calculate_improvement, get_remediation_suggestions,
};
pub use synth::{IntersectionalData, Noise, generate_intersectional_data, generate_temporal_data};
pub use trend::{
    MetricField, TimeRange, Trend, TrendAnalysis, analyze_trend, filter_by_time_range,
    moving_average, volatility,
};
pub use types::{
    AttributeBiasSummary, AttributeDisparity, AttributePair, GroupMetrics, IntersectionalRecord,
    ProtectedAttribute, TemporalRecord,
};
