//! Dashboard facade: backend calls with local fallbacks.
//!
//! Every backend operation has a local substitute. A failed call is logged
//! at `warn` and the substitute is returned; callers never see the error,
//! only the [`DataSource`] tag on the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::client::{Backend, HttpBackend, OfflineBackend};
use crate::config::DashboardConfig;
use crate::error::{BackendError, Result};
use crate::explanation;
use crate::fairness::{FairnessReport, sample_fairness_report};
use crate::predict::{LoanApplication, Prediction, predict_locally};
use crate::synth::{IntersectionalData, generate_intersectional_data, generate_temporal_data};
use crate::types::{ProtectedAttribute, TemporalRecord};

const LOCAL_ANALYSIS_MESSAGE: &str =
    "Backend unavailable; showing built-in sample fairness metrics";

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Backend,
    Fallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend => write!(f, "backend"),
            Self::Fallback => write!(f, "local fallback"),
        }
    }
}

/// A value tagged with its [`DataSource`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

fn resolve<T>(
    endpoint: &str,
    result: std::result::Result<T, BackendError>,
    fallback: impl FnOnce() -> T,
) -> Sourced<T> {
    match result {
        Ok(value) => Sourced {
            value,
            source: DataSource::Backend,
        },
        Err(BackendError::Disabled) => {
            tracing::debug!(endpoint, "Backend disabled, using local fallback");
            Sourced {
                value: fallback(),
                source: DataSource::Fallback,
            }
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "Backend call failed, using local fallback");
            Sourced {
                value: fallback(),
                source: DataSource::Fallback,
            }
        }
    }
}

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Builds the dashboard, picking an HTTP or offline backend from config.
    pub fn from_config(config: DashboardConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = if config.backend.enabled {
            Arc::new(HttpBackend::new(&config.backend)?)
        } else {
            Arc::new(OfflineBackend)
        };
        tracing::info!(
            backend = backend.name(),
            base_url = %config.backend.base_url,
            "Dashboard initialized"
        );
        Ok(Self { backend, config })
    }

    pub fn with_backend(backend: Arc<dyn Backend>, config: DashboardConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub async fn predict(&self, application: &LoanApplication) -> Sourced<Prediction> {
        let result = self.backend.predict(application).await;
        resolve("/predict", result, || predict_locally(application))
    }

    pub async fn fairness(&self) -> Sourced<FairnessReport> {
        let result = self.backend.fairness().await;
        resolve("/fairness", result, sample_fairness_report)
    }

    pub async fn explain_loan(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
    ) -> Sourced<String> {
        let result = self.backend.explain_loan(application, prediction).await;
        resolve("/explain-loan", result, || {
            explanation::loan_explanation(application, prediction)
        })
    }

    pub async fn explain_bias(&self, report: &FairnessReport) -> Sourced<String> {
        let result = self.backend.explain_bias(report).await;
        resolve("/explain-bias", result, || {
            explanation::bias_explanation(report)
        })
    }

    pub async fn remediation_strategy(&self, report: &FairnessReport) -> Sourced<String> {
        let result = self.backend.remediation_strategy(report).await;
        resolve("/remediation-strategy", result, || {
            explanation::remediation_strategy(report)
        })
    }

    /// PDF decision letter. There is no local renderer, so this is `None`
    /// whenever the backend cannot produce one.
    pub async fn loan_decision_pdf(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
        explanation: &str,
    ) -> Option<Vec<u8>> {
        match self
            .backend
            .loan_decision_pdf(application, prediction, explanation)
            .await
        {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "PDF generation unavailable");
                None
            }
        }
    }

    pub async fn run_analysis(&self) -> Sourced<String> {
        let result = self.backend.run_analysis().await;
        resolve("/run-analysis", result, || LOCAL_ANALYSIS_MESSAGE.to_string())
    }

    /// Synthetic intersectional dataset using the configured noise.
    pub fn intersectional(&self) -> IntersectionalData {
        let mut noise = self.config.synthesis.noise();
        generate_intersectional_data(&mut noise)
    }

    /// Synthetic monthly series ending at `now`, using the configured noise.
    pub fn temporal(&self, now: NaiveDate) -> BTreeMap<ProtectedAttribute, Vec<TemporalRecord>> {
        let mut noise = self.config.synthesis.noise();
        generate_temporal_data(now, &mut noise)
    }
}
