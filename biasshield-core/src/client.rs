//! HTTP client for the prediction backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::fairness::FairnessReport;
use crate::predict::{LoanApplication, Prediction};

/// Operations offered by the prediction backend.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, application: &LoanApplication) -> Result<Prediction, BackendError>;

    async fn fairness(&self) -> Result<FairnessReport, BackendError>;

    async fn explain_loan(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
    ) -> Result<String, BackendError>;

    async fn explain_bias(&self, report: &FairnessReport) -> Result<String, BackendError>;

    async fn remediation_strategy(&self, report: &FairnessReport) -> Result<String, BackendError>;

    async fn loan_decision_pdf(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
        explanation: &str,
    ) -> Result<Vec<u8>, BackendError>;

    async fn run_analysis(&self) -> Result<String, BackendError>;
}

#[derive(Debug, Deserialize)]
struct ExplanationResponse {
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct LoanExplanationRequest<'a> {
    application: &'a LoanApplication,
    prediction: &'a Prediction,
}

#[derive(Serialize)]
struct LoanPdfRequest<'a> {
    application: &'a LoanApplication,
    prediction: &'a Prediction,
    explanation: &'a str,
}

/// Backend reached over HTTP with JSON bodies.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("BiasShield/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| BackendError::Request {
                endpoint: "client".to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        tracing::debug!(endpoint, "Calling backend");
        let response = request
            .send()
            .await
            .map_err(|source| BackendError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        response.json().await.map_err(|e| BackendError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, BackendError> {
        let response = self.send(endpoint, self.client.get(self.url(endpoint))).await?;
        Self::decode(endpoint, response).await
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(endpoint)).json(body);
        let response = self.send(endpoint, request).await?;
        Self::decode(endpoint, response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn predict(&self, application: &LoanApplication) -> Result<Prediction, BackendError> {
        self.post_json("/predict", application).await
    }

    async fn fairness(&self) -> Result<FairnessReport, BackendError> {
        self.get_json("/fairness").await
    }

    async fn explain_loan(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
    ) -> Result<String, BackendError> {
        let body = LoanExplanationRequest {
            application,
            prediction,
        };
        let response: ExplanationResponse = self.post_json("/explain-loan", &body).await?;
        Ok(response.explanation)
    }

    async fn explain_bias(&self, report: &FairnessReport) -> Result<String, BackendError> {
        let response: ExplanationResponse = self.post_json("/explain-bias", report).await?;
        Ok(response.explanation)
    }

    async fn remediation_strategy(&self, report: &FairnessReport) -> Result<String, BackendError> {
        let response: ExplanationResponse =
            self.post_json("/remediation-strategy", report).await?;
        Ok(response.explanation)
    }

    async fn loan_decision_pdf(
        &self,
        application: &LoanApplication,
        prediction: &Prediction,
        explanation: &str,
    ) -> Result<Vec<u8>, BackendError> {
        let endpoint = "/loan-decision-pdf";
        let body = LoanPdfRequest {
            application,
            prediction,
            explanation,
        };
        let response = self
            .send(endpoint, self.client.post(self.url(endpoint)).json(&body))
            .await?;
        let bytes = response.bytes().await.map_err(|e| BackendError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    async fn run_analysis(&self) -> Result<String, BackendError> {
        let endpoint = "/run-analysis";
        let response = self.send(endpoint, self.client.post(self.url(endpoint))).await?;
        let body: MessageResponse = Self::decode(endpoint, response).await?;
        Ok(body.message)
    }
}

/// Backend used when the configuration disables remote calls. Every
/// operation fails with [`BackendError::Disabled`].
pub struct OfflineBackend;

#[async_trait]
impl Backend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn predict(&self, _application: &LoanApplication) -> Result<Prediction, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn fairness(&self) -> Result<FairnessReport, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn explain_loan(
        &self,
        _application: &LoanApplication,
        _prediction: &Prediction,
    ) -> Result<String, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn explain_bias(&self, _report: &FairnessReport) -> Result<String, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn remediation_strategy(&self, _report: &FairnessReport) -> Result<String, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn loan_decision_pdf(
        &self,
        _application: &LoanApplication,
        _prediction: &Prediction,
        _explanation: &str,
    ) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Disabled)
    }

    async fn run_analysis(&self) -> Result<String, BackendError> {
        Err(BackendError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:8000/".into(),
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/fairness"), "http://localhost:8000/fairness");
    }

    #[tokio::test]
    async fn test_offline_backend_always_fails() {
        let backend = OfflineBackend;
        assert!(matches!(
            backend.fairness().await,
            Err(BackendError::Disabled)
        ));
        assert!(matches!(
            backend.run_analysis().await,
            Err(BackendError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_request_error() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            enabled: true,
        })
        .unwrap();
        let err = backend.fairness().await.unwrap_err();
        assert!(matches!(err, BackendError::Request { ref endpoint, .. } if endpoint == "/fairness"));
    }
}
