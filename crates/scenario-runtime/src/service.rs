//! Calculation service port and its adapters.

use reqwest::{Client, StatusCode};
use scenario_core::{ScenarioInput, ScenarioResult};
use std::future::Future;
use thiserror::Error;
use unit_econ::EconError;

/// Turns a scenario input into its profitability result.
pub trait CalculationService: Send + Sync + 'static {
    fn calculate(
        &self,
        input: ScenarioInput,
    ) -> impl Future<Output = Result<ScenarioResult, CalculationError>> + Send;
}

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("input rejected: {0}")]
    Rejected(#[from] EconError),
    #[error("client build failed: {0}")]
    BuildClient(String),
    #[error("http request failed: {0}")]
    Http(String),
    #[error("http status {code}: {message}")]
    HttpStatus { code: u16, message: String },
    #[error("decode response failed: {0}")]
    DecodeResponse(String),
}

/// Evaluates scenarios in-process with the `unit-econ` model.
#[derive(Clone, Debug, Default)]
pub struct LocalCalculationService;

impl CalculationService for LocalCalculationService {
    fn calculate(
        &self,
        input: ScenarioInput,
    ) -> impl Future<Output = Result<ScenarioResult, CalculationError>> + Send {
        std::future::ready(unit_econ::simulate(&input).map_err(CalculationError::from))
    }
}

/// Remote `/simulate` endpoint speaking JSON over HTTP.
///
/// No timeout is configured: a request, once issued, runs to completion.
#[derive(Clone, Debug)]
pub struct HttpCalculationService {
    url: String,
    client: Client,
}

impl HttpCalculationService {
    pub fn new(base_url: &str) -> Result<Self, CalculationError> {
        let client = Client::builder()
            .build()
            .map_err(|e| CalculationError::BuildClient(e.to_string()))?;
        Ok(Self {
            url: format!("{}/simulate", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CalculationService for HttpCalculationService {
    fn calculate(
        &self,
        input: ScenarioInput,
    ) -> impl Future<Output = Result<ScenarioResult, CalculationError>> + Send {
        let request = self.client.post(&self.url).json(&input);
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| CalculationError::Http(e.to_string()))?;
            let status = response.status();
            if status != StatusCode::OK {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                return Err(CalculationError::HttpStatus {
                    code: status.as_u16(),
                    message,
                });
            }
            response
                .json::<ScenarioResult>()
                .await
                .map_err(|e| CalculationError::DecodeResponse(e.to_string()))
        }
    }
}

/// Service chosen at startup from configuration.
#[derive(Clone, Debug)]
pub enum AnyCalculationService {
    Local(LocalCalculationService),
    Http(HttpCalculationService),
}

impl CalculationService for AnyCalculationService {
    fn calculate(
        &self,
        input: ScenarioInput,
    ) -> impl Future<Output = Result<ScenarioResult, CalculationError>> + Send {
        async move {
            match self {
                AnyCalculationService::Local(s) => s.calculate(input).await,
                AnyCalculationService::Http(s) => s.calculate(input).await,
            }
        }
    }
}
