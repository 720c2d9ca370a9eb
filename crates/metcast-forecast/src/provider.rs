use metcast_core::{ForecastConfig, NetworkError, ReqwestErrorExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::types::ForecastSnapshot;

/// Fetches the current bulletin from the forecast endpoint.
#[derive(Debug, Clone)]
pub struct ForecastProvider {
    client: Arc<Client>,
    endpoint: String,
}

impl ForecastProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ForecastConfig) -> Result<Self, NetworkError> {
        Self::new(config.endpoint_url.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single GET against the endpoint. Any non-2xx status is a failure.
    pub async fn fetch(&self) -> Result<ForecastSnapshot, NetworkError> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting forecast bulletin");

        let response = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ForecastSnapshot>()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))
    }
}
