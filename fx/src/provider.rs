//! Rate provider trait and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use takehome_common::{RateTable, BASE_CURRENCY};
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};

/// Default upstream: latest rates relative to USD.
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Source of USD-based rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest complete rate table.
    async fn fetch_latest(&self) -> FxResult<RateTable>;
}

/// Body of the upstream "latest rates" endpoint. Only `rates` is required.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, serde_json::Value>>,
}

impl LatestRatesResponse {
    fn into_table(self) -> FxResult<RateTable> {
        let Some(rates) = self.rates else {
            if self.result.as_deref() == Some("error") {
                return Err(FxError::ProviderError(
                    self.error_type.unwrap_or_else(|| "unknown".to_string()),
                ));
            }
            return Err(FxError::MalformedResponse("missing rates field".to_string()));
        };

        if let Some(base) = self.base_code.filter(|base| base != BASE_CURRENCY) {
            return Err(FxError::MalformedResponse(format!(
                "rates quoted against {}, expected {}",
                base, BASE_CURRENCY
            )));
        }

        let total = rates.len();
        let table: RateTable = rates
            .into_iter()
            .filter_map(|(code, value)| value.as_f64().map(|rate| (code, rate)))
            .collect();

        if table.len() < total {
            warn!(
                dropped = total - table.len(),
                "Discarded non-numeric or non-positive rates"
            );
        }

        Ok(table)
    }
}

/// HTTP provider for open.er-api.com style endpoints.
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpRateProvider {
    /// Create a provider for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::ProviderError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint this provider queries.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "open.er-api.com"
    }

    async fn fetch_latest(&self) -> FxResult<RateTable> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::Status(status.as_u16()));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| FxError::MalformedResponse(e.to_string()))?;
        let table = body.into_table()?;

        debug!(url = %self.url, currencies = table.len(), "Fetched rate table");
        Ok(table)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: parking_lot::Mutex<Option<RateTable>>,
    delay: parking_lot::Mutex<Option<Duration>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider that fails until rates are set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: parking_lot::Mutex::new(None),
            delay: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a provider that serves `table`.
    pub fn with_rates(name: impl Into<String>, table: RateTable) -> Self {
        let provider = Self::new(name);
        provider.set_rates(table);
        provider
    }

    /// Serve `table` from now on.
    pub fn set_rates(&self, table: RateTable) {
        *self.rates.lock() = Some(table);
    }

    /// Fail every fetch from now on.
    pub fn fail(&self) {
        *self.rates.lock() = None;
    }

    /// Sleep before answering each fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of fetches attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_latest(&self) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.rates
            .lock()
            .clone()
            .ok_or_else(|| FxError::ProviderError(format!("{} is unavailable", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> HttpRateProvider {
        HttpRateProvider::new(format!("{}/v6/latest/USD", server.uri()), Duration::from_secs(2))
            .unwrap()
    }

    #[tokio::test]
    async fn test_http_provider_parses_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "base_code": "USD",
                "time_last_update_unix": 1_700_000_000,
                "rates": { "USD": 1, "LKR": 300.5, "EUR": 0.92 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let table = provider_for(&server).await.fetch_latest().await.unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("USD"), Some(1.0));
        assert_eq!(table.get("LKR"), Some(300.5));
    }

    #[tokio::test]
    async fn test_http_provider_drops_bad_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rates": { "LKR": 300, "BAD": "n/a", "ZERO": 0 }
            })))
            .mount(&server)
            .await;

        let table = provider_for(&server).await.fetch_latest().await.unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.contains("LKR"));
    }

    #[tokio::test]
    async fn test_http_provider_rejects_other_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "base_code": "EUR",
                "rates": { "EUR": 1, "USD": 1.08 }
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server).await.fetch_latest().await;

        assert!(matches!(result, Err(FxError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_http_provider_missing_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "success" })),
            )
            .mount(&server)
            .await;

        let result = provider_for(&server).await.fetch_latest().await;

        assert!(matches!(result, Err(FxError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_http_provider_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "error",
                "error-type": "unsupported-code"
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server).await.fetch_latest().await;

        match result {
            Err(FxError::ProviderError(kind)) => assert_eq!(kind, "unsupported-code"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_provider_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = provider_for(&server).await.fetch_latest().await;

        assert!(matches!(result, Err(FxError::Status(503))));
    }

    #[tokio::test]
    async fn test_http_provider_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let result = provider_for(&server).await.fetch_latest().await;

        assert!(matches!(result, Err(FxError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockRateProvider::new("mock");
        assert!(provider.fetch_latest().await.is_err());

        provider.set_rates([("LKR", 300.0)].into_iter().collect());
        let table = provider.fetch_latest().await.unwrap();

        assert_eq!(table.get("LKR"), Some(300.0));
        assert_eq!(provider.calls(), 2);
    }
}
