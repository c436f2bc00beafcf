//! HTTP JSON provider client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use super::error::{map_http_status, map_reqwest_error};
use super::{MarketDataProvider, ProviderError};
use crate::core::config::ProviderConfig;
use crate::core::pipeline::Payload;

/// Fetches datasets as JSON over HTTP GET.
///
/// Responses wrapped in a `{"data": ...}` envelope are unwrapped.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: Url,
    timeout: Duration,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        // A base without a trailing slash would lose its last segment on join.
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ProviderError::InvalidUrl(format!("{base}: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    async fn fetch(&self, path: &str, query: &[(&'static str, String)]) -> Result<Payload, ProviderError> {
        let url = self.endpoint(path)?;
        debug!(%url, params = query.len(), "Fetching provider dataset");

        let mut request = self.client.get(url).query(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_status(status, &body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        let body: Value = serde_json::from_str(&text).map_err(|e| ProviderError::decode(e.to_string()))?;
        Ok(Payload::from_json(unwrap_envelope(body)))
    }
}

fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HttpProvider {
        let config = ProviderConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_secs: 5,
            api_key: None,
        };
        HttpProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_table_with_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/quote/history"))
            .and(query_param("symbol", "VNM"))
            .and(query_param("interval", "1D"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "time": "2024-01-02", "close": 67.1 },
                { "time": "2024-01-03", "close": 67.4 },
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let payload = provider_for(&server)
            .fetch("quote/history", &[("symbol", "VNM".into()), ("interval", "1D".into())])
            .await
            .unwrap();

        match payload {
            Payload::Table(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0]["time"], "2024-01-02");
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_unwraps_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/gold/sjc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "SJC 1L", "buy": 118.5, "sell": 120.5 }],
                "source": "sjc.com.vn",
            })))
            .mount(&server)
            .await;

        let payload = provider_for(&server).fetch("/gold/sjc", &[]).await.unwrap();
        assert!(matches!(payload, Payload::Table(ref records) if records.len() == 1));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(42)))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            api_key: Some("secret".into()),
        };
        let payload = HttpProvider::new(&config).unwrap().fetch("listing", &[]).await.unwrap();
        assert_eq!(payload, Payload::Scalar(json!(42)));
    }

    #[tokio::test]
    async fn test_server_error_is_connectivity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("listing", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { status: 503, .. }));
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[tokio::test]
    async fn test_bad_request_is_validation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unknown symbol XYZ"))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("company/overview", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("unknown symbol XYZ"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch("listing", &[]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = ProviderConfig {
            base_url: server.uri(),
            timeout_secs: 1,
            api_key: None,
        };
        let err = HttpProvider::new(&config).unwrap().fetch("listing", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_connectivity() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:1/".into(),
            timeout_secs: 5,
            api_key: None,
        };
        let err = HttpProvider::new(&config).unwrap().fetch("listing", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ProviderConfig {
            base_url: "not a url".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(HttpProvider::new(&config), Err(ProviderError::InvalidUrl(_))));
    }
}
