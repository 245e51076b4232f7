use dispatch_sdk::{ParamMap, RawResponse, Transport, TransportError, TransportRequest, Value};
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use reqwest::Url;

use crate::config::TransportConfig;

/// HTTP [`Transport`] backed by a shared reqwest client.
///
/// Headers and query values that are not plain strings are sent in their JSON
/// text form; a non-empty body map is sent as a JSON object.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with [`TransportConfig::default`].
    ///
    /// # Errors
    /// Returns `TransportError::Build` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&TransportConfig::default())
    }

    /// # Errors
    /// Returns `TransportError::Build` if the HTTP client cannot be built.
    pub fn with_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let url = request_url(&request)?;
        tracing::debug!(verb = %request.verb, %url, "sending request");

        let mut builder = self
            .client
            .request(request.verb.into(), url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), render_value(value));
        }

        if !request.body.is_empty() {
            let body = serde_json::to_vec(&request.body)
                .map_err(|e| TransportError::Build(e.to_string()))?;
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(classify)?;

        tracing::debug!(%status, body_len = bytes.len(), "received response");

        Ok(RawResponse {
            status,
            headers,
            body: (!bytes.is_empty()).then_some(bytes),
        })
    }
}

/// Full URL with the query map appended.
fn request_url(request: &TransportRequest) -> Result<Url, TransportError> {
    let mut url = Url::parse(&request.url())
        .map_err(|e| TransportError::Build(format!("invalid url `{}`: {e}", request.url())))?;
    append_query(&mut url, &request.query);
    Ok(url)
}

fn append_query(url: &mut Url, query: &ParamMap) {
    if query.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in query {
        pairs.append_pair(key, &render_value(value));
    }
}

/// Text form of a header or query value.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else if err.is_builder() {
        TransportError::Build(err.to_string())
    } else {
        TransportError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_sdk::{DEFAULT_TIMEOUT, Verb};
    use serde_json::json;

    fn request(base_url: &str, path: &str, query: ParamMap) -> TransportRequest {
        TransportRequest {
            verb: Verb::Get,
            path: path.into(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: ParamMap::new(),
            query,
            body: ParamMap::new(),
        }
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("xxxxxxxx")), "xxxxxxxx");
        assert_eq!(render_value(&json!(114_514)), "114514");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_request_url_with_query() {
        let mut query = ParamMap::new();
        query.insert("page".into(), json!(2));
        query.insert("q".into(), json!("a b"));

        let url = request_url(&request("http://api.local/", "/v1/items", query)).unwrap();

        assert_eq!(url.path(), "/v1/items");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("page".to_owned(), "2".to_owned())));
        assert!(pairs.contains(&("q".to_owned(), "a b".to_owned())));
    }

    #[test]
    fn test_request_url_without_query() {
        let url = request_url(&request("http://api.local", "/ping", ParamMap::new())).unwrap();
        assert_eq!(url.as_str(), "http://api.local/ping");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = request_url(&request("11.45.14.233", "/user", ParamMap::new())).unwrap_err();
        assert!(matches!(err, TransportError::Build(_)));
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
