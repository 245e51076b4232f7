use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Shared aliases and defaults
// ---------------------------------------------------------------------------

/// Header, query and body entries. Values may be plain strings or structured JSON.
pub type ParamMap = serde_json::Map<String, Value>;

/// Service name used when a request does not pick one explicitly.
pub const DEFAULT_SERVICE: &str = "default";

/// Expected code used when a request does not set one.
pub const DEFAULT_EXPECTED_CODE: i64 = 0;

/// Timeout applied by profiles that do not configure their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Verb
// ---------------------------------------------------------------------------

/// HTTP verbs supported by the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

// ---------------------------------------------------------------------------
// RequestArgument
// ---------------------------------------------------------------------------

/// Describes one outbound call: what to call and which service to call it through.
///
/// The path is fixed at construction and the verb can only be chosen through the
/// consuming builder methods, so neither changes once the argument is handed to
/// the dispatcher.
///
/// ```
/// use dispatch_sdk::{RequestArgument, Verb};
/// use serde_json::json;
///
/// let arg = RequestArgument::new("/user/info")
///     .method(Verb::Get)
///     .body_field("userId", json!(114_514))
///     .expected_code(200)
///     .service("accounts");
///
/// assert_eq!(arg.verb(), Verb::Get);
/// assert_eq!(arg.resolved_expected_code(), 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestArgument {
    path: String,
    verb: Verb,
    query: ParamMap,
    body: ParamMap,
    headers: ParamMap,
    expected_code: Option<i64>,
    service: String,
}

/// Owned pieces of a [`RequestArgument`], produced when the dispatcher consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub path: String,
    pub verb: Verb,
    pub query: ParamMap,
    pub body: ParamMap,
    pub headers: ParamMap,
    pub expected_code: i64,
    pub service: String,
}

impl RequestArgument {
    /// Create a request for `path` with the default verb (`POST`) and service.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            verb: Verb::default(),
            query: ParamMap::new(),
            body: ParamMap::new(),
            headers: ParamMap::new(),
            expected_code: None,
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Get)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Post)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Put)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Delete)
    }

    #[must_use]
    pub fn method(mut self, verb: Verb) -> Self {
        self.verb = verb;
        self
    }

    /// Replace the query map.
    #[must_use]
    pub fn query(mut self, query: ParamMap) -> Self {
        self.query = query;
        self
    }

    /// Replace the body map.
    #[must_use]
    pub fn body(mut self, body: ParamMap) -> Self {
        self.body = body;
        self
    }

    /// Replace the header map.
    #[must_use]
    pub fn header(mut self, headers: ParamMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn header_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn expected_code(mut self, code: i64) -> Self {
        self.expected_code = Some(code);
        self
    }

    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    #[must_use]
    pub fn query_map(&self) -> &ParamMap {
        &self.query
    }

    #[must_use]
    pub fn body_map(&self) -> &ParamMap {
        &self.body
    }

    #[must_use]
    pub fn header_map(&self) -> &ParamMap {
        &self.headers
    }

    /// The code a response must carry to count as a success. Unset means
    /// [`DEFAULT_EXPECTED_CODE`].
    #[must_use]
    pub fn resolved_expected_code(&self) -> i64 {
        self.expected_code.unwrap_or(DEFAULT_EXPECTED_CODE)
    }

    /// Whether the caller set an expected code explicitly.
    #[must_use]
    pub fn has_expected_code(&self) -> bool {
        self.expected_code.is_some()
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn into_parts(self) -> RequestParts {
        let expected_code = self.resolved_expected_code();
        RequestParts {
            path: self.path,
            verb: self.verb,
            query: self.query,
            body: self.body,
            headers: self.headers,
            expected_code,
            service: self.service,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Transport target of a profile, fixed once the profile is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    timeout: Duration,
}

impl Endpoint {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ---------------------------------------------------------------------------
// Transport request / response
// ---------------------------------------------------------------------------

/// A fully merged request handed to a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub verb: Verb,
    pub path: String,
    pub base_url: String,
    pub timeout: Duration,
    pub headers: ParamMap,
    pub query: ParamMap,
    pub body: ParamMap,
}

impl TransportRequest {
    /// Join base address and path without doubling or dropping the separator.
    #[must_use]
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.is_empty() {
            base.to_owned()
        } else if self.path.starts_with('/') {
            format!("{base}{}", self.path)
        } else {
            format!("{base}/{}", self.path)
        }
    }
}

/// Raw outcome of one exchange, before any decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: Option<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// The body, if the exchange produced a non-empty one.
    #[must_use]
    pub fn payload(&self) -> Option<&Bytes> {
        self.body.as_ref().filter(|b| !b.is_empty())
    }
}
