use std::time::Duration;

use dispatch_sdk::{
    DispatchFailure, Endpoint, FailureCategory, MergePolicy, ParamMap, ProfileError,
    ServiceProfile, Value,
};
use reqwest::Url;

use crate::config::ProfileConfig;

/// Placeholder replaced by the failure text in configured error messages.
pub const DETAIL_PLACEHOLDER: &str = "{detail}";

/// A [`ServiceProfile`] driven entirely by data.
///
/// Covers backends whose policy is a fixed set of shared entries and a table of
/// error messages. Backends that reshape responses implement the trait directly.
///
/// ```
/// use dispatch_client::{FailureCategory, StaticProfile};
///
/// let profile = StaticProfile::new("ServiceA", "http://11.45.14.233")
///     .with_header("Cookie", "xxxxxxxx")
///     .with_error_message(FailureCategory::Connection, "network connection error: {detail}");
/// ```
#[derive(Debug, Clone)]
pub struct StaticProfile {
    name: String,
    config: ProfileConfig,
}

impl StaticProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::from_config(name, ProfileConfig::new(base_url))
    }

    #[must_use]
    pub fn from_config(name: impl Into<String>, config: ProfileConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.body.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.config.merge_policy = policy;
        self
    }

    #[must_use]
    pub fn with_error_message(
        mut self,
        category: FailureCategory,
        message: impl Into<String>,
    ) -> Self {
        self.config.error_messages.insert(category, message.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }
}

impl ServiceProfile for StaticProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> Result<Endpoint, ProfileError> {
        let base_url = self.config.base_url.trim();
        if base_url.is_empty() {
            return Err(ProfileError::Init("base_url is empty".into()));
        }
        let parsed = Url::parse(base_url)
            .map_err(|e| ProfileError::Init(format!("invalid base_url `{base_url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProfileError::Init(format!(
                "unsupported scheme `{}` in base_url",
                parsed.scheme()
            )));
        }
        if self.config.timeout.is_zero() {
            return Err(ProfileError::Init("timeout must be greater than zero".into()));
        }
        Ok(Endpoint::new(base_url, self.config.timeout))
    }

    fn shared_headers(&self) -> ParamMap {
        self.config.headers.clone()
    }

    fn shared_query(&self) -> ParamMap {
        self.config.query.clone()
    }

    fn shared_body(&self) -> ParamMap {
        self.config.body.clone()
    }

    fn merge_policy(&self) -> MergePolicy {
        self.config.merge_policy
    }

    fn translate_error(&self, failure: &DispatchFailure) -> String {
        self.config
            .error_messages
            .get(&failure.category())
            .map(|template| template.replace(DETAIL_PLACEHOLDER, &failure.to_string()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_sdk::{CodecError, DEFAULT_TIMEOUT, TransportError};
    use serde_json::json;

    #[test]
    fn test_init_produces_endpoint() {
        let endpoint = StaticProfile::new("a", "http://11.45.14.233")
            .with_timeout(Duration::from_millis(1500))
            .init()
            .unwrap();
        assert_eq!(endpoint.base_url(), "http://11.45.14.233");
        assert_eq!(endpoint.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_init_rejects_bad_endpoints() {
        for base_url in ["", "   ", "11.45.14.233", "ftp://files.local"] {
            let err = StaticProfile::new("a", base_url).init().unwrap_err();
            assert!(matches!(err, ProfileError::Init(_)), "{base_url}");
        }

        let err = StaticProfile::new("a", "http://a.local")
            .with_timeout(Duration::ZERO)
            .init()
            .unwrap_err();
        assert!(matches!(err, ProfileError::Init(_)));
    }

    #[test]
    fn test_shared_maps() {
        let profile = StaticProfile::new("a", "http://a.local")
            .with_header("Cookie", "xxxxxxxx")
            .with_query("client", "android")
            .with_body_field("appVersion", 3);

        assert_eq!(profile.shared_headers()["Cookie"], json!("xxxxxxxx"));
        assert_eq!(profile.shared_query()["client"], json!("android"));
        assert_eq!(profile.shared_body()["appVersion"], json!(3));
        assert_eq!(profile.config().timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_translate_error_table() {
        let profile = StaticProfile::new("a", "http://a.local")
            .with_error_message(FailureCategory::Connection, "network connection error: {detail}")
            .with_error_message(FailureCategory::Decode, "data conversion error");

        let connection = DispatchFailure::from(TransportError::Connection("refused".into()));
        assert_eq!(
            profile.translate_error(&connection),
            "network connection error: connection error: refused"
        );

        let decode = DispatchFailure::from(CodecError::Malformed("eof".into()));
        assert_eq!(profile.translate_error(&decode), "data conversion error");

        let timeout = DispatchFailure::from(TransportError::Timeout("1s".into()));
        assert_eq!(profile.translate_error(&timeout), "");
    }

    #[test]
    fn test_merge_policy_override() {
        let profile =
            StaticProfile::new("a", "http://a.local").with_merge_policy(MergePolicy::RequestWins);
        assert_eq!(profile.merge_policy(), MergePolicy::RequestWins);
    }
}
