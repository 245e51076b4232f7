use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use dispatch_sdk::{DEFAULT_TIMEOUT, FailureCategory, MergePolicy, ParamMap, RegistryError};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Deserializer};

use crate::profile::StaticProfile;
use crate::registry::ServiceRegistry;

/// Prefix of environment variables read by [`DispatchConfig`].
///
/// Nested keys are separated by a double underscore, e.g.
/// `DISPATCH_TRANSPORT__USER_AGENT` or `DISPATCH_SERVICES__ACCOUNTS__BASE_URL`.
pub const ENV_PREFIX: &str = "DISPATCH_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load dispatch configuration: {0}")]
    Load(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Settings of the default reqwest transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection timeout.
    #[serde(deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,
    /// Upper bound for a whole exchange; profile timeouts apply per request.
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("cf-dispatch/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Declarative profile: endpoint, shared maps and per-category error messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileConfig {
    pub base_url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default)]
    pub headers: ParamMap,
    #[serde(default)]
    pub query: ParamMap,
    #[serde(default)]
    pub body: ParamMap,
    #[serde(default)]
    pub merge_policy: MergePolicy,
    /// Messages by failure category; `{detail}` is replaced by the failure text.
    #[serde(default)]
    pub error_messages: HashMap<FailureCategory, String>,
}

impl ProfileConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            headers: ParamMap::new(),
            query: ParamMap::new(),
            body: ParamMap::new(),
            merge_policy: MergePolicy::default(),
            error_messages: HashMap::new(),
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

/// Transport settings plus the profiles to register at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub transport: TransportConfig,
    pub services: BTreeMap<String, ProfileConfig>,
}

impl DispatchConfig {
    /// Load from a YAML file, overridden by `DISPATCH_*` environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::Load` if the file or environment cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load from `DISPATCH_*` environment variables only.
    ///
    /// # Errors
    /// Returns `ConfigError::Load` if the environment cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Register a [`StaticProfile`] for every declared service.
    ///
    /// Stops at the first failure; profiles registered before it stay registered.
    ///
    /// # Errors
    /// Returns the first `RegistryError` encountered.
    pub fn register_all(&self, registry: &ServiceRegistry) -> Result<usize, RegistryError> {
        for (name, profile) in &self.services {
            registry.register(StaticProfile::from_config(name.clone(), profile.clone()))?;
        }
        Ok(self.services.len())
    }
}

// ---------------------------------------------------------------------------
// Duration parsing
// ---------------------------------------------------------------------------

/// Accepts humantime strings (`"1500ms"`, `"30s"`) or a bare number of seconds.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => humantime::parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
