use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CodecError, DispatchFailure, ProfileError, TransportError};
use crate::models::{Endpoint, ParamMap, RawResponse, TransportRequest};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Performs one verb-based network exchange.
///
/// Non-success HTTP statuses are not failures at this level: the response is
/// returned as-is and the envelope it carries decides the outcome.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns `TransportError` if the exchange could not be completed.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Turns a raw response body into a generic structure.
pub trait Codec: Send + Sync {
    /// # Errors
    /// Returns `CodecError` if `raw` is not valid in the codec's wire format.
    fn decode(&self, raw: &[u8]) -> Result<Value, CodecError>;
}

// ---------------------------------------------------------------------------
// Service profile
// ---------------------------------------------------------------------------

/// Which side wins when a shared profile entry and a per-call entry use the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Profile-level values override per-call values.
    #[default]
    SharedWins,
    /// Per-call values override profile-level values.
    RequestWins,
}

/// Per-backend configuration and policy bundle.
///
/// Only [`ServiceProfile::name`] and [`ServiceProfile::init`] are required; every
/// other hook has a neutral default.
pub trait ServiceProfile: Send + Sync {
    /// Registry key. Must be unique across a registry.
    fn name(&self) -> &str;

    /// One-time setup, run by the registry at registration.
    ///
    /// # Errors
    /// Returns `ProfileError::Init` if the profile cannot be configured; the
    /// profile is then not registered.
    fn init(&self) -> Result<Endpoint, ProfileError>;

    /// Headers added to every request sent through this profile.
    fn shared_headers(&self) -> ParamMap {
        ParamMap::new()
    }

    /// Query parameters added to every request sent through this profile.
    fn shared_query(&self) -> ParamMap {
        ParamMap::new()
    }

    /// Body fields added to every request sent through this profile.
    fn shared_body(&self) -> ParamMap {
        ParamMap::new()
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::SharedWins
    }

    /// Reshape a decoded body into the `{code, msg, data}` envelope.
    ///
    /// # Errors
    /// Returns `ProfileError::Reshape` if the body cannot be reshaped.
    fn reshape_response(&self, decoded: Value) -> Result<Value, ProfileError> {
        Ok(decoded)
    }

    /// Human-readable message for a failed dispatch. An empty string defers to
    /// [`crate::FailureCategory::default_message`].
    fn translate_error(&self, _failure: &DispatchFailure) -> String {
        String::new()
    }
}
