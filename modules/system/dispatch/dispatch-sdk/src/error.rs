use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport / codec / profile errors
// ---------------------------------------------------------------------------

/// Failures reported by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request build error: {0}")]
    Build(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Failures reported by a [`crate::Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload does not match the requested type: {0}")]
    Mismatch(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            CodecError::Mismatch(err.to_string())
        } else {
            CodecError::Malformed(err.to_string())
        }
    }
}

/// Failures raised by a [`crate::ServiceProfile`] hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("profile initialization failed: {0}")]
    Init(String),

    #[error("response reshaping failed: {0}")]
    Reshape(String),

    #[error("profile hook `{hook}` panicked: {detail}")]
    Panicked { hook: &'static str, detail: String },
}

// ---------------------------------------------------------------------------
// Registration errors
// ---------------------------------------------------------------------------

/// Configuration errors surfaced synchronously by service registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("service `{name}` is already registered")]
    Duplicate { name: String },

    #[error("failed to initialize service `{name}`: {source}")]
    Init {
        name: String,
        #[source]
        source: ProfileError,
    },
}

// ---------------------------------------------------------------------------
// Dispatch failures
// ---------------------------------------------------------------------------

/// Coarse failure categories, used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Request,
    Connection,
    Timeout,
    Protocol,
    Decode,
    Shape,
    Profile,
}

impl FailureCategory {
    /// Profile-agnostic message used when a profile does not translate a failure.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            FailureCategory::Request => "request could not be built",
            FailureCategory::Connection => "network connection error",
            FailureCategory::Timeout => "request timed out",
            FailureCategory::Protocol => "protocol error",
            FailureCategory::Decode => "response could not be decoded",
            FailureCategory::Shape => "unexpected response format",
            FailureCategory::Profile => "service profile error",
        }
    }
}

/// Everything that can go wrong between merging and classification.
///
/// The dispatcher never returns this to callers; it is handed to
/// [`crate::ServiceProfile::translate_error`] and folded into a result message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("transport panicked: {0}")]
    TransportPanicked(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("codec panicked: {0}")]
    CodecPanicked(String),

    #[error("response envelope is not an object")]
    EnvelopeNotObject,

    #[error("response envelope is missing `{field}`")]
    MissingField { field: &'static str },

    #[error("response envelope field `{field}` is not {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl DispatchFailure {
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            DispatchFailure::Transport(TransportError::Build(_)) => FailureCategory::Request,
            DispatchFailure::Transport(TransportError::Connection(_)) => {
                FailureCategory::Connection
            }
            DispatchFailure::Transport(TransportError::Timeout(_)) => FailureCategory::Timeout,
            DispatchFailure::Transport(TransportError::Protocol(_))
            | DispatchFailure::TransportPanicked(_) => FailureCategory::Protocol,
            DispatchFailure::Codec(_) | DispatchFailure::CodecPanicked(_) => {
                FailureCategory::Decode
            }
            DispatchFailure::EnvelopeNotObject
            | DispatchFailure::MissingField { .. }
            | DispatchFailure::FieldType { .. } => FailureCategory::Shape,
            DispatchFailure::Profile(_) => FailureCategory::Profile,
        }
    }
}
