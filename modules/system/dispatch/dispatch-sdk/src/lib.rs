//! Service dispatch SDK
//!
//! Contracts shared by the dispatch client and the backends it talks to:
//!
//! - [`RequestArgument`]: what to call and which service to call it through
//! - [`ServiceProfile`]: per-backend endpoint and policy hooks
//! - [`Transport`] / [`Codec`]: the exchange and decoding capabilities the
//!   dispatcher consumes
//! - [`DispatchResult`]: the chainable, suppressible outcome of a dispatch

pub mod api;
pub mod error;
pub mod models;
pub mod result;

pub use api::{Codec, MergePolicy, ServiceProfile, Transport};
pub use error::{
    CodecError, DispatchFailure, FailureCategory, ProfileError, RegistryError, TransportError,
};
pub use models::{
    DEFAULT_EXPECTED_CODE, DEFAULT_SERVICE, DEFAULT_TIMEOUT, Endpoint, ParamMap, RawResponse,
    RequestArgument, RequestParts, TransportRequest, Verb,
};
pub use result::{DispatchResult, MSG_REQUEST_ERROR, MSG_SERVICE_NOT_REGISTERED, UNRESOLVED_CODE};

// Re-export commonly used types from dependencies
pub use http::StatusCode;
pub use serde_json::Value;
