//! Service dispatch client
//!
//! Routes outbound API calls through named service profiles:
//!
//! 1. profiles are registered once at startup in a [`ServiceRegistry`]
//! 2. callers describe a call with a [`RequestArgument`]
//! 3. the [`Dispatcher`] merges the profile's shared headers, query and body,
//!    sends the request through a [`Transport`], decodes the `{code, msg, data}`
//!    envelope and hands back a [`DispatchResult`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dispatch_client::{
//!     Dispatcher, RequestArgument, ServiceRegistry, StaticProfile, TransportConfig, Verb,
//! };
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ServiceRegistry::new());
//! registry.register(
//!     StaticProfile::new("ServiceA", "http://11.45.14.233").with_header("Cookie", "xxxxxxxx"),
//! )?;
//!
//! let dispatcher = Dispatcher::from_config(Arc::clone(&registry), &TransportConfig::default())?;
//!
//! dispatcher
//!     .dispatch(
//!         RequestArgument::new("/user/info")
//!             .method(Verb::Get)
//!             .body_field("userId", json!(114_514))
//!             .expected_code(200)
//!             .service("ServiceA"),
//!     )
//!     .await
//!     .on_success(|_, data| println!("user: {data:?}"))
//!     .on_failure(|msg, _| eprintln!("failed: {msg}"))
//!     .what_ever(|_, _| println!("done"));
//! # Ok(())
//! # }
//! ```

mod codec;
mod config;
mod dispatcher;
mod envelope;
mod guard;
mod merge;
mod profile;
mod registry;
mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

// Re-export public API
pub use codec::JsonCodec;
pub use config::{ConfigError, DispatchConfig, ENV_PREFIX, ProfileConfig, TransportConfig};
pub use dispatcher::Dispatcher;
pub use profile::{DETAIL_PLACEHOLDER, StaticProfile};
pub use registry::{RegisteredService, ServiceRegistry};
pub use transport::ReqwestTransport;

pub use dispatch_sdk::{
    Codec, CodecError, DEFAULT_EXPECTED_CODE, DEFAULT_SERVICE, DEFAULT_TIMEOUT, DispatchFailure,
    DispatchResult, Endpoint, FailureCategory, MSG_REQUEST_ERROR, MSG_SERVICE_NOT_REGISTERED,
    MergePolicy, ParamMap, ProfileError, RawResponse, RegistryError, RequestArgument,
    ServiceProfile, StatusCode, Transport, TransportError, TransportRequest, UNRESOLVED_CODE, Value,
    Verb,
};
