use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dispatch_sdk::{
    Codec, DispatchFailure, DispatchResult, MSG_REQUEST_ERROR, MSG_SERVICE_NOT_REGISTERED,
    RawResponse, RequestArgument, RequestParts, Transport, TransportError, TransportRequest,
};
use futures::FutureExt;
use tokio::runtime::RuntimeFlavor;

use crate::codec::JsonCodec;
use crate::config::TransportConfig;
use crate::envelope::Envelope;
use crate::guard::{call_hook, catch_panic, panic_detail};
use crate::merge::{merge_headers, merge_shared};
use crate::registry::{RegisteredService, ServiceRegistry};
use crate::transport::ReqwestTransport;

/// Routes [`RequestArgument`]s through registered profiles and a transport.
///
/// [`Dispatcher::dispatch`] is total: every outcome, including unknown
/// services, transport faults, undecodable bodies and misbehaving profile
/// hooks, is delivered as a [`DispatchResult`].
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher decoding bodies as JSON.
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            codec: Arc::new(JsonCodec),
        }
    }

    /// Dispatcher backed by a [`ReqwestTransport`] built from `config`.
    ///
    /// # Errors
    /// Returns `TransportError::Build` if the HTTP client cannot be built.
    pub fn from_config(
        registry: Arc<ServiceRegistry>,
        config: &TransportConfig,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::with_config(config)?;
        Ok(Self::new(registry, Arc::new(transport)))
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Resolve, merge, send, decode and classify one request.
    pub async fn dispatch(&self, request: RequestArgument) -> DispatchResult {
        let parts = request.into_parts();
        let expected_code = parts.expected_code;

        let Some(service) = self.registry.lookup(&parts.service) else {
            tracing::warn!(
                service = %parts.service,
                path = %parts.path,
                "dispatch to unregistered service"
            );
            return DispatchResult::failed(MSG_SERVICE_NOT_REGISTERED, expected_code);
        };

        tracing::debug!(
            service = %parts.service,
            verb = %parts.verb,
            path = %parts.path,
            expected_code,
            "dispatching request"
        );

        match self.exchange(&service, parts).await {
            Ok(Some(envelope)) => {
                tracing::debug!(
                    service = %service.name(),
                    code = envelope.code,
                    matched = envelope.code == expected_code,
                    "dispatch completed"
                );
                DispatchResult::new(envelope.code, envelope.msg, envelope.data, expected_code)
            }
            Ok(None) => {
                tracing::warn!(service = %service.name(), "response carried no body");
                DispatchResult::failed(MSG_REQUEST_ERROR, expected_code)
            }
            Err(failure) => {
                tracing::warn!(
                    service = %service.name(),
                    category = ?failure.category(),
                    error = %failure,
                    "dispatch failed"
                );
                DispatchResult::failed(translate(&service, &failure), expected_code)
            }
        }
    }

    /// Blocking version of [`Dispatcher::dispatch`] for sync contexts.
    ///
    /// On a multi-threaded runtime the call blocks in place. A current-thread
    /// runtime cannot be blocked, so the call is driven on a helper thread with
    /// its own runtime. Without a runtime a temporary one is created.
    #[must_use]
    pub fn dispatch_blocking(&self, request: RequestArgument) -> DispatchResult {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return self.dispatch_on_new_runtime(request);
        };

        if handle.runtime_flavor() == RuntimeFlavor::MultiThread {
            return tokio::task::block_in_place(|| handle.block_on(self.dispatch(request)));
        }

        let expected_code = request.resolved_expected_code();
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.dispatch_on_new_runtime(request))
                .join()
                .unwrap_or_else(|payload| {
                    let detail = panic_detail(payload.as_ref());
                    tracing::error!(%detail, "blocking dispatch thread panicked");
                    DispatchResult::failed(MSG_REQUEST_ERROR, expected_code)
                })
        })
    }

    fn dispatch_on_new_runtime(&self, request: RequestArgument) -> DispatchResult {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.dispatch(request)),
            Err(e) => {
                tracing::error!(error = %e, "failed to start a runtime for blocking dispatch");
                DispatchResult::failed(MSG_REQUEST_ERROR, request.resolved_expected_code())
            }
        }
    }

    /// Steps that may fail; `Ok(None)` means the exchange returned no body.
    async fn exchange(
        &self,
        service: &RegisteredService,
        parts: RequestParts,
    ) -> Result<Option<Envelope>, DispatchFailure> {
        let request = build_transport_request(service, parts)?;
        let response = self.send(request).await?;

        let Some(body) = response.payload() else {
            return Ok(None);
        };

        let decoded = catch_panic(|| self.codec.decode(body)).map_err(|detail| {
            tracing::error!(%detail, "codec panicked");
            DispatchFailure::CodecPanicked(detail)
        })??;
        let reshaped =
            call_hook("reshape_response", || service.profile().reshape_response(decoded))??;
        Envelope::from_value(reshaped).map(Some)
    }

    async fn send(&self, request: TransportRequest) -> Result<RawResponse, DispatchFailure> {
        match AssertUnwindSafe(self.transport.send(request)).catch_unwind().await {
            Ok(result) => result.map_err(DispatchFailure::from),
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(%detail, "transport panicked");
                Err(DispatchFailure::TransportPanicked(detail))
            }
        }
    }
}

/// Copy the request's maps and apply the profile's shared entries on top.
fn build_transport_request(
    service: &RegisteredService,
    parts: RequestParts,
) -> Result<TransportRequest, DispatchFailure> {
    let profile = service.profile();
    let policy = call_hook("merge_policy", || profile.merge_policy())?;

    let RequestParts {
        path,
        verb,
        mut query,
        mut body,
        mut headers,
        ..
    } = parts;

    let shared_headers = call_hook("shared_headers", || profile.shared_headers())?;
    let shared_query = call_hook("shared_query", || profile.shared_query())?;
    let shared_body = call_hook("shared_body", || profile.shared_body())?;

    merge_headers(&mut headers, shared_headers, policy);
    merge_shared(&mut query, shared_query, policy);
    merge_shared(&mut body, shared_body, policy);

    Ok(TransportRequest {
        verb,
        path,
        base_url: service.endpoint().base_url().to_owned(),
        timeout: service.endpoint().timeout(),
        headers,
        query,
        body,
    })
}

/// The profile's message for `failure`, or the category default when it has none.
fn translate(service: &RegisteredService, failure: &DispatchFailure) -> String {
    let translated = call_hook("translate_error", || service.profile().translate_error(failure))
        .unwrap_or_default();
    if translated.is_empty() {
        failure.category().default_message().to_owned()
    } else {
        translated
    }
}
