//! Scripted transport and response helpers for tests.

use std::collections::VecDeque;

use dispatch_sdk::{RawResponse, StatusCode, Transport, TransportError, TransportRequest, Value};
use parking_lot::Mutex;

/// Raw response whose body is `value` serialized as JSON.
#[must_use]
pub fn json_response(status: StatusCode, value: &Value) -> RawResponse {
    RawResponse::new(status, Some(value.to_string().into_bytes().into()))
}

/// Raw response with the given body text.
#[must_use]
pub fn text_response(status: StatusCode, body: impl Into<String>) -> RawResponse {
    let body: String = body.into();
    RawResponse::new(status, Some(body.into_bytes().into()))
}

/// Raw response without a body.
#[must_use]
pub fn empty_response(status: StatusCode) -> RawResponse {
    RawResponse::new(status, None)
}

type Reply = Result<RawResponse, TransportError>;

/// [`Transport`] that records every request and answers from a script.
///
/// Scripted replies are consumed in order; once the script is exhausted the
/// fallback reply (if any) is returned for every further request.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport answering every request with `reply`.
    #[must_use]
    pub fn always(reply: Reply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::default()
        }
    }

    /// Queue a reply.
    #[must_use]
    pub fn reply(self, reply: Reply) -> Self {
        self.script.lock().push_back(reply);
        self
    }

    /// Queue a JSON body reply.
    #[must_use]
    pub fn reply_json(self, status: StatusCode, value: &Value) -> Self {
        self.reply(Ok(json_response(status, value)))
    }

    /// Queue a failure.
    #[must_use]
    pub fn fail(self, err: TransportError) -> Self {
        self.reply(Err(err))
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(request);
        let scripted = self.script.lock().pop_front();
        match (scripted, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => Err(TransportError::Connection("no scripted reply".into())),
        }
    }
}
