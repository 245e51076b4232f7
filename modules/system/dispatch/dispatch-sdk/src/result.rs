use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CodecError;

/// Code reported by results that never received a response envelope.
pub const UNRESOLVED_CODE: i64 = i64::MIN;

/// Message for requests routed to a service name nobody registered.
pub const MSG_SERVICE_NOT_REGISTERED: &str = "service not registered";

/// Message for exchanges that completed without a response body.
pub const MSG_REQUEST_ERROR: &str = "request error";

/// Outcome of one dispatch, with a chainable callback contract.
///
/// A result is *matched* when the envelope code equals the expected code.
/// Results built locally (unregistered service, transport or decoding
/// failures) carry no envelope code and are never matched, whatever the
/// caller expected.
///
/// Callbacks are gated by a one-way `consumed` flag set with
/// [`DispatchResult::suppress`]. Suppression silences every callback path but
/// leaves the stored fields readable.
///
/// ```
/// use dispatch_sdk::DispatchResult;
/// use serde_json::json;
///
/// let mut shown = None;
/// let mut hint = None;
///
/// DispatchResult::new(200, "ok", Some(json!({"id": 1})), 200)
///     .on_success(|_, data| shown = data.cloned())
///     .on_failure(|msg, _| hint = Some(msg.to_owned()));
///
/// assert_eq!(shown, Some(json!({"id": 1})));
/// assert_eq!(hint, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    code: Option<i64>,
    msg: String,
    data: Option<Value>,
    expected_code: i64,
    consumed: bool,
}

impl DispatchResult {
    /// Result built from a response envelope.
    #[must_use]
    pub fn new(code: i64, msg: impl Into<String>, data: Option<Value>, expected_code: i64) -> Self {
        Self {
            code: Some(code),
            msg: msg.into(),
            data,
            expected_code,
            consumed: false,
        }
    }

    /// Result for a dispatch that never produced an envelope.
    #[must_use]
    pub fn failed(msg: impl Into<String>, expected_code: i64) -> Self {
        Self {
            code: None,
            msg: msg.into(),
            data: None,
            expected_code,
            consumed: false,
        }
    }

    /// Envelope code, or [`UNRESOLVED_CODE`] when there was none.
    #[must_use]
    pub fn code(&self) -> i64 {
        self.code.unwrap_or(UNRESOLVED_CODE)
    }

    /// Whether the result carries a code taken from a response envelope.
    #[must_use]
    pub fn has_envelope(&self) -> bool {
        self.code.is_some()
    }

    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    /// Deserialize the payload into `T`. A missing payload is treated as JSON `null`.
    ///
    /// # Errors
    /// Returns `CodecError::Mismatch` if the payload does not fit `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        let value = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(CodecError::from)
    }

    #[must_use]
    pub fn expected_code(&self) -> i64 {
        self.expected_code
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.code == Some(self.expected_code)
    }

    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.is_matched() && !self.consumed
    }

    /// Claim the result: no callback registered on it will run from now on.
    pub fn suppress(&mut self) -> &mut Self {
        self.consumed = true;
        self
    }

    /// Run `callback` unless the result was suppressed, whatever the outcome.
    pub fn what_ever<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&str, Option<&Value>),
    {
        if !self.consumed {
            callback(&self.msg, self.data.as_ref());
        }
        self
    }

    /// Run `callback` if the result is matched and was not suppressed.
    pub fn on_success<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&str, Option<&Value>),
    {
        if !self.consumed && self.is_matched() {
            callback(&self.msg, self.data.as_ref());
        }
        self
    }

    /// Run `callback` if the result is not matched and was not suppressed.
    pub fn on_failure<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&str, Option<&Value>),
    {
        if !self.consumed && !self.is_matched() {
            callback(&self.msg, self.data.as_ref());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Default)]
    struct Calls {
        success: u32,
        failure: u32,
        whatever: u32,
    }

    fn run_chain(result: &mut DispatchResult) -> Calls {
        let mut calls = Calls::default();
        result
            .on_success(|_, _| calls.success += 1)
            .on_failure(|_, _| calls.failure += 1)
            .what_ever(|_, _| calls.whatever += 1);
        calls
    }

    #[test]
    fn test_matched_result_runs_success_and_whatever() {
        let mut result = DispatchResult::new(200, "ok", Some(json!({"id": 1})), 200);
        assert!(result.is_success());

        let calls = run_chain(&mut result);
        assert_eq!((calls.success, calls.failure, calls.whatever), (1, 0, 1));
    }

    #[test]
    fn test_unmatched_result_runs_failure_and_whatever() {
        let mut result = DispatchResult::new(500, "boom", None, 200);
        assert!(!result.is_success());

        let calls = run_chain(&mut result);
        assert_eq!((calls.success, calls.failure, calls.whatever), (0, 1, 1));
    }

    #[test]
    fn test_suppress_silences_every_path() {
        for mut result in [
            DispatchResult::new(0, "ok", None, 0),
            DispatchResult::new(1, "nope", None, 0),
            DispatchResult::failed("network error", 0),
        ] {
            result.suppress();
            let calls = run_chain(&mut result);
            assert_eq!((calls.success, calls.failure, calls.whatever), (0, 0, 0));
            assert!(!result.is_success());
            assert!(result.is_consumed());
        }
    }

    #[test]
    fn test_suppress_keeps_fields_readable() {
        let mut result = DispatchResult::new(200, "ok", Some(json!([1, 2])), 200);
        result.suppress();

        assert_eq!(result.code(), 200);
        assert_eq!(result.msg(), "ok");
        assert_eq!(result.data(), Some(&json!([1, 2])));
        assert!(result.is_matched());
        assert!(!result.is_success());
    }

    #[test]
    fn test_suppress_mid_chain_stops_later_callbacks() {
        let mut result = DispatchResult::new(401, "login expired", None, 200);
        let mut seen = Vec::new();

        result
            .on_failure(|msg, _| seen.push(format!("guard:{msg}")))
            .suppress()
            .on_failure(|msg, _| seen.push(format!("view:{msg}")))
            .what_ever(|_, _| seen.push("cleanup".to_owned()));

        assert_eq!(seen, vec!["guard:login expired".to_owned()]);
    }

    #[test]
    fn test_repeated_chain_calls_invoke_each_time() {
        let mut result = DispatchResult::new(0, "ok", None, 0);
        let mut count = 0;
        result
            .on_success(|_, _| count += 1)
            .on_success(|_, _| count += 1);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_failed_result_never_matches() {
        let result = DispatchResult::failed(MSG_SERVICE_NOT_REGISTERED, UNRESOLVED_CODE);
        assert_eq!(result.code(), UNRESOLVED_CODE);
        assert!(!result.has_envelope());
        assert!(!result.is_matched());
        assert!(!result.is_success());
        assert!(result.data().is_none());
    }

    #[test]
    fn test_callbacks_receive_msg_and_data() {
        let mut result = DispatchResult::new(0, "fine", Some(json!({"n": 3})), 0);
        let mut received = None;
        result.what_ever(|msg, data| received = Some((msg.to_owned(), data.cloned())));
        assert_eq!(received, Some(("fine".to_owned(), Some(json!({"n": 3})))));
    }

    #[test]
    fn test_data_as() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u64,
        }

        let result = DispatchResult::new(200, "ok", Some(json!({"id": 7})), 200);
        assert_eq!(result.data_as::<User>().unwrap(), User { id: 7 });
        assert!(matches!(
            result.data_as::<Vec<u8>>(),
            Err(CodecError::Mismatch(_))
        ));

        let empty = DispatchResult::failed("x", 0);
        assert_eq!(empty.data_as::<Option<User>>().unwrap(), None);
    }
}
