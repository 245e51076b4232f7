use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use dispatch_sdk::ProfileError;

/// Run a profile hook, turning a panic into `ProfileError::Panicked`.
pub fn call_hook<T>(hook: &'static str, f: impl FnOnce() -> T) -> Result<T, ProfileError> {
    catch_panic(f).map_err(|detail| {
        tracing::error!(hook, %detail, "profile hook panicked");
        ProfileError::Panicked { hook, detail }
    })
}

/// Run `f`, returning the panic message if it panics.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_detail(payload.as_ref()))
}

#[must_use]
pub fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
