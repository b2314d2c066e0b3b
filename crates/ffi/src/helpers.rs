use crate::error::{with_last_error_mut, DefaultWindSimError, WindSimError, WindSimErrorCode};
use crate::instance::WindSimInstance;
use std::ffi::CString;
use tracing::debug;
use wind_sim_core::Simulation;

/// Set the thread-local error message and code.
/// Accepts any type implementing `WindSimError` trait.
pub(crate) fn set_last_error(error: &impl WindSimError) {
    debug!("FFI call failed with {:?}: {}", error.code(), error.msg());
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl WindSimError) -> WindSimErrorCode {
    set_last_error(error);
    error.code()
}

/// Record the outcome of `result`: clear the last error on success, store it on failure.
pub(crate) fn track_result<T, E: WindSimError>(
    result: Result<T, E>,
) -> Result<T, WindSimErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = WindSimErrorCode::Ok;
    });
}

/// Run an FFI body and turn its result into an error code, tracking failures.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> WindSimErrorCode
where
    F: FnOnce() -> Result<(), DefaultWindSimError>,
{
    match track_result(f()) {
        Ok(()) => WindSimErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance from a raw pointer, rejecting null.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `wind_sim_new`.
pub(crate) unsafe fn instance_from_ptr<'a>(
    ptr: *const WindSimInstance,
) -> Result<&'a WindSimInstance, DefaultWindSimError> {
    // SAFETY: the caller guarantees `ptr` is null or came from `wind_sim_new`
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultWindSimError::null_pointer("ptr"))
}

/// Run `f` under the simulation read lock.
pub(crate) fn with_wind_sim<F, R>(
    instance: &WindSimInstance,
    f: F,
) -> Result<R, DefaultWindSimError>
where
    F: FnOnce(&Simulation) -> R,
{
    let sim = instance
        .sim
        .read()
        .map_err(|_| DefaultWindSimError::lock_poisoned("simulation"))?;
    Ok(f(&sim))
}

/// Run `f` under the simulation write lock.
pub(crate) fn with_wind_sim_mut<F, R>(
    instance: &WindSimInstance,
    f: F,
) -> Result<R, DefaultWindSimError>
where
    F: FnOnce(&mut Simulation) -> R,
{
    let mut sim = instance
        .sim
        .write()
        .map_err(|_| DefaultWindSimError::lock_poisoned("simulation"))?;
    Ok(f(&mut sim))
}

/// Reject NaN and infinities before they reach the engine.
pub(crate) fn require_finite(name: &str, value: f32) -> Result<f32, DefaultWindSimError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DefaultWindSimError::invalid_parameter(format!(
            "Parameter '{name}' must be finite, got {value}"
        )))
    }
}
