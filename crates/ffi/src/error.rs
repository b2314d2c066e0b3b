use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use wind_sim_core::SimError;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait WindSimError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> WindSimErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `WindSimError` for common FFI error scenarios.
///
/// Wraps a `WindSimErrorCode` and provides a constructor for each error type
/// (except Ok, which represents success).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultWindSimError {
    code: WindSimErrorCode,
    msg: String,
}

impl DefaultWindSimError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: WindSimErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned (e.g., `"simulation"`)
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: WindSimErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: WindSimErrorCode::InvalidParameter,
            msg: message,
        }
    }

    /// Create error for a caller buffer shorter than the data it must receive.
    pub fn buffer_too_small(param_name: &str, len: usize, required: usize) -> Self {
        Self {
            code: WindSimErrorCode::BufferTooSmall,
            msg: format!("Buffer '{param_name}' holds {len} elements, {required} required"),
        }
    }
}

impl From<SimError> for DefaultWindSimError {
    fn from(error: SimError) -> Self {
        let code = match error {
            SimError::AllocationFailed { .. } => WindSimErrorCode::AllocationFailed,
            SimError::InvalidDimensions { .. } => WindSimErrorCode::InvalidParameter,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl WindSimError for DefaultWindSimError {
    fn code(&self) -> WindSimErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by wind simulation functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindSimErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Invalid parameter passed to function (non-finite number, unknown enum code).
    InvalidParameter = 3,

    /// A grid or particle buffer could not be allocated, even at the Low tier.
    AllocationFailed = 4,

    /// A caller-provided output buffer is shorter than the data to copy.
    BufferTooSmall = 5,
}

impl From<DefaultWindSimError> for WindSimErrorCode {
    fn from(error: DefaultWindSimError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The `CString` is kept here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, WindSimErrorCode)> =
        const { RefCell::new((None, WindSimErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, WindSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, WindSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if no error has occurred or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread, so each thread has its own independent
/// error state.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread that
/// sets or clears the error, or until the thread terminates.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// WindSimInstance* sim = NULL;
/// if (wind_sim_new(800.0f, 600.0f, 1, &sim) != Ok) {
///     const char* error = wind_sim_get_last_error();
///     if (error) {
///         fprintf(stderr, "Wind sim creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn wind_sim_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `WindSimErrorCode::Ok` (0) if the last call on this thread succeeded,
/// otherwise the code from the last failed operation.
#[no_mangle]
pub extern "C" fn wind_sim_get_last_error_code() -> WindSimErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
