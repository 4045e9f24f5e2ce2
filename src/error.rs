//! Error kinds for the conversion path, their Python exception classes, and
//! the thread-local last-error slot for the C boundary.
//!
//! Every failure is a [`BridgeError`]. Crossing into Python it becomes one of
//! the `ffiutils` exception classes below; `AccessorFailureError`,
//! `UnsupportedDatatypeError` and `ResolutionError` all derive from
//! `InternalConversionError`, so callers can catch either level.
//!
//! **Last error:**
//! - `bridge_last_error()` returns a pointer owned by TLS — do NOT free it.
//! - It is overwritten by the next failing export on the same thread.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;
use thiserror::Error;

use crate::element::{Accessor, AccessorStatus};

create_exception!(
    ffiutils,
    InternalConversionError,
    PyException,
    "An element could not be converted to a Python value."
);
create_exception!(
    ffiutils,
    AccessorFailureError,
    InternalConversionError,
    "A native element accessor reported a non-zero status."
);
create_exception!(
    ffiutils,
    UnsupportedDatatypeError,
    InternalConversionError,
    "An element datatype has no scalar conversion."
);
create_exception!(
    ffiutils,
    ResolutionError,
    InternalConversionError,
    "The datetime construction helper could not be resolved."
);

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{accessor} (index {index}, status {status})")]
    AccessorFailure {
        accessor: Accessor,
        index: usize,
        status: i32,
    },

    #[error("Internal datatype error: unsupported datatype tag {tag}")]
    UnsupportedDatatype { tag: i32 },

    #[error("Internal error getting {step}")]
    Resolution {
        step: String,
        #[source]
        source: PyErr,
    },

    #[error("{context}")]
    Internal { context: String },

    /// Raised by Python itself (object construction, the datetime helper).
    /// Surfaces unchanged.
    #[error(transparent)]
    Python(#[from] PyErr),
}

impl BridgeError {
    pub fn accessor(accessor: Accessor, index: usize, status: AccessorStatus) -> Self {
        BridgeError::AccessorFailure {
            accessor,
            index,
            status: status.0,
        }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        BridgeError::Internal {
            context: context.into(),
        }
    }
}

impl From<BridgeError> for PyErr {
    fn from(err: BridgeError) -> PyErr {
        let msg = err.to_string();
        match err {
            BridgeError::AccessorFailure { .. } => AccessorFailureError::new_err(msg),
            BridgeError::UnsupportedDatatype { .. } => UnsupportedDatatypeError::new_err(msg),
            BridgeError::Resolution { source, .. } => {
                let err = ResolutionError::new_err(msg);
                Python::with_gil(|py| err.set_cause(py, Some(source)));
                err
            }
            BridgeError::Internal { .. } => InternalConversionError::new_err(msg),
            BridgeError::Python(e) => e,
        }
    }
}

/// Guarantee a pending Python exception before an export returns NULL.
///
/// A failure that left nothing set gets a generic `InternalConversionError`
/// carrying `context`.
pub fn ensure_error_set(py: Python<'_>, context: &str) {
    if PyErr::occurred(py) {
        return;
    }
    InternalConversionError::new_err(context.to_owned()).restore(py);
}

// ==================== Thread-local Last Error ====================

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message in thread-local storage.
pub fn set_last_error(msg: impl Into<String>) {
    let msg = msg.into();
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the thread-local error.
pub fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Copy of the last error message on this thread, if any.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|s| s.to_string_lossy().into_owned())
    })
}

/// Get a pointer to the last error message, or null if none.
///
/// The returned pointer is valid until the next failing export on this
/// thread. Do NOT free this pointer.
#[no_mangle]
pub extern "C" fn bridge_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |s| s.as_ptr())
    })
}

/// Clear the last error message.
#[no_mangle]
pub extern "C" fn bridge_last_error_clear() {
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_failure_maps_to_specific_class() {
        Python::with_gil(|py| {
            let err: PyErr =
                BridgeError::accessor(Accessor::Bool, 0, AccessorStatus(-1)).into();
            assert!(err.is_instance_of::<AccessorFailureError>(py));
            assert!(err.is_instance_of::<InternalConversionError>(py));
            assert!(err.to_string().contains("Internal error getting bool"));
        });
    }

    #[test]
    fn python_errors_pass_through() {
        Python::with_gil(|py| {
            let original = pyo3::exceptions::PyValueError::new_err("bad month");
            let err: PyErr = BridgeError::from(original).into();
            assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
            assert!(!err.is_instance_of::<InternalConversionError>(py));
        });
    }

    #[test]
    fn ensure_error_set_only_fills_gaps() {
        Python::with_gil(|py| {
            ensure_error_set(py, "Internal error converting an array Element");
            let err = PyErr::take(py).expect("error was synthesized");
            assert!(err.is_instance_of::<InternalConversionError>(py));

            pyo3::exceptions::PyKeyError::new_err("x").restore(py);
            ensure_error_set(py, "unused");
            let err = PyErr::take(py).expect("original error kept");
            assert!(err.is_instance_of::<pyo3::exceptions::PyKeyError>(py));
        });
    }

    #[test]
    fn last_error_roundtrip() {
        set_last_error("boom");
        assert_eq!(last_error().as_deref(), Some("boom"));
        assert!(!bridge_last_error().is_null());
        bridge_last_error_clear();
        assert_eq!(last_error(), None);
        assert!(bridge_last_error().is_null());
    }
}
