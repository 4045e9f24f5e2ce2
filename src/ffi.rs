//! C ABI exports for the native library and the Python SDK's ctypes layer.
//!
//! Every export follows this contract:
//!
//! 1. Clears the last error
//! 2. Acquires the Python GIL (reentrant; safe on native callback threads)
//! 3. Performs the operation
//! 4. On error: stores the message via `set_last_error`, and for functions
//!    returning a Python object also leaves a Python exception set
//! 5. Releases the GIL on every path
//!
//! **Sentinel values:**
//! - Object functions (`-> *mut PyObject`): NULL means error, with a Python
//!   exception always pending
//! - Predicate functions (`-> c_int`): `1` true, `0` false
//! - `managerFunc` always returns `0`; destroy never fails
//!
//! **Ownership:**
//! - `blpapi_Element_toPy` returns a new reference; the element is borrowed.
//! - Handles passed to `managerFunc`, `setmptr` and `is_known_obj` are owned
//!   by the native side.

use std::os::raw::c_int;

use pyo3::ffi::PyObject;

use crate::error::{clear_last_error, set_last_error};
use crate::managed::{self, ManagedPtr, ReferenceCountedHandle};

// ==================== Lifetime Bridge ====================

/// Manager function installed into every handle carrying a Python object.
///
/// # Safety
/// Called by the native library with valid handle pointers.
#[export_name = "managerFunc"]
pub unsafe extern "C" fn manager_func(
    managed: *mut ManagedPtr,
    src: *const ManagedPtr,
    operation: c_int,
) -> c_int {
    if managed.is_null() {
        return 0;
    }
    unsafe { managed::manage(managed, src, operation) }
}

/// Point a handle's manager at [`manager_func`].
///
/// # Safety
/// `handle` must be null or point to a writable `ManagedPtr`.
#[no_mangle]
pub unsafe extern "C" fn setmptr(handle: *mut ManagedPtr) {
    clear_last_error();
    match unsafe { handle.as_mut() } {
        Some(handle) => handle.install_bridge_manager(),
        None => set_last_error("setmptr: null managed pointer"),
    }
}

/// `1` if the handle's manager is [`manager_func`], else `0`.
///
/// Diagnostic escape hatch for handles created with a native manager
/// (recap correlation ids). Not part of the stable interface.
///
/// # Safety
/// `handle` must be null or point to a valid `ManagedPtr`.
#[no_mangle]
pub unsafe extern "C" fn is_known_obj(handle: *const ManagedPtr) -> c_int {
    match unsafe { handle.as_ref() } {
        Some(handle) => c_int::from(handle.is_managed_by_bridge()),
        None => 0,
    }
}

/// Add a reference to `obj` under the GIL. Null is ignored.
///
/// # Safety
/// `obj` must be null or a live Python object.
#[no_mangle]
pub unsafe extern "C" fn incref(obj: *mut PyObject) {
    unsafe { managed::incref(obj) }
}

// ==================== Element Conversion ====================

#[cfg(feature = "native")]
pub use self::element::element_to_py;

#[cfg(feature = "native")]
mod element {
    use pyo3::ffi::PyObject;
    use pyo3::prelude::*;

    use crate::convert;
    use crate::error::{clear_last_error, ensure_error_set, set_last_error, BridgeError};
    use crate::native::{blpapi_Element_t, NativeElement};

    /// Convert a native element into a new Python object.
    ///
    /// Returns NULL with a Python exception set on failure.
    ///
    /// # Safety
    /// `element` must be null or a valid element that outlives the call.
    #[export_name = "blpapi_Element_toPy"]
    pub unsafe extern "C" fn element_to_py(element: *mut blpapi_Element_t) -> *mut PyObject {
        clear_last_error();
        Python::with_gil(|py| {
            let result = match unsafe { NativeElement::from_ptr(element) } {
                Some(element) => convert::element_to_py(py, &element),
                None => Err(BridgeError::internal("Internal error in `Element.toPy`: null element")),
            };
            match result {
                Ok(obj) => obj.into_ptr(),
                Err(e) => {
                    set_last_error(e.to_string());
                    PyErr::from(e).restore(py);
                    ensure_error_set(py, "Internal error converting an Element");
                    std::ptr::null_mut()
                }
            }
        })
    }
}
