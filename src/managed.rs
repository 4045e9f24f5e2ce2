//! Lifetime bridge for Python objects held by native structures.
//!
//! The native library embeds a [`ManagedPtr`] in long-lived structures such
//! as correlation ids. It calls the stored manager function whenever it
//! copies or destroys one, and this module's manager keeps the referenced
//! object's refcount equal to the number of live copies (plus whatever
//! references Python code holds).
//!
//! **Locking contract:** every refcount change happens inside
//! `Python::with_gil`, which is `PyGILState_Ensure`/`Release` underneath.
//! That acquisition is reentrant, so the manager may run on a native
//! callback thread, on a thread that already holds the GIL, or nested inside
//! a GC finalizer that is itself releasing a handle. The GIL is released on
//! every return path when the scope ends.

use std::os::raw::{c_int, c_void};

use pyo3::ffi;
use pyo3::prelude::*;
use tracing::trace;

/// `BLPAPI_MANAGEDPTR_COPY`
pub const MANAGEDPTR_COPY: c_int = 1;
/// `BLPAPI_MANAGEDPTR_DESTROY`
pub const MANAGEDPTR_DESTROY: c_int = -1;

/// `blpapi_ManagedPtr_ManagerFunction_t`
pub type ManagerFunction = unsafe extern "C" fn(
    managed: *mut ManagedPtr,
    src: *const ManagedPtr,
    operation: c_int,
) -> c_int;

#[repr(C)]
#[derive(Clone, Copy)]
pub union ManagedPtrData {
    pub int_value: c_int,
    pub ptr: *mut c_void,
}

/// `blpapi_ManagedPtr_t`: a raw object pointer plus the function that
/// manages it.
#[repr(C)]
pub struct ManagedPtr {
    pub pointer: *mut c_void,
    pub user_data: [ManagedPtrData; 4],
    pub manager: Option<ManagerFunction>,
}

impl ManagedPtr {
    pub const fn empty() -> Self {
        Self {
            pointer: std::ptr::null_mut(),
            user_data: [ManagedPtrData {
                ptr: std::ptr::null_mut(),
            }; 4],
            manager: None,
        }
    }

    /// A handle carrying `obj`, managed by this bridge. Takes one reference
    /// on behalf of the handle; the matching release is `destroy`.
    pub fn for_object(obj: &Bound<'_, PyAny>) -> Self {
        let mut handle = Self::empty();
        handle.pointer = obj.as_ptr().cast();
        // SAFETY: `obj` is a live object and the GIL is held.
        unsafe { incref(obj.as_ptr()) };
        handle.install_bridge_manager();
        handle
    }

    pub fn object_ptr(&self) -> *mut ffi::PyObject {
        self.pointer.cast()
    }
}

impl Default for ManagedPtr {
    fn default() -> Self {
        Self::empty()
    }
}

/// Retain/release capability of a handle that points at a Python object.
pub trait ReferenceCountedHandle {
    /// Become a copy of `src`: same object, same manager, one more reference.
    fn retain_from(&mut self, src: &Self);

    /// Drop this handle's reference. A null object pointer is a no-op.
    /// Never fails.
    fn release(&mut self);

    /// Point the handle's manager at this bridge.
    fn install_bridge_manager(&mut self);

    /// Whether the handle's manager is this bridge's.
    ///
    /// Diagnostic only: lets callers spot handles some other manager created
    /// (recap correlation ids carry a native one) until the native side
    /// stops doing that. Not a stable guarantee.
    fn is_managed_by_bridge(&self) -> bool;
}

impl ReferenceCountedHandle for ManagedPtr {
    fn retain_from(&mut self, src: &Self) {
        Python::with_gil(|_py| {
            self.pointer = src.pointer;
            self.manager = src.manager;
            trace!(object = ?self.pointer, "managed pointer copy");
            // SAFETY: GIL held; a non-null pointer was stored from a live object.
            unsafe { ffi::Py_IncRef(self.object_ptr()) };
        })
    }

    fn release(&mut self) {
        Python::with_gil(|_py| {
            trace!(object = ?self.pointer, "managed pointer destroy");
            // SAFETY: GIL held; Py_DecRef ignores null.
            unsafe { ffi::Py_DecRef(self.object_ptr()) };
        })
    }

    fn install_bridge_manager(&mut self) {
        self.manager = Some(crate::ffi::manager_func as ManagerFunction);
    }

    fn is_managed_by_bridge(&self) -> bool {
        let ours = crate::ffi::manager_func as ManagerFunction as usize;
        self.manager.map(|f| f as usize) == Some(ours)
    }
}

/// Run one manager operation. Unknown operations are ignored.
///
/// # Safety
/// `managed` must point to a valid `ManagedPtr`; for a copy `src` must be
/// null (ignored) or valid too. They may be the same handle.
pub unsafe fn manage(
    managed: *mut ManagedPtr,
    src: *const ManagedPtr,
    operation: c_int,
) -> c_int {
    match operation {
        MANAGEDPTR_COPY if !src.is_null() => {
            if std::ptr::eq(managed, src) {
                // Self-copy keeps the pointer; only the count moves.
                let handle = unsafe { &*src };
                Python::with_gil(|_py| unsafe { ffi::Py_IncRef(handle.object_ptr()) });
            } else {
                unsafe { (*managed).retain_from(&*src) };
            }
        }
        MANAGEDPTR_DESTROY => unsafe { (*managed).release() },
        _ => {}
    }
    0
}

/// Add one reference to `obj` under the GIL. Null is ignored.
///
/// For handing an object to the native side along a path that never goes
/// through the manager's copy.
///
/// # Safety
/// `obj` must be null or point to a live Python object.
pub unsafe fn incref(obj: *mut ffi::PyObject) {
    Python::with_gil(|_py| unsafe { ffi::Py_IncRef(obj) });
}
