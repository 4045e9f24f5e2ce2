use std::ffi::CString;
use std::os::raw::c_int;

use blpapi_pybridge::ffi::{incref, is_known_obj, manager_func, setmptr};
use blpapi_pybridge::managed::{ManagedPtr, ManagerFunction, MANAGEDPTR_COPY, MANAGEDPTR_DESTROY};
use blpapi_pybridge::ReferenceCountedHandle;
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyList, PyModule, PyTuple};

/// What a correlation id does when handed a Python object: take a reference,
/// store the pointer, install the manager.
fn correlation_handle(obj: &Bound<'_, PyAny>) -> ManagedPtr {
    let mut handle = ManagedPtr::empty();
    handle.pointer = obj.as_ptr().cast();
    unsafe {
        incref(obj.as_ptr());
        setmptr(&mut handle);
    }
    handle
}

fn run(handle: &mut ManagedPtr, src: *const ManagedPtr, operation: c_int) {
    let manager = handle.manager.expect("manager installed");
    let rc = unsafe { manager(handle, src, operation) };
    assert_eq!(rc, 0);
}

#[test]
fn copies_track_live_handles() {
    Python::with_gil(|py| {
        let obj = PyList::empty(py).into_any();
        let before = obj.get_refcnt();
        let mut original = correlation_handle(&obj);
        assert_eq!(obj.get_refcnt(), before + 1);

        let mut a = ManagedPtr::empty();
        a.manager = original.manager;
        run(&mut a, &original, MANAGEDPTR_COPY);
        let mut b = ManagedPtr::empty();
        b.manager = original.manager;
        run(&mut b, &a, MANAGEDPTR_COPY);
        assert_eq!(obj.get_refcnt(), before + 3);

        run(&mut a, std::ptr::null(), MANAGEDPTR_DESTROY);
        run(&mut b, std::ptr::null(), MANAGEDPTR_DESTROY);
        assert_eq!(obj.get_refcnt(), before + 1);

        run(&mut original, std::ptr::null(), MANAGEDPTR_DESTROY);
        assert_eq!(obj.get_refcnt(), before);
    });
}

#[test]
fn manager_runs_on_a_native_thread() {
    Python::with_gil(|py| {
        let obj = PyList::empty(py).into_any();
        let before = obj.get_refcnt();
        let original = correlation_handle(&obj);

        // The native library calls the manager from its own threads, which
        // never hold the GIL on entry.
        let address = &original as *const ManagedPtr as usize;
        py.allow_threads(|| {
            std::thread::spawn(move || {
                let src = address as *const ManagedPtr;
                let mut copy = ManagedPtr::empty();
                unsafe {
                    manager_func(&mut copy, src, MANAGEDPTR_COPY);
                    assert_eq!(is_known_obj(&copy), 1);
                    manager_func(&mut copy, std::ptr::null(), MANAGEDPTR_DESTROY);
                }
            })
            .join()
            .unwrap();
        });
        assert_eq!(obj.get_refcnt(), before + 1);

        let mut original = original;
        original.release();
        assert_eq!(obj.get_refcnt(), before);
    });
}

#[test]
fn destroy_on_empty_handle_is_a_noop() {
    let mut handle = ManagedPtr::empty();
    unsafe {
        setmptr(&mut handle);
        assert_eq!(manager_func(&mut handle, std::ptr::null(), MANAGEDPTR_DESTROY), 0);
    }
}

#[test]
fn only_installed_handles_are_known() {
    unsafe extern "C" fn native_manager(
        _: *mut ManagedPtr,
        _: *const ManagedPtr,
        _: c_int,
    ) -> c_int {
        0
    }

    let mut ours = ManagedPtr::empty();
    let mut theirs = ManagedPtr::empty();
    theirs.manager = Some(native_manager as ManagerFunction);
    unsafe {
        setmptr(&mut ours);
        assert_eq!(is_known_obj(&ours), 1);
        assert_eq!(is_known_obj(&theirs), 0);
    }
    assert!(ours.is_managed_by_bridge());
    assert!(!theirs.is_managed_by_bridge());
}

const FINALIZER_SOURCE: &str = r#"
class Holder:
    def __init__(self, on_del):
        self.on_del = on_del

    def __del__(self):
        self.on_del()
"#;

#[test]
fn destroy_nested_in_a_finalizer_on_a_native_thread() {
    Python::with_gil(|py| {
        let code = CString::new(FINALIZER_SOURCE).unwrap();
        let file = CString::new("finalizer_holder.py").unwrap();
        let name = CString::new("finalizer_holder").unwrap();
        let module = PyModule::from_code(py, &code, &file, &name).unwrap();

        let inner = PyList::empty(py).into_any();
        let start = inner.get_refcnt();
        let inner_address = Box::into_raw(Box::new(correlation_handle(&inner))) as usize;
        assert_eq!(inner.get_refcnt(), start + 1);

        // The holder's finalizer releases the inner handle through the
        // manager, while the outer release still has the GIL.
        let on_del = PyCFunction::new_closure(py, None, None, move |_args: &Bound<'_, PyTuple>, _kwargs: Option<&Bound<'_, PyDict>>| {
            let rc = unsafe {
                manager_func(
                    inner_address as *mut ManagedPtr,
                    std::ptr::null(),
                    MANAGEDPTR_DESTROY,
                )
            };
            assert_eq!(rc, 0);
        })
        .unwrap();
        let holder = module
            .getattr("Holder")
            .unwrap()
            .call1((on_del,))
            .unwrap();
        let mut outer = correlation_handle(&holder);
        drop(holder);

        let outer_address = &mut outer as *mut ManagedPtr as usize;
        let rc = py.allow_threads(|| {
            std::thread::spawn(move || unsafe {
                manager_func(
                    outer_address as *mut ManagedPtr,
                    std::ptr::null(),
                    MANAGEDPTR_DESTROY,
                )
            })
            .join()
            .unwrap()
        });
        assert_eq!(rc, 0);
        assert_eq!(inner.get_refcnt(), start);

        drop(unsafe { Box::from_raw(inner_address as *mut ManagedPtr) });
    });
}
