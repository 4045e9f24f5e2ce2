//! `blpapi.ffiutils` extension module.
//!
//! Python callers get the manual reference increment and the conversion
//! error classes. Conversion itself is reached through the
//! `blpapi_Element_toPy` C export; `is_known_obj` is C-only because it
//! dereferences a raw handle address.

use pyo3::prelude::*;

use crate::error::{
    AccessorFailureError, InternalConversionError, ResolutionError, UnsupportedDatatypeError,
};
use crate::managed;

/// Add one reference to `obj` on behalf of the native side.
#[pyfunction]
#[pyo3(name = "incref")]
fn py_incref(obj: &Bound<'_, PyAny>) {
    // SAFETY: `obj` is alive for the duration of the call.
    unsafe { managed::incref(obj.as_ptr()) }
}

#[pymodule]
fn ffiutils(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add_function(wrap_pyfunction!(py_incref, m)?)?;
    m.add(
        "InternalConversionError",
        py.get_type::<InternalConversionError>(),
    )?;
    m.add("AccessorFailureError", py.get_type::<AccessorFailureError>())?;
    m.add(
        "UnsupportedDatatypeError",
        py.get_type::<UnsupportedDatatypeError>(),
    )?;
    m.add("ResolutionError", py.get_type::<ResolutionError>())?;
    Ok(())
}
