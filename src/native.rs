//! `SchemaElement` over a borrowed native `blpapi_Element_t*`.
//!
//! Linked against `blpapi3_64` / `blpapi3_32` by `build.rs` when the
//! `native` feature is on.

#![allow(non_camel_case_types)]

use std::ffi::CStr;
use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_int};
use std::ptr::NonNull;

use crate::datatype::HighPrecisionDatetime;
use crate::element::{AccessorStatus, SchemaElement};

#[repr(C)]
pub struct blpapi_Element_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
pub struct blpapi_SchemaElementDefinition_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
pub struct blpapi_SchemaTypeDefinition_t {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

extern "C" {
    fn blpapi_Element_nameString(element: *const blpapi_Element_t) -> *const c_char;
    fn blpapi_Element_definition(
        element: *const blpapi_Element_t,
    ) -> *mut blpapi_SchemaElementDefinition_t;
    fn blpapi_Element_datatype(element: *const blpapi_Element_t) -> c_int;
    fn blpapi_Element_isComplexType(element: *const blpapi_Element_t) -> c_int;
    fn blpapi_Element_isArray(element: *const blpapi_Element_t) -> c_int;
    fn blpapi_Element_isNull(element: *const blpapi_Element_t) -> c_int;
    fn blpapi_Element_numValues(element: *const blpapi_Element_t) -> usize;
    fn blpapi_Element_numElements(element: *const blpapi_Element_t) -> usize;

    fn blpapi_Element_getElementAt(
        element: *const blpapi_Element_t,
        result: *mut *mut blpapi_Element_t,
        position: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsBool(
        element: *const blpapi_Element_t,
        buffer: *mut c_int,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsInt64(
        element: *const blpapi_Element_t,
        buffer: *mut i64,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsFloat64(
        element: *const blpapi_Element_t,
        buffer: *mut f64,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsString(
        element: *const blpapi_Element_t,
        buffer: *mut *const c_char,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsBytes(
        element: *const blpapi_Element_t,
        buffer: *mut *const c_char,
        length: *mut usize,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsHighPrecisionDatetime(
        element: *const blpapi_Element_t,
        buffer: *mut HighPrecisionDatetime,
        index: usize,
    ) -> c_int;
    fn blpapi_Element_getValueAsElement(
        element: *const blpapi_Element_t,
        buffer: *mut *mut blpapi_Element_t,
        index: usize,
    ) -> c_int;

    fn blpapi_SchemaElementDefinition_type(
        definition: *const blpapi_SchemaElementDefinition_t,
    ) -> *mut blpapi_SchemaTypeDefinition_t;
    fn blpapi_SchemaTypeDefinition_isComplexType(
        definition: *const blpapi_SchemaTypeDefinition_t,
    ) -> c_int;
}

/// A native element borrowed for `'a`. Copying it copies the pointer only.
#[derive(Debug, Clone, Copy)]
pub struct NativeElement<'a> {
    ptr: NonNull<blpapi_Element_t>,
    _owner: PhantomData<&'a blpapi_Element_t>,
}

impl<'a> NativeElement<'a> {
    /// # Safety
    /// `ptr` must be null or a valid element that outlives `'a`.
    pub unsafe fn from_ptr(ptr: *mut blpapi_Element_t) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            _owner: PhantomData,
        })
    }

    fn raw(&self) -> *const blpapi_Element_t {
        self.ptr.as_ptr()
    }

    fn child(&self, ptr: *mut blpapi_Element_t) -> Result<Self, AccessorStatus> {
        // SAFETY: children are owned by the same message as the parent.
        unsafe { Self::from_ptr(ptr) }.ok_or(AccessorStatus(-1))
    }
}

impl<'a> SchemaElement for NativeElement<'a> {
    fn is_complex_type(&self) -> bool {
        unsafe { blpapi_Element_isComplexType(self.raw()) != 0 }
    }

    fn is_array(&self) -> bool {
        unsafe { blpapi_Element_isArray(self.raw()) != 0 }
    }

    fn is_null(&self) -> bool {
        unsafe { blpapi_Element_isNull(self.raw()) != 0 }
    }

    fn datatype(&self) -> i32 {
        unsafe { blpapi_Element_datatype(self.raw()) }
    }

    fn num_values(&self) -> usize {
        unsafe { blpapi_Element_numValues(self.raw()) }
    }

    fn num_elements(&self) -> usize {
        unsafe { blpapi_Element_numElements(self.raw()) }
    }

    fn name(&self) -> &[u8] {
        let name = unsafe { blpapi_Element_nameString(self.raw()) };
        if name.is_null() {
            return &[];
        }
        unsafe { CStr::from_ptr(name) }.to_bytes()
    }

    fn type_is_complex(&self) -> bool {
        unsafe {
            let definition = blpapi_Element_definition(self.raw());
            if definition.is_null() {
                return false;
            }
            let type_definition = blpapi_SchemaElementDefinition_type(definition);
            !type_definition.is_null()
                && blpapi_SchemaTypeDefinition_isComplexType(type_definition) != 0
        }
    }

    fn value_as_bool(&self, index: usize) -> Result<bool, AccessorStatus> {
        let mut value: c_int = 0;
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsBool(self.raw(), &mut value, index)
        })?;
        Ok(value != 0)
    }

    fn value_as_int64(&self, index: usize) -> Result<i64, AccessorStatus> {
        let mut value: i64 = 0;
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsInt64(self.raw(), &mut value, index)
        })?;
        Ok(value)
    }

    fn value_as_float64(&self, index: usize) -> Result<f64, AccessorStatus> {
        let mut value: f64 = 0.0;
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsFloat64(self.raw(), &mut value, index)
        })?;
        Ok(value)
    }

    fn value_as_string(&self, index: usize) -> Result<&[u8], AccessorStatus> {
        let mut value: *const c_char = std::ptr::null();
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsString(self.raw(), &mut value, index)
        })?;
        if value.is_null() {
            return Ok(&[]);
        }
        Ok(unsafe { CStr::from_ptr(value) }.to_bytes())
    }

    fn value_as_bytes(&self, index: usize) -> Result<&[u8], AccessorStatus> {
        let mut value: *const c_char = std::ptr::null();
        let mut length: usize = 0;
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsBytes(self.raw(), &mut value, &mut length, index)
        })?;
        if value.is_null() || length == 0 {
            return Ok(&[]);
        }
        Ok(unsafe { std::slice::from_raw_parts(value.cast::<u8>(), length) })
    }

    fn value_as_high_precision_datetime(
        &self,
        index: usize,
    ) -> Result<HighPrecisionDatetime, AccessorStatus> {
        let mut value = HighPrecisionDatetime::default();
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsHighPrecisionDatetime(self.raw(), &mut value, index)
        })?;
        Ok(value)
    }

    fn element_at(&self, position: usize) -> Result<Self, AccessorStatus> {
        let mut child: *mut blpapi_Element_t = std::ptr::null_mut();
        AccessorStatus::check(unsafe {
            blpapi_Element_getElementAt(self.raw(), &mut child, position)
        })?;
        self.child(child)
    }

    fn value_as_element(&self, index: usize) -> Result<Self, AccessorStatus> {
        let mut child: *mut blpapi_Element_t = std::ptr::null_mut();
        AccessorStatus::check(unsafe {
            blpapi_Element_getValueAsElement(self.raw(), &mut child, index)
        })?;
        self.child(child)
    }
}
