//! Element to Python value conversion.
//!
//! [`element_to_py`] classifies an element once and hands it to exactly one
//! of the record, array or scalar converters; records and arrays of records
//! recurse back through it. Every converter builds owned `Bound` values, so
//! on the first failure anything already converted is dropped (and
//! decref'd) before the error propagates. Nothing partial is returned.

use pyo3::exceptions::PyUnicodeDecodeError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyList, PyString};
use tracing::{trace, warn};

use crate::datatype::DataType;
use crate::datetime::{default_adapter, DatetimeAdapter};
use crate::element::{Accessor, AccessorStatus, SchemaElement, Shape};
use crate::error::{BridgeError, Result};

/// Convert an element with the process-wide datetime adapter.
pub fn element_to_py<'py, E: SchemaElement>(
    py: Python<'py>,
    element: &E,
) -> Result<Bound<'py, PyAny>> {
    Converter::new(default_adapter()).element_to_py(py, element)
}

/// Converter bound to one datetime adapter.
#[derive(Clone, Copy)]
pub struct Converter<'a> {
    datetimes: &'a DatetimeAdapter,
}

impl<'a> Converter<'a> {
    pub fn new(datetimes: &'a DatetimeAdapter) -> Self {
        Self { datetimes }
    }

    /// Top-level dispatch.
    pub fn element_to_py<'py, E: SchemaElement>(
        &self,
        py: Python<'py>,
        element: &E,
    ) -> Result<Bound<'py, PyAny>> {
        let shape = Shape::of(element);
        trace!(?shape, "converting element");
        match shape {
            Shape::Complex => self.complex_to_py(py, element).map(Bound::into_any),
            Shape::Array => self.array_to_py(py, element).map(Bound::into_any),
            Shape::Null => Ok(py.None().into_bound(py)),
            Shape::Scalar => self.scalar_to_py(py, element, 0),
        }
    }

    /// Record: sub-element name to converted value, in native order. A
    /// repeated name keeps the later value.
    pub fn complex_to_py<'py, E: SchemaElement>(
        &self,
        py: Python<'py>,
        element: &E,
    ) -> Result<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        for position in 0..element.num_elements() {
            let sub = element
                .element_at(position)
                .map_err(|status| BridgeError::accessor(Accessor::ElementAt, position, status))?;
            let name = utf8_to_py(py, sub.name())?;
            let value = self.element_to_py(py, &sub)?;
            dict.set_item(name, value)?;
        }
        Ok(dict)
    }

    /// Array: one entry per value, in native order. The schema type decides
    /// once whether the values are records or scalars.
    pub fn array_to_py<'py, E: SchemaElement>(
        &self,
        py: Python<'py>,
        element: &E,
    ) -> Result<Bound<'py, PyList>> {
        let count = element.num_values();
        let mut values = Vec::with_capacity(count);
        if element.type_is_complex() {
            for index in 0..count {
                let item = element.value_as_element(index).map_err(|status| {
                    BridgeError::accessor(Accessor::ValueAsElement, index, status)
                })?;
                values.push(self.element_to_py(py, &item)?);
            }
        } else {
            for index in 0..count {
                values.push(self.scalar_to_py(py, element, index)?);
            }
        }
        Ok(PyList::new(py, values)?)
    }

    /// One scalar value at `index`, by declared datatype.
    pub fn scalar_to_py<'py, E: SchemaElement>(
        &self,
        py: Python<'py>,
        element: &E,
        index: usize,
    ) -> Result<Bound<'py, PyAny>> {
        let tag = element.datatype();
        let Some(datatype) = DataType::from_raw(tag) else {
            warn!(tag, "unknown datatype tag on scalar path");
            return Err(BridgeError::UnsupportedDatatype { tag });
        };
        let failed = |accessor: Accessor| {
            move |status: AccessorStatus| BridgeError::accessor(accessor, index, status)
        };

        match datatype {
            DataType::Bool => {
                let value = element.value_as_bool(index).map_err(failed(Accessor::Bool))?;
                Ok(PyBool::new(py, value).to_owned().into_any())
            }
            DataType::Byte | DataType::Int32 | DataType::Int64 => {
                let value = element.value_as_int64(index).map_err(failed(Accessor::Int64))?;
                let value = match value.into_pyobject(py) {
                    Ok(int) => int,
                    Err(never) => match never {},
                };
                Ok(value.into_any())
            }
            DataType::Float32 | DataType::Float64 => {
                let value = element
                    .value_as_float64(index)
                    .map_err(failed(Accessor::Float64))?;
                Ok(PyFloat::new(py, value).into_any())
            }
            DataType::Char | DataType::String | DataType::Enumeration => {
                let raw = element.value_as_string(index).map_err(failed(Accessor::String))?;
                Ok(utf8_to_py(py, raw)?.into_any())
            }
            DataType::ByteArray => {
                let raw = element.value_as_bytes(index).map_err(failed(Accessor::Bytes))?;
                Ok(PyBytes::new(py, raw).into_any())
            }
            DataType::Date | DataType::Time | DataType::Datetime => {
                // Resolve before reading so a missing helper is reported
                // even for null timestamps.
                self.datetimes.helper(py)?;
                let value = element
                    .value_as_high_precision_datetime(index)
                    .map_err(failed(Accessor::HighPrecisionDatetime))?;
                self.datetimes.to_py(py, &value)
            }
            DataType::Decimal
            | DataType::Sequence
            | DataType::Choice
            | DataType::CorrelationId => {
                warn!(%datatype, "datatype reached scalar conversion");
                Err(BridgeError::UnsupportedDatatype { tag })
            }
        }
    }
}

/// Strict UTF-8 decode; invalid input raises `UnicodeDecodeError`.
fn utf8_to_py<'py>(py: Python<'py>, raw: &[u8]) -> Result<Bound<'py, PyString>> {
    match std::str::from_utf8(raw) {
        Ok(text) => Ok(PyString::new(py, text)),
        Err(e) => {
            let exc = PyUnicodeDecodeError::new_utf8(py, raw, e)?;
            Err(PyErr::from_value(exc.into_any()).into())
        }
    }
}
