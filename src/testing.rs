//! In-memory elements and a stand-in datetime helper, for exercising the
//! converters without the native library.
//!
//! `MockElement` counts accessor calls and can be told to fail a given
//! accessor, which is how the failure paths are tested.

use std::cell::Cell;
use std::ffi::CString;

use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::config::DatetimeHelperPath;
use crate::datatype::{DataType, HighPrecisionDatetime};
use crate::element::{Accessor, AccessorStatus, SchemaElement};

/// Status reported by an injected failure.
pub const INJECTED_FAILURE: AccessorStatus = AccessorStatus(-1);
/// Status reported for an index past the end, or a value of the wrong kind.
pub const BAD_INDEX: AccessorStatus = AccessorStatus(-2);

#[derive(Debug)]
pub enum MockValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Vec<u8>),
    Bytes(Vec<u8>),
    Datetime(HighPrecisionDatetime),
    Element(MockElement),
}

#[derive(Debug)]
pub struct MockElement {
    name: Vec<u8>,
    datatype: i32,
    complex: bool,
    array: bool,
    null: bool,
    type_complex: bool,
    values: Vec<MockValue>,
    children: Vec<MockElement>,
    failures: Vec<Accessor>,
    accessor_calls: Cell<usize>,
    datatype_calls: Cell<usize>,
}

impl MockElement {
    fn scalar(name: &str, datatype: DataType, value: MockValue) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            datatype: datatype.as_raw(),
            complex: false,
            array: false,
            null: false,
            type_complex: false,
            values: vec![value],
            children: Vec::new(),
            failures: Vec::new(),
            accessor_calls: Cell::new(0),
            datatype_calls: Cell::new(0),
        }
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self::scalar(name, DataType::Bool, MockValue::Bool(value))
    }

    pub fn int64(name: &str, value: i64) -> Self {
        Self::scalar(name, DataType::Int64, MockValue::Int(value))
    }

    pub fn float64(name: &str, value: f64) -> Self {
        Self::scalar(name, DataType::Float64, MockValue::Float(value))
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self::raw_string(name, value.as_bytes().to_vec())
    }

    /// String element whose bytes need not be valid UTF-8.
    pub fn raw_string(name: &str, value: Vec<u8>) -> Self {
        Self::scalar(name, DataType::String, MockValue::Text(value))
    }

    pub fn bytes(name: &str, value: &[u8]) -> Self {
        Self::scalar(name, DataType::ByteArray, MockValue::Bytes(value.to_vec()))
    }

    pub fn datetime(name: &str, datatype: DataType, value: HighPrecisionDatetime) -> Self {
        Self::scalar(name, datatype, MockValue::Datetime(value))
    }

    /// Sequence-typed record with the given sub-elements, in order.
    pub fn record(name: &str, children: Vec<MockElement>) -> Self {
        Self {
            complex: true,
            type_complex: true,
            values: Vec::new(),
            children,
            ..Self::scalar(name, DataType::Sequence, MockValue::Int(0))
        }
    }

    /// Choice-typed record holding its single selected alternative.
    pub fn choice(name: &str, selection: MockElement) -> Self {
        Self::record(name, vec![selection]).with_datatype(DataType::Choice)
    }

    /// Array of scalars of one datatype.
    pub fn array(name: &str, datatype: DataType, values: Vec<MockValue>) -> Self {
        Self {
            array: true,
            values,
            ..Self::scalar(name, datatype, MockValue::Int(0))
        }
    }

    pub fn int_array(name: &str, values: &[i64]) -> Self {
        Self::array(
            name,
            DataType::Int64,
            values.iter().copied().map(MockValue::Int).collect(),
        )
    }

    /// Array whose schema type is complex; each value is a record.
    pub fn record_array(name: &str, records: Vec<MockElement>) -> Self {
        Self {
            array: true,
            type_complex: true,
            values: records.into_iter().map(MockValue::Element).collect(),
            ..Self::scalar(name, DataType::Sequence, MockValue::Int(0))
        }
    }

    /// Mark the element null. Arrays and records lose their contents, as
    /// null native elements report no values or sub-elements.
    pub fn into_null(mut self) -> Self {
        self.null = true;
        if self.array || self.complex {
            self.values.clear();
            self.children.clear();
        }
        self
    }

    /// Replace the name with bytes that need not be valid UTF-8.
    pub fn with_raw_name(mut self, name: Vec<u8>) -> Self {
        self.name = name;
        self
    }

    pub fn with_datatype(self, datatype: DataType) -> Self {
        self.with_raw_datatype(datatype.as_raw())
    }

    pub fn with_raw_datatype(mut self, tag: i32) -> Self {
        self.datatype = tag;
        self
    }

    /// Make `accessor` report [`INJECTED_FAILURE`] on this element.
    pub fn failing(mut self, accessor: Accessor) -> Self {
        self.failures.push(accessor);
        self
    }

    /// Value and child accessor calls made so far.
    pub fn accessor_calls(&self) -> usize {
        self.accessor_calls.get()
    }

    pub fn datatype_calls(&self) -> usize {
        self.datatype_calls.get()
    }

    fn enter(&self, accessor: Accessor) -> Result<(), AccessorStatus> {
        self.accessor_calls.set(self.accessor_calls.get() + 1);
        if self.failures.contains(&accessor) {
            Err(INJECTED_FAILURE)
        } else {
            Ok(())
        }
    }

    fn value(&self, accessor: Accessor, index: usize) -> Result<&MockValue, AccessorStatus> {
        self.enter(accessor)?;
        self.values.get(index).ok_or(BAD_INDEX)
    }
}

impl<'a> SchemaElement for &'a MockElement {
    fn is_complex_type(&self) -> bool {
        self.complex
    }

    fn is_array(&self) -> bool {
        self.array
    }

    fn is_null(&self) -> bool {
        self.null
    }

    fn datatype(&self) -> i32 {
        self.datatype_calls.set(self.datatype_calls.get() + 1);
        self.datatype
    }

    fn num_values(&self) -> usize {
        if self.complex {
            1
        } else {
            self.values.len()
        }
    }

    fn num_elements(&self) -> usize {
        self.children.len()
    }

    fn name(&self) -> &[u8] {
        &self.name
    }

    fn type_is_complex(&self) -> bool {
        self.type_complex
    }

    fn value_as_bool(&self, index: usize) -> Result<bool, AccessorStatus> {
        match self.value(Accessor::Bool, index)? {
            MockValue::Bool(v) => Ok(*v),
            _ => Err(BAD_INDEX),
        }
    }

    fn value_as_int64(&self, index: usize) -> Result<i64, AccessorStatus> {
        match self.value(Accessor::Int64, index)? {
            MockValue::Int(v) => Ok(*v),
            MockValue::Bool(v) => Ok(i64::from(*v)),
            _ => Err(BAD_INDEX),
        }
    }

    fn value_as_float64(&self, index: usize) -> Result<f64, AccessorStatus> {
        match self.value(Accessor::Float64, index)? {
            MockValue::Float(v) => Ok(*v),
            MockValue::Int(v) => Ok(*v as f64),
            _ => Err(BAD_INDEX),
        }
    }

    fn value_as_string(&self, index: usize) -> Result<&[u8], AccessorStatus> {
        match self.value(Accessor::String, index)? {
            MockValue::Text(v) => Ok(v.as_slice()),
            _ => Err(BAD_INDEX),
        }
    }

    fn value_as_bytes(&self, index: usize) -> Result<&[u8], AccessorStatus> {
        match self.value(Accessor::Bytes, index)? {
            MockValue::Bytes(v) => Ok(v.as_slice()),
            _ => Err(BAD_INDEX),
        }
    }

    fn value_as_high_precision_datetime(
        &self,
        index: usize,
    ) -> Result<HighPrecisionDatetime, AccessorStatus> {
        match self.value(Accessor::HighPrecisionDatetime, index)? {
            MockValue::Datetime(v) => Ok(*v),
            _ => Err(BAD_INDEX),
        }
    }

    fn element_at(&self, position: usize) -> Result<Self, AccessorStatus> {
        let element: &'a MockElement = *self;
        element.enter(Accessor::ElementAt)?;
        element.children.get(position).ok_or(BAD_INDEX)
    }

    fn value_as_element(&self, index: usize) -> Result<Self, AccessorStatus> {
        let element: &'a MockElement = *self;
        match element.value(Accessor::ValueAsElement, index)? {
            MockValue::Element(e) => Ok(e),
            _ => Err(BAD_INDEX),
        }
    }
}

// ==================== Datetime Helper ====================

/// Python source of a stand-in for `_DatetimeUtil.toPyTimeFromInts`.
/// `Util.calls` counts invocations.
pub const DATETIME_HELPER_SOURCE: &str = r#"
import datetime as _dt


class Util:
    calls = 0

    @staticmethod
    def build(parts, offset, year, month, day, hours, minutes, seconds, useconds):
        Util.calls += 1
        tz = _dt.timezone(_dt.timedelta(minutes=offset)) if parts & 0x8 else None
        has_date = (parts & 0x7) == 0x7
        has_time = (parts & 0xF0) != 0
        if has_date and has_time:
            return _dt.datetime(year, month, day, hours, minutes, seconds, useconds, tz)
        if has_date:
            return _dt.date(year, month, day)
        return _dt.time(hours, minutes, seconds, useconds, tz)
"#;

/// Register the stand-in helper as module `module_name` in `sys.modules`
/// and return the path that resolves to it.
pub fn install_datetime_helper(py: Python<'_>, module_name: &str) -> PyResult<DatetimeHelperPath> {
    let code = CString::new(DATETIME_HELPER_SOURCE)?;
    let file = CString::new(format!("{module_name}.py"))?;
    let name = CString::new(module_name)?;
    let module = PyModule::from_code(py, &code, &file, &name)?;
    py.import("sys")?
        .getattr("modules")?
        .set_item(module_name, module)?;
    Ok(DatetimeHelperPath::new(module_name, "Util", "build"))
}

/// How many times the helper in `module_name` has been called.
pub fn helper_calls(py: Python<'_>, module_name: &str) -> usize {
    py.import(module_name)
        .and_then(|m| m.getattr("Util"))
        .and_then(|util| util.getattr("calls"))
        .and_then(|calls| calls.extract())
        .unwrap_or(0)
}
