//! The `SchemaElement` capability: everything the converters need to read
//! from one node of a schema-described value tree.
//!
//! Implementations borrow the node; nothing here mutates or releases it.
//! Child accessors return `Self`, so a tree is walked with a single
//! implementation type (a pointer wrapper for native elements, a reference
//! for in-memory ones).

use std::fmt;

use crate::datatype::HighPrecisionDatetime;

/// Non-zero status returned by a native accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorStatus(pub i32);

impl AccessorStatus {
    /// Turn a native return code into a `Result`.
    pub fn check(rc: i32) -> Result<(), AccessorStatus> {
        if rc == 0 {
            Ok(())
        } else {
            Err(AccessorStatus(rc))
        }
    }
}

/// Names the accessor a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    HighPrecisionDatetime,
    ElementAt,
    ValueAsElement,
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Bool => "Internal error getting bool",
            Self::Int64 => "Internal error getting int",
            Self::Float64 => "Internal error getting float",
            Self::String => "Internal error getting string",
            Self::Bytes => "Internal error getting bytes",
            Self::HighPrecisionDatetime => "Internal error getting datetime",
            Self::ElementAt => "Internal error in `Element.toPy`",
            Self::ValueAsElement => "Internal error in blpapi_Element_getValueAsElement",
        };
        f.write_str(msg)
    }
}

/// Read-only view of one element.
pub trait SchemaElement: Sized {
    fn is_complex_type(&self) -> bool;
    fn is_array(&self) -> bool;
    fn is_null(&self) -> bool;

    /// Raw datatype tag; see [`crate::datatype::DataType::from_raw`].
    fn datatype(&self) -> i32;

    fn num_values(&self) -> usize;
    fn num_elements(&self) -> usize;

    /// Raw name bytes of this element, read from the element itself. Not
    /// checked for UTF-8; the record converter decodes them.
    fn name(&self) -> &[u8];

    /// Whether this element's schema type definition is complex. For arrays
    /// this decides whether values are records or scalars.
    fn type_is_complex(&self) -> bool;

    fn value_as_bool(&self, index: usize) -> Result<bool, AccessorStatus>;
    fn value_as_int64(&self, index: usize) -> Result<i64, AccessorStatus>;
    fn value_as_float64(&self, index: usize) -> Result<f64, AccessorStatus>;
    /// Raw string bytes; only valid for the duration of the borrow.
    fn value_as_string(&self, index: usize) -> Result<&[u8], AccessorStatus>;
    fn value_as_bytes(&self, index: usize) -> Result<&[u8], AccessorStatus>;
    fn value_as_high_precision_datetime(
        &self,
        index: usize,
    ) -> Result<HighPrecisionDatetime, AccessorStatus>;

    /// Sub-element at `position` of a complex element.
    fn element_at(&self, position: usize) -> Result<Self, AccessorStatus>;
    /// Value at `index` of an array of complex values.
    fn value_as_element(&self, index: usize) -> Result<Self, AccessorStatus>;
}

/// One-shot classification of an element, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Complex,
    Array,
    Null,
    Scalar,
}

impl Shape {
    /// Complex-ness and array-ness are checked before nullness, so a null
    /// record or array keeps its shape. A null element is never asked for
    /// its datatype.
    pub fn of<E: SchemaElement>(element: &E) -> Self {
        if element.is_complex_type() {
            Shape::Complex
        } else if element.is_array() {
            Shape::Array
        } else if element.is_null() {
            Shape::Null
        } else {
            Shape::Scalar
        }
    }
}
