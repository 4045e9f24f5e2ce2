//! Native datatype tags and datetime layouts.
//!
//! Numeric values match `blpapi_types.h` / `blpapi_datetime.h`; the structs
//! are `#[repr(C)]` so a native accessor can write straight into them.

use std::fmt;

/// Datatype tag of an element, as reported by `blpapi_Element_datatype`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 1,
    Char = 2,
    /// Unsigned 8 bit value.
    Byte = 3,
    Int32 = 4,
    Int64 = 5,
    Float32 = 6,
    Float64 = 7,
    String = 8,
    ByteArray = 9,
    Date = 10,
    Time = 11,
    /// Currently unsupported by the native library.
    Decimal = 12,
    Datetime = 13,
    Enumeration = 14,
    Sequence = 15,
    Choice = 16,
    /// Used for some internal messages.
    CorrelationId = 17,
}

impl DataType {
    /// Map a raw tag to a `DataType`, `None` for tags this crate does not know.
    pub fn from_raw(tag: i32) -> Option<Self> {
        Some(match tag {
            1 => Self::Bool,
            2 => Self::Char,
            3 => Self::Byte,
            4 => Self::Int32,
            5 => Self::Int64,
            6 => Self::Float32,
            7 => Self::Float64,
            8 => Self::String,
            9 => Self::ByteArray,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::Decimal,
            13 => Self::Datetime,
            14 => Self::Enumeration,
            15 => Self::Sequence,
            16 => Self::Choice,
            17 => Self::CorrelationId,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "BOOL",
            Self::Char => "CHAR",
            Self::Byte => "BYTE",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::String => "STRING",
            Self::ByteArray => "BYTEARRAY",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Decimal => "DECIMAL",
            Self::Datetime => "DATETIME",
            Self::Enumeration => "ENUMERATION",
            Self::Sequence => "SEQUENCE",
            Self::Choice => "CHOICE",
            Self::CorrelationId => "CORRELATION_ID",
        };
        f.write_str(name)
    }
}

// ==================== Datetime Parts ====================

pub const DATETIME_YEAR_PART: u8 = 0x1;
pub const DATETIME_MONTH_PART: u8 = 0x2;
pub const DATETIME_DAY_PART: u8 = 0x4;
pub const DATETIME_OFFSET_PART: u8 = 0x8;
pub const DATETIME_HOURS_PART: u8 = 0x10;
pub const DATETIME_MINUTES_PART: u8 = 0x20;
pub const DATETIME_SECONDS_PART: u8 = 0x40;
pub const DATETIME_MILLISECONDS_PART: u8 = 0x80;
pub const DATETIME_FRACSECONDS_PART: u8 = 0x80;
pub const DATETIME_DATE_PART: u8 = DATETIME_YEAR_PART | DATETIME_MONTH_PART | DATETIME_DAY_PART;
pub const DATETIME_TIME_PART: u8 =
    DATETIME_HOURS_PART | DATETIME_MINUTES_PART | DATETIME_SECONDS_PART;
pub const DATETIME_TIMEMILLI_PART: u8 = DATETIME_TIME_PART | DATETIME_MILLISECONDS_PART;
pub const DATETIME_TIMEFRACSECONDS_PART: u8 = DATETIME_TIME_PART | DATETIME_FRACSECONDS_PART;

/// `blpapi_Datetime_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Datetime {
    pub parts: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub milli_seconds: u16,
    pub month: u8,
    pub day: u8,
    pub year: u16,
    /// Offset from UTC in minutes.
    pub offset: i16,
}

/// `blpapi_HighPrecisionDatetime_t`: a datetime plus picoseconds within
/// the current millisecond.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighPrecisionDatetime {
    pub datetime: Datetime,
    pub picoseconds: u32,
}

impl HighPrecisionDatetime {
    /// A timestamp with no parts set carries no value.
    pub fn has_value(&self) -> bool {
        self.datetime.parts != 0
    }

    /// Sub-second component in microseconds:
    /// `milliseconds * 1000 + picoseconds / 1_000_000`.
    pub fn microseconds(&self) -> i32 {
        i32::from(self.datetime.milli_seconds) * 1000 + (self.picoseconds / 1_000_000) as i32
    }
}
