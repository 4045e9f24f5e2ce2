//! blpapi-pybridge: BLPAPI element ↔ Python bridge.
//!
//! This crate builds the `blpapi.ffiutils` extension (`cdylib`) used by the
//! BLPAPI Python SDK. It embeds no session logic; it exposes C ABI functions
//! and PyO3 helpers for:
//!
//! - Element conversion: complex elements become `dict`, arrays `list`,
//!   scalars the matching `bool`/`int`/`float`/`str`/`bytes`/datetime value,
//!   null elements `None`
//! - Managed pointers: the manager callback that keeps Python objects stored
//!   in native correlation ids alive exactly as long as their copies
//! - Error handling (typed Python exceptions plus a thread-local last-error)
//!
//! Native elements are read through the [`element::SchemaElement`] trait;
//! the `native` feature links `blpapi3` and provides the real implementation,
//! the `testing` feature an in-memory one (`testing::MockElement`).

pub mod config;
pub mod convert;
pub mod datatype;
pub mod datetime;
pub mod element;
pub mod error;
pub mod ffi;
pub mod managed;
#[cfg(feature = "native")]
pub mod native;
pub mod pymodule;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use convert::{element_to_py, Converter};
pub use element::{SchemaElement, Shape};
pub use error::{BridgeError, Result};
pub use managed::{ManagedPtr, ReferenceCountedHandle};
