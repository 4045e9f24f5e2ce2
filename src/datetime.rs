//! Date/time adapter: high-precision timestamps to Python temporal objects.
//!
//! Construction is delegated to a Python helper taking nine ints
//! `(parts, offset, year, month, day, hours, minutes, seconds, microseconds)`.
//! The helper is looked up on first use and cached in a [`GILOnceCell`].
//! A failed lookup leaves the cell empty; the next conversion tries again.

use std::sync::OnceLock;

use pyo3::prelude::*;
use pyo3::sync::GILOnceCell;
use tracing::{debug, warn};

use crate::config::DatetimeHelperPath;
use crate::datatype::HighPrecisionDatetime;
use crate::error::{BridgeError, Result};

static DEFAULT_ADAPTER: OnceLock<DatetimeAdapter> = OnceLock::new();

/// The process-wide adapter used by [`crate::convert::element_to_py`].
/// Its helper path is read from the environment once.
pub fn default_adapter() -> &'static DatetimeAdapter {
    DEFAULT_ADAPTER.get_or_init(|| DatetimeAdapter::new(DatetimeHelperPath::from_env()))
}

pub struct DatetimeAdapter {
    path: DatetimeHelperPath,
    helper: GILOnceCell<Py<PyAny>>,
}

impl DatetimeAdapter {
    pub fn new(path: DatetimeHelperPath) -> Self {
        Self {
            path,
            helper: GILOnceCell::new(),
        }
    }

    pub fn path(&self) -> &DatetimeHelperPath {
        &self.path
    }

    pub fn is_resolved(&self, py: Python<'_>) -> bool {
        self.helper.get(py).is_some()
    }

    /// The cached helper, resolving it if needed.
    pub fn helper<'a>(&'a self, py: Python<'_>) -> Result<&'a Py<PyAny>> {
        self.helper.get_or_try_init(py, || self.resolve(py))
    }

    fn resolve(&self, py: Python<'_>) -> Result<Py<PyAny>> {
        let step_failed = |step: String| {
            move |source: PyErr| {
                warn!(step = %step, error = %source, "datetime helper resolution failed");
                BridgeError::Resolution { step, source }
            }
        };

        let module = py
            .import(self.path.module.as_str())
            .map_err(step_failed(self.path.module.clone()))?;
        let util = module
            .getattr(self.path.attribute.as_str())
            .map_err(step_failed(self.path.attribute.clone()))?;
        let function = util
            .getattr(self.path.function.as_str())
            .map_err(step_failed(format!("'{}'", self.path.function)))?;

        debug!(
            module = %self.path.module,
            attribute = %self.path.attribute,
            function = %self.path.function,
            "resolved datetime helper"
        );
        Ok(function.unbind())
    }

    /// Convert one timestamp. No parts means no value: returns `None`
    /// without calling the helper.
    pub fn to_py<'py>(
        &self,
        py: Python<'py>,
        value: &HighPrecisionDatetime,
    ) -> Result<Bound<'py, PyAny>> {
        let helper = self.helper(py)?;
        if !value.has_value() {
            return Ok(py.None().into_bound(py));
        }
        let dt = &value.datetime;
        let args = (
            i32::from(dt.parts),
            i32::from(dt.offset),
            i32::from(dt.year),
            i32::from(dt.month),
            i32::from(dt.day),
            i32::from(dt.hours),
            i32::from(dt.minutes),
            i32::from(dt.seconds),
            value.microseconds(),
        );
        Ok(helper.bind(py).call1(args)?)
    }
}
