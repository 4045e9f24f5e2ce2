//! Where the datetime construction helper lives.
//!
//! The default points at `blpapi.datetime._DatetimeUtil.toPyTimeFromInts`.
//! `BLPAPI_PY_DATETIME_HELPER=module:Attribute.function` overrides it.

use tracing::warn;

pub const DATETIME_HELPER_ENV: &str = "BLPAPI_PY_DATETIME_HELPER";

/// Three-step lookup path: import `module`, get `attribute` from it, get
/// `function` from that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatetimeHelperPath {
    pub module: String,
    pub attribute: String,
    pub function: String,
}

impl Default for DatetimeHelperPath {
    fn default() -> Self {
        Self {
            module: "blpapi.datetime".to_owned(),
            attribute: "_DatetimeUtil".to_owned(),
            function: "toPyTimeFromInts".to_owned(),
        }
    }
}

impl DatetimeHelperPath {
    pub fn new(
        module: impl Into<String>,
        attribute: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            attribute: attribute.into(),
            function: function.into(),
        }
    }

    /// Parse `module:Attribute.function`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (module, rest) = spec.trim().split_once(':')?;
        let (attribute, function) = rest.rsplit_once('.')?;
        if module.is_empty() || attribute.is_empty() || function.is_empty() {
            return None;
        }
        Some(Self::new(module, attribute, function))
    }

    /// Read the override from the environment, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(DATETIME_HELPER_ENV) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                warn!(
                    value = %value,
                    "ignoring malformed {DATETIME_HELPER_ENV}, expected module:Attribute.function"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module_attribute_function() {
        let path = DatetimeHelperPath::parse("pkg.mod:Util.build").unwrap();
        assert_eq!(path, DatetimeHelperPath::new("pkg.mod", "Util", "build"));
    }

    #[test]
    fn rejects_incomplete_specs() {
        assert_eq!(DatetimeHelperPath::parse("pkg.mod"), None);
        assert_eq!(DatetimeHelperPath::parse("pkg.mod:Util"), None);
        assert_eq!(DatetimeHelperPath::parse(":Util.build"), None);
        assert_eq!(DatetimeHelperPath::parse("m:.build"), None);
    }

    #[test]
    fn default_targets_blpapi_datetime() {
        let path = DatetimeHelperPath::default();
        assert_eq!(path.module, "blpapi.datetime");
        assert_eq!(path.attribute, "_DatetimeUtil");
        assert_eq!(path.function, "toPyTimeFromInts");
    }
}
