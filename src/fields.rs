use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Fallback emitted when a value's display conversion panics. Field
/// sanitization must never cause a log call to fail, so a conversion
/// that cannot complete degrades to this fixed string instead.
pub const SANITIZE_FALLBACK: &str = "value could not be converted to str";

/// Attribute names that mirror the event's own structured fields. An
/// extra field with one of these names would shadow data the builder
/// already emits through a dedicated key, so they are never copied out
/// of the extras bag.
const RESERVED_FIELDS: &[&str] = &[
    "logger",
    "severity",
    "message",
    "args",
    "timestamp",
    "file",
    "line",
    "function",
    "pid",
    "thread_name",
    "process_name",
    "exception",
    "exception_text",
];

/// The CEE/GELF format does not support `id` fields.
pub(crate) fn is_skipped(key: &str) -> bool {
    key == "id" || key == "_id" || RESERVED_FIELDS.contains(&key)
}

/// Namespace a custom attribute name with a leading underscore.
///
/// Names that already carry the prefix are used as-is; there is no
/// double-prefixing.
pub fn custom_key(key: &str) -> String {
    if key.starts_with('_') {
        key.to_string()
    } else {
        format!("_{}", key)
    }
}

/// A value attached to a log event.
///
/// The wire formats only carry strings, integers and floats. Anything
/// else is wrapped as [`FieldValue::Other`] and holds onto its display
/// conversion, which [`sanitize`] runs lazily at emission time.
#[derive(Clone)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    /// Deferred display conversion for a non-scalar value.
    Other(Arc<dyn fmt::Display + Send + Sync>),
}

impl FieldValue {
    /// Wrap an arbitrary displayable value.
    pub fn other(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        FieldValue::Other(Arc::new(value))
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            FieldValue::Int(n) => f.debug_tuple("Int").field(n).finish(),
            FieldValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            FieldValue::Other(_) => f.write_str("Other(..)"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        sanitize(self).serialize(serializer)
    }
}

/// Convert a field value into a wire-safe scalar.
///
/// Strings, integers and floats pass through unchanged. Anything else
/// is rendered through its display conversion; if that conversion
/// panics the result is [`SANITIZE_FALLBACK`]. This function never
/// panics and never errors.
pub fn sanitize(value: &FieldValue) -> Value {
    match value {
        FieldValue::Str(s) => Value::from(s.as_str()),
        FieldValue::Int(n) => Value::from(*n),
        FieldValue::Float(x) => Value::from(*x),
        FieldValue::Other(other) => {
            let other = Arc::clone(other);
            match catch_unwind(AssertUnwindSafe(move || other.to_string())) {
                Ok(text) => Value::from(text),
                Err(_) => Value::from(SANITIZE_FALLBACK),
            }
        }
    }
}

/// Plain-text rendering of a field value, used when substituting
/// positional arguments into a message template.
pub(crate) fn display_string(value: &FieldValue) -> String {
    match sanitize(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Endpoint {
        host: String,
        port: u16,
    }

    impl fmt::Display for Endpoint {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}", self.host, self.port)
        }
    }

    struct Hostile;

    impl fmt::Display for Hostile {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("refusing to render");
        }
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        assert_eq!(sanitize(&FieldValue::from("some_text")), Value::from("some_text"));
        assert_eq!(sanitize(&FieldValue::from(1)), Value::from(1));
        assert_eq!(sanitize(&FieldValue::from(1.1)), Value::from(1.1));
    }

    #[test]
    fn other_values_render_through_display() {
        let value = FieldValue::other(Endpoint {
            host: "10.2.160.20".to_string(),
            port: 514,
        });
        assert_eq!(sanitize(&value), Value::from("10.2.160.20:514"));
    }

    #[test]
    fn panicking_conversion_degrades_to_fallback() {
        let value = FieldValue::other(Hostile);
        assert_eq!(sanitize(&value), Value::from(SANITIZE_FALLBACK));
    }

    #[test]
    fn custom_key_prefixes_once() {
        assert_eq!(custom_key("foo"), "_foo");
        assert_eq!(custom_key("_foo"), "_foo");
    }

    #[test]
    fn id_fields_are_skipped() {
        assert!(is_skipped("id"));
        assert!(is_skipped("_id"));
        assert!(is_skipped("message"));
        assert!(!is_skipped("request_id"));
    }

    #[test]
    fn display_string_renders_numbers_plainly() {
        assert_eq!(display_string(&FieldValue::from(3)), "3");
        assert_eq!(display_string(&FieldValue::from("x")), "x");
    }
}
