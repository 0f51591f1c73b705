//! Primary key → string serial, used as the identity map's lookup key.
//!
//! Values are joined, in primary-key column order, with a pipe (easy to
//! spot when debugging) followed by ASCII 31 "unit separator" (unlikely to
//! appear in real key values). The separator also brackets the whole
//! sequence, so `{id: 7}` serializes to `"|\x1F7|\x1F"`.
//!
//! Limitations, kept on purpose because callers may depend on them:
//! - `Null`, `false` and `""` all render as the empty string and are not
//!   told apart.
//! - Key values containing `\x1F` can make serials ambiguous. Sanitize
//!   non-integer keys.
//! - Order matters: `{a: 1, b: 2}` and `{b: 2, a: 1}` give different serials.

use std::borrow::Cow;

use rowmap_api::value::format_decimal;
use rowmap_api::{PrimaryKey, Row, Value};

/// A pipe, and ASCII 31 ("unit separator").
pub const SEPARATOR: &str = "|\u{1F}";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Serial(String);

impl Serial {
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut serial = String::from(SEPARATOR);
        let mut first = true;
        for value in values {
            if !first {
                serial.push_str(SEPARATOR);
            }
            serial.push_str(&component(value));
            first = false;
        }
        serial.push_str(SEPARATOR);
        Serial(serial)
    }

    pub fn from_key(key: &PrimaryKey) -> Self {
        Self::from_values(key.values())
    }

    /// Serial of `row` under the given primary-key columns.
    pub fn from_row<S: AsRef<str>>(row: &Row, primary_key: &[S]) -> Self {
        Self::from_key(&PrimaryKey::from_row(row, primary_key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// String form of one key component.
fn component(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null | Value::Bool(false) => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("1"),
        Value::Int64(v) => Cow::Owned(v.to_string()),
        Value::UInt64(v) => Cow::Owned(v.to_string()),
        Value::Float64(v) => Cow::Owned(v.to_string()),
        Value::Decimal(mantissa, scale) => Cow::Owned(format_decimal(*mantissa, *scale)),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bytes(b) => String::from_utf8_lossy(b),
    }
}
