//! Scalar field values carried between models and SQL statements.
//!
//! # Responsibility
//! - Represent every persistable scalar (or null) in one closed type.
//! - Convert Rust field types into and out of that representation.
//!
//! # Invariants
//! - Conversions never silently change a value's kind except the documented
//!   widenings (`Integer` -> `f64`, `Integer` -> `bool`).
//! - `as_key()` never fails; unparseable input coerces to `0`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One persistable scalar value.
///
/// Serialized as a plain JSON scalar (`null`, number, string) or byte array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Short kind label used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerces this value to an integer primary key.
    ///
    /// - `Null`, blobs and non-numeric text -> `0`
    /// - reals are truncated toward zero
    /// - text is parsed from its leading integer prefix (`" 42abc"` -> `42`)
    pub fn as_key(&self) -> i64 {
        match self {
            Self::Null | Self::Blob(_) => 0,
            Self::Integer(value) => *value,
            Self::Real(value) => *value as i64,
            Self::Text(value) => leading_integer(value),
        }
    }
}

fn leading_integer(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(index, ch)| {
            ch.is_ascii_digit() || (*index == 0 && matches!(*ch, '-' | '+'))
        })
        .map(|(index, ch)| index + ch.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0)
}

/// Error returned when a `FieldValue` cannot become the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValueError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Display for FieldValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {} value, found {}", self.expected, self.found)
    }
}

impl Error for FieldValueError {}

/// Conversion from a stored value into a model field type.
///
/// Implemented for the scalar types models commonly declare; `Option<T>`
/// maps `Null` to `None`.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError>;
}

fn mismatch<T>(expected: &'static str, value: &FieldValue) -> Result<T, FieldValueError> {
    Err(FieldValueError {
        expected,
        found: value.kind(),
    })
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        Ok(value)
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Integer(value) => Ok(value),
            other => mismatch("integer", &other),
        }
    }
}

impl FromFieldValue for i32 {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Integer(value) => i32::try_from(value).map_err(|_| FieldValueError {
                expected: "32-bit integer",
                found: "out-of-range integer",
            }),
            other => mismatch("integer", &other),
        }
    }
}

impl FromFieldValue for u32 {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Integer(value) => u32::try_from(value).map_err(|_| FieldValueError {
                expected: "unsigned 32-bit integer",
                found: "out-of-range integer",
            }),
            other => mismatch("integer", &other),
        }
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Integer(value) => Ok(value != 0),
            other => mismatch("integer", &other),
        }
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Real(value) => Ok(value),
            FieldValue::Integer(value) => Ok(value as f64),
            other => mismatch("real", &other),
        }
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Text(value) => Ok(value),
            other => mismatch("text", &other),
        }
    }
}

impl FromFieldValue for Vec<u8> {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Blob(value) => Ok(value),
            other => mismatch("blob", &other),
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
