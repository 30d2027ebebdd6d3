//! Model contract: static field schema plus by-name accessors.
//!
//! # Responsibility
//! - Declare the ordered persistable field set of a model variant.
//! - Provide snapshot/replace/hydrate on top of per-field accessors.
//!
//! # Invariants
//! - `FIELDS` is fixed per type and never contains duplicates.
//! - `snapshot()` yields exactly `FIELDS`, in declaration order.
//! - `replace()` ignores unknown keys and is all-or-nothing for known ones.

use crate::model::snapshot::Snapshot;
use crate::model::value::{FieldValue, FieldValueError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error raised by model field access and model validation hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    UnknownField {
        model: &'static str,
        field: String,
    },
    FieldType {
        field: &'static str,
        source: FieldValueError,
    },
    Invalid {
        model: &'static str,
        message: String,
    },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { model, field } => {
                write!(f, "unknown field `{field}` on model {model}")
            }
            Self::FieldType { field, source } => write!(f, "field `{field}`: {source}"),
            Self::Invalid { model, message } => write!(f, "invalid {model}: {message}"),
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FieldType { source, .. } => Some(source),
            Self::UnknownField { .. } | Self::Invalid { .. } => None,
        }
    }
}

/// A plain data object mapped to one table row.
///
/// Implement by hand or with [`impl_model!`](crate::impl_model).
pub trait Model: Default + 'static {
    /// Persistable field names in declaration order.
    const FIELDS: &'static [&'static str];

    /// Returns the current value of `name`, or `None` if it is not a field.
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// Overwrites field `name` with `value`.
    ///
    /// # Errors
    /// - `UnknownField` when `name` is not in `FIELDS`.
    /// - `FieldType` when `value` does not fit the field's Rust type.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ModelError>;

    /// Write-path validation hook. Accepts everything by default.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    fn model_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Resolves `name` to the declared static field name.
    fn field_name(name: &str) -> Option<&'static str> {
        Self::FIELDS.iter().copied().find(|field| *field == name)
    }

    fn has_field(name: &str) -> bool {
        Self::field_name(name).is_some()
    }

    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::with_capacity(Self::FIELDS.len());
        for &name in Self::FIELDS {
            snapshot.insert(name, self.get_field(name).unwrap_or_default());
        }
        snapshot
    }

    /// Overwrites every recognized field present in `partial` and returns
    /// the snapshot taken before the change.
    ///
    /// Unknown keys are skipped. On a conversion error the instance is
    /// restored to its previous state before the error is returned.
    fn replace<I, K, V>(&mut self, partial: I) -> Result<Snapshot, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let previous = self.snapshot();

        for (key, value) in partial {
            let Some(name) = Self::field_name(key.as_ref()) else {
                continue;
            };
            if let Err(err) = self.set_field(name, value.into()) {
                for (name, value) in previous.iter() {
                    // Values came from get_field, so they convert back.
                    let _ = self.set_field(name, value.clone());
                }
                return Err(err);
            }
        }

        Ok(previous)
    }

    /// Builds a default instance and applies `input` via [`Model::replace`].
    fn hydrate<I, K, V>(input: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut model = Self::default();
        model.replace(input)?;
        Ok(model)
    }
}
