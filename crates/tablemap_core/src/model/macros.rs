//! Declarative `Model` implementation for plain structs.

/// Implements [`Model`](crate::Model) for a struct with named fields.
///
/// Every listed field must implement `Clone`, `Into<FieldValue>` and
/// [`FromFieldValue`](crate::FromFieldValue). Listing order becomes the
/// persistable field order.
///
/// ```
/// use tablemap_core::{impl_model, Model};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     email: String,
/// }
///
/// impl_model!(User { id, name, email });
///
/// assert_eq!(User::FIELDS, &["id", "name", "email"]);
/// ```
///
/// An optional validator runs before every repository write:
///
/// ```
/// use tablemap_core::{impl_model, ModelError};
///
/// #[derive(Debug, Default)]
/// struct Tag {
///     id: i64,
///     name: String,
/// }
///
/// fn check_tag(tag: &Tag) -> Result<(), ModelError> {
///     if tag.name.is_empty() {
///         return Err(ModelError::Invalid {
///             model: "Tag",
///             message: "name cannot be empty".to_string(),
///         });
///     }
///     Ok(())
/// }
///
/// impl_model!(Tag { id, name }, validate = check_tag);
/// ```
#[macro_export]
macro_rules! impl_model {
    ($model:ident { $($field:ident),+ $(,)? } $(, validate = $validator:path)?) => {
        impl $crate::Model for $model {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn get_field(&self, name: &str) -> ::std::option::Option<$crate::FieldValue> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(
                        $crate::FieldValue::from(::std::clone::Clone::clone(&self.$field)),
                    ),)+
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::FieldValue,
            ) -> ::std::result::Result<(), $crate::ModelError> {
                match name {
                    $(stringify!($field) => {
                        self.$field = $crate::FromFieldValue::from_field_value(value).map_err(
                            |source| $crate::ModelError::FieldType {
                                field: stringify!($field),
                                source,
                            },
                        )?;
                        ::std::result::Result::Ok(())
                    })+
                    _ => ::std::result::Result::Err($crate::ModelError::UnknownField {
                        model: ::std::any::type_name::<$model>(),
                        field: name.to_string(),
                    }),
                }
            }

            $(
                fn validate(&self) -> ::std::result::Result<(), $crate::ModelError> {
                    $validator(self)
                }
            )?
        }
    };
}
