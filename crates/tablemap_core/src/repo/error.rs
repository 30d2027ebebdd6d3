use crate::db::DbError;
use crate::model::schema::ModelError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Object is not an instance of the repository's bound model type.
    TypeMismatch { expected: &'static str },
    /// Delete attempted on an object without a positive primary key.
    MissingKey { table: &'static str, key: &'static str },
    /// Filter or projection name outside the model's declared fields.
    UnknownField { table: &'static str, field: String },
    /// Model validation hook rejected the object.
    Validation(ModelError),
    /// Statement preparation, execution or transaction failure.
    Db(DbError),
    /// A fetched row could not be materialized into the model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { expected } => {
                write!(f, "given object is not of type {expected}")
            }
            Self::MissingKey { table, key } => {
                write!(f, "no primary key given: `{table}`.`{key}` must be positive")
            }
            Self::UnknownField { table, field } => {
                write!(f, "unknown field `{field}` for table `{table}`")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted row data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::TypeMismatch { .. }
            | Self::MissingKey { .. }
            | Self::UnknownField { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelError> for RepoError {
    fn from(value: ModelError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
