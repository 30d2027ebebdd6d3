//! Generic table repository over one model type.
//!
//! # Responsibility
//! - Build parameterized SQL from a model's declared field set.
//! - Bind values positionally and execute against a borrowed connection.
//! - Wrap bulk writes in one transaction each.
//!
//! # Invariants
//! - Write paths validate the object before any SQL runs.
//! - Only `&'static` table/key names and declared field names are
//!   interpolated into SQL; every value is a bound parameter.
//! - A failed bulk write is rolled back before its error is returned.
//! - Log events carry table names and counts, never field values.

use crate::collection::Collection;
use crate::logging::sanitize_message;
use crate::model::schema::Model;
use crate::model::value::FieldValue;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::sql;
use log::{debug, error, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, Row, ToSql, Transaction, TransactionBehavior};
use std::any::Any;
use std::marker::PhantomData;
use std::time::Instant;

const MAX_LOGGED_ERROR_CHARS: usize = 240;

/// Which write path `save` took, with the key involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Row was inserted; carries the generated key now stored on the object.
    Inserted(i64),
    /// Row was updated in place; carries the unchanged key.
    Updated(i64),
}

impl SaveOutcome {
    pub fn key(self) -> i64 {
        match self {
            Self::Inserted(key) | Self::Updated(key) => key,
        }
    }
}

/// Repository bound to one table, one primary-key column and one model type.
///
/// Construction performs no I/O. The connection is borrowed for the
/// repository's lifetime and must not be shared across threads.
pub struct Repository<'conn, M: Model> {
    conn: &'conn Connection,
    table: &'static str,
    key: &'static str,
    _model: PhantomData<fn() -> M>,
}

impl<'conn, M: Model> Repository<'conn, M> {
    pub fn new(conn: &'conn Connection, table: &'static str, key: &'static str) -> Self {
        Self {
            conn,
            table,
            key,
            _model: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Checks that `object` is an `M` and passes the model's validation hook.
    ///
    /// # Errors
    /// - `TypeMismatch` when `object` is any other type.
    /// - `Validation` when `M::validate` rejects it.
    pub fn validate(&self, object: &dyn Any) -> RepoResult<()> {
        let Some(model) = object.downcast_ref::<M>() else {
            return Err(RepoError::TypeMismatch {
                expected: M::model_name(),
            });
        };
        model.validate()?;
        Ok(())
    }

    /// Inserts when the key is not positive, updates otherwise.
    pub fn save(&self, object: &mut M) -> RepoResult<SaveOutcome> {
        self.validate(&*object)?;

        if self.key_of(object) > 0 {
            self.update_unchecked(object).map(SaveOutcome::Updated)
        } else {
            self.insert_unchecked(object).map(SaveOutcome::Inserted)
        }
    }

    /// Inserts one row and writes the generated key back onto `object`.
    ///
    /// The primary-key field is never inserted explicitly. When the
    /// generated key does not fit the model's key field, the row is rolled
    /// back and `object` is left unchanged.
    pub fn insert(&self, object: &mut M) -> RepoResult<i64> {
        self.validate(&*object)?;
        self.insert_unchecked(object)
    }

    /// Updates the row matching the object's key; returns the key used.
    ///
    /// A key that matches no row is not an error; the statement simply
    /// affects nothing.
    pub fn update(&self, object: &mut M) -> RepoResult<i64> {
        self.validate(&*object)?;
        self.update_unchecked(object)
    }

    fn insert_unchecked(&self, object: &mut M) -> RepoResult<i64> {
        let started_at = Instant::now();

        let mut item = object.snapshot();
        item.remove(self.key);
        let names = item.names().collect::<Vec<_>>();

        let result = self.in_savepoint("repo_insert", || {
            self.execute(&sql::insert(self.table, &names), item.values())?;
            let id = self.conn.last_insert_rowid();
            self.write_key(object, id)?;
            Ok(id)
        });
        self.finish("repo_insert", started_at, 1, result)
    }

    fn update_unchecked(&self, object: &M) -> RepoResult<i64> {
        let started_at = Instant::now();

        let key = self.key_of(object);
        let mut item = object.snapshot();
        item.remove(self.key);
        if item.is_empty() {
            return Ok(key);
        }
        let names = item.names().collect::<Vec<_>>();

        let key_value = FieldValue::Integer(key);
        let result = self
            .execute(
                &sql::update(self.table, &names, self.key),
                item.values().chain(std::iter::once(&key_value)),
            )
            .map(|_| key);
        self.finish("repo_update", started_at, 1, result)
    }

    /// Deletes the row matching the object's key.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    /// - `MissingKey` when the key is not positive; nothing is executed.
    pub fn delete(&self, object: &M) -> RepoResult<bool> {
        self.validate(object)?;

        let key = self.key_of(object);
        if key <= 0 {
            return Err(RepoError::MissingKey {
                table: self.table,
                key: self.key,
            });
        }

        let started_at = Instant::now();
        let key_value = FieldValue::Integer(key);
        let result = self
            .execute(
                &sql::delete(self.table, self.key),
                std::iter::once(&key_value),
            )
            .map(|changed| changed > 0);
        self.finish("repo_delete", started_at, 1, result)
    }

    /// Inserts every item in one multi-row statement inside a transaction.
    ///
    /// Column order comes from the first item. Keys are not inserted and are
    /// not written back. An empty collection succeeds without touching the
    /// database.
    pub fn insert_collection(
        &self,
        collection: &Collection<M>,
        validate_objects: bool,
    ) -> RepoResult<()> {
        if collection.is_empty() {
            return Ok(());
        }
        let started_at = Instant::now();

        let mut names = Vec::new();
        let mut values = Vec::new();
        for (index, object) in collection.iter().enumerate() {
            if validate_objects {
                self.validate(object)?;
            }
            let mut item = object.snapshot();
            item.remove(self.key);
            if index == 0 {
                names = item.names().collect::<Vec<_>>();
            }
            values.extend(item.into_values());
        }

        let rows = collection.count();
        let result = self.in_transaction("repo_insert_collection", |tx| {
            if names.is_empty() {
                let statement = sql::insert(self.table, &names);
                for _ in 0..rows {
                    tx.execute(&statement, [])?;
                }
                return Ok(());
            }
            tx.execute(
                &sql::insert_rows(self.table, &names, rows),
                params_from_iter(values.iter()),
            )?;
            Ok(())
        });
        self.finish("repo_insert_collection", started_at, rows, result)
    }

    /// Upserts every item by primary key in one statement inside a
    /// transaction.
    ///
    /// Column order, key included, comes from the first item. Existing rows
    /// get every non-key column overwritten; new rows are inserted with the
    /// given key.
    pub fn update_collection(
        &self,
        collection: &Collection<M>,
        validate_objects: bool,
    ) -> RepoResult<()> {
        if collection.is_empty() {
            return Ok(());
        }
        let started_at = Instant::now();

        let mut names = Vec::new();
        let mut values = Vec::new();
        for (index, object) in collection.iter().enumerate() {
            if validate_objects {
                self.validate(object)?;
            }
            let item = object.snapshot();
            if index == 0 {
                names = item.names().collect::<Vec<_>>();
            }
            values.extend(item.into_values());
        }

        let rows = collection.count();
        let statement = sql::upsert_rows(self.table, self.key, &names, rows);
        let result = self.in_transaction("repo_update_collection", |tx| {
            tx.execute(&statement, params_from_iter(values.iter()))?;
            Ok(())
        });
        self.finish("repo_update_collection", started_at, rows, result)
    }

    /// Selects rows matching every `(field, value)` equality filter.
    ///
    /// `fields` restricts the projection; empty means all columns. Fields
    /// not projected keep their `Default` value on the returned models.
    ///
    /// # Errors
    /// - `UnknownField` when a filter or projection name is neither a model
    ///   field nor the primary key.
    pub fn get(
        &self,
        params: &[(&str, FieldValue)],
        fields: &[&str],
    ) -> RepoResult<Collection<M>> {
        let filters = params
            .iter()
            .map(|(name, _)| self.column(name))
            .collect::<RepoResult<Vec<_>>>()?;
        let projection = fields
            .iter()
            .map(|name| self.column(name))
            .collect::<RepoResult<Vec<_>>>()?;
        let started_at = Instant::now();

        let result = self.query(&sql::select(self.table, &projection, &filters), params);
        let rows = result.as_ref().map_or(0, Collection::count);
        self.finish("repo_get", started_at, rows, result)
    }

    pub fn get_all(&self) -> RepoResult<Collection<M>> {
        self.get(&[], &[])
    }

    /// First row of [`Repository::get`], or `None` when nothing matched.
    pub fn get_object(
        &self,
        params: &[(&str, FieldValue)],
        fields: &[&str],
    ) -> RepoResult<Option<M>> {
        Ok(self.get(params, fields)?.into_iter().next())
    }

    fn query(
        &self,
        statement: &str,
        params: &[(&str, FieldValue)],
    ) -> RepoResult<Collection<M>> {
        let mut stmt = self.conn.prepare(statement)?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = stmt.query(params_from_iter(params.iter().map(|(_, value)| value)))?;
        let mut collection = Collection::new();
        while let Some(row) = rows.next()? {
            collection.push(self.materialize(row, &columns)?);
        }
        Ok(collection)
    }

    fn materialize(&self, row: &Row<'_>, columns: &[String]) -> RepoResult<M> {
        let mut model = M::default();
        for (index, column) in columns.iter().enumerate() {
            let Some(name) = M::field_name(column) else {
                continue;
            };
            let value: FieldValue = row.get(index)?;
            model.set_field(name, value).map_err(|err| {
                RepoError::InvalidData(format!("`{}`.`{name}`: {err}", self.table))
            })?;
        }
        Ok(model)
    }

    fn execute<'v>(
        &self,
        statement: &str,
        values: impl Iterator<Item = &'v FieldValue>,
    ) -> RepoResult<usize> {
        let mut stmt = self.conn.prepare(statement)?;
        Ok(stmt.execute(params_from_iter(values))?)
    }

    fn in_transaction<T>(
        &self,
        event: &str,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = work(&tx);
        match outcome {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event={event} module=repo status=rollback_failed table={} error={}",
                        self.table, rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Runs `work` inside a named savepoint so it nests under any
    /// transaction the caller already holds.
    fn in_savepoint<T>(
        &self,
        event: &str,
        work: impl FnOnce() -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.conn.execute_batch("SAVEPOINT tablemap_write;")?;
        match work() {
            Ok(value) => {
                self.conn.execute_batch("RELEASE tablemap_write;")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self
                    .conn
                    .execute_batch("ROLLBACK TO tablemap_write; RELEASE tablemap_write;")
                {
                    warn!(
                        "event={event} module=repo status=rollback_failed table={} error={}",
                        self.table, rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn column(&self, name: &str) -> RepoResult<&'static str> {
        if name == self.key {
            return Ok(self.key);
        }
        M::field_name(name).ok_or_else(|| RepoError::UnknownField {
            table: self.table,
            field: name.to_string(),
        })
    }

    fn key_of(&self, object: &M) -> i64 {
        object
            .get_field(self.key)
            .map_or(0, |value| value.as_key())
    }

    fn write_key(&self, object: &mut M, id: i64) -> RepoResult<()> {
        if M::has_field(self.key) {
            object.set_field(self.key, FieldValue::Integer(id))?;
        }
        Ok(())
    }

    fn finish<T>(
        &self,
        event: &str,
        started_at: Instant,
        rows: usize,
        result: RepoResult<T>,
    ) -> RepoResult<T> {
        match &result {
            Ok(_) => debug!(
                "event={event} module=repo status=ok table={} rows={rows} duration_ms={}",
                self.table,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=repo status=error table={} rows={rows} duration_ms={} error={}",
                self.table,
                started_at.elapsed().as_millis(),
                error_summary(err)
            ),
        }
        result
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => ValueRef::Null,
            Self::Integer(value) => ValueRef::Integer(*value),
            Self::Real(value) => ValueRef::Real(*value),
            Self::Text(value) => ValueRef::Text(value.as_bytes()),
            Self::Blob(value) => ValueRef::Blob(value),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl FromSql for FieldValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(value) => Self::Integer(value),
            ValueRef::Real(value) => Self::Real(value),
            ValueRef::Text(bytes) => Self::Text(
                std::str::from_utf8(bytes)
                    .map_err(|err| FromSqlError::Other(Box::new(err)))?
                    .to_string(),
            ),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        })
    }
}

/// Log-safe error text; oversized statements echoed by SQLite are cut off.
fn error_summary(err: &RepoError) -> String {
    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
}

#[cfg(test)]
mod tests {
    use super::{error_summary, MAX_LOGGED_ERROR_CHARS};
    use crate::repo::error::RepoError;

    #[test]
    fn error_summary_truncates_long_statement_text() {
        let groups = vec!["(?)"; 20_000].join(", ");
        let statement = format!("INSERT INTO `u` (`name`) VALUES {groups}");
        let err = RepoError::InvalidData(format!("too many SQL variables in\n{statement}"));

        let summary = error_summary(&err);
        assert!(summary.ends_with("..."));
        assert!(!summary.contains('\n'));
        assert_eq!(summary.chars().count(), MAX_LOGGED_ERROR_CHARS + 3);
        assert!(summary.starts_with("invalid persisted row data: too many SQL variables"));
    }

    #[test]
    fn error_summary_keeps_short_messages_intact() {
        let err = RepoError::UnknownField {
            table: "users",
            field: "nope".to_string(),
        };
        assert_eq!(error_summary(&err), "unknown field `nope` for table `users`");
    }
}
