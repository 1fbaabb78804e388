//! Table bindings: one record type bound to one table through an executor.

use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::executor::Executor;
use crate::mapper::{map_row, record_values};
use crate::query::{IdentityScope, Key, Query, StatementBuilder};
use crate::record::Record;
use crate::schema::{TableInfo, TableOptions, TableSchema};
use crate::{StorageError, Value};

/// A record type bound to a table.
///
/// Every operation goes through the executor and therefore runs in its own
/// unit of work.
#[derive(Debug, Clone)]
pub struct TableBinding<T, E> {
    schema: TableSchema,
    executor: E,
    scope: IdentityScope,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record, E: Executor> TableBinding<T, E> {
    /// Derive the table schema for `T` and create the table if it is absent.
    ///
    /// Creating a table that already exists is a no-op. If the stored columns
    /// differ from the declared ones a warning is logged and the declared
    /// schema is kept.
    pub fn create(executor: E, options: TableOptions) -> Result<Self, StorageError> {
        let schema = TableSchema::for_record::<T>(&options)?;
        debug!(table = %schema.name, "ensuring table exists");
        executor.apply_schema(&schema.create_sql())?;

        let existing = TableInfo {
            name: schema.name.clone(),
            columns: executor.table_columns(&schema.name)?,
        };
        let differences = schema.differences(&existing);
        if !differences.is_empty() {
            warn!(
                table = %schema.name,
                ?differences,
                "existing table does not match declared record"
            );
        }

        Ok(Self {
            schema,
            executor,
            scope: IdentityScope::new(),
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Whether the table currently exists in the database.
    pub fn exists(&self) -> Result<bool, StorageError> {
        self.executor.table_exists(&self.schema.name)
    }

    pub fn identity_scope(&self) -> &IdentityScope {
        &self.scope
    }

    /// Install identity constraints, replacing any previous scope.
    pub fn set_identity_scope<I, K, V>(&mut self, constraints: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let scope: IdentityScope = constraints.into_iter().collect();
        if let Some((column, _)) = scope.iter().find(|(c, _)| self.schema.column(c).is_none()) {
            return Err(StorageError::UnknownColumn {
                table: self.schema.name.clone(),
                column: column.clone(),
            });
        }
        self.scope = scope;
        Ok(())
    }

    pub fn with_identity_scope<I, K, V>(mut self, constraints: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_identity_scope(constraints)?;
        Ok(self)
    }

    pub fn clear_identity_scope(&mut self) {
        self.scope = IdentityScope::new();
    }

    fn statements(&self) -> StatementBuilder<'_> {
        StatementBuilder::new(&self.schema, &self.scope)
    }

    /// Select records matching the query.
    pub fn query(&self, query: &Query) -> Result<Vec<T>, StorageError> {
        let statement = self.statements().select(query)?;
        let rows = self.executor.fetch_all(&statement)?;
        rows.into_iter().map(map_row::<T>).collect()
    }

    /// Every record visible through this binding.
    pub fn all(&self) -> Result<Vec<T>, StorageError> {
        self.query(&Query::new())
    }

    /// Fetch the record with the given primary key.
    pub fn get(&self, key: impl Into<Key>) -> Result<T, StorageError> {
        let key = key.into();
        let statement = self.statements().select_by_key(&key)?;
        let mut rows = self.executor.fetch_all(&statement)?;
        match rows.len() {
            0 => Err(StorageError::NotFound(format!(
                "{} with key {:?}",
                self.schema.name,
                key.values()
            ))),
            1 => map_row(rows.remove(0)),
            _ => Err(StorageError::AmbiguousKey(self.schema.name.clone())),
        }
    }

    /// Insert a record and return it as stored, including generated values.
    pub fn insert(&self, record: &T) -> Result<T, StorageError> {
        let values = record_values(record)?;
        let statement = self.statements().insert(&values);
        let rows = self.executor.fetch_all(&statement)?;
        single_returned(rows, &self.schema.name, "insert")
    }

    /// Update the row identified by the record's primary key.
    ///
    /// Only provided fields are written, but every primary-key field must be present.
    pub fn update(&self, record: &T) -> Result<T, StorageError> {
        let values = record_values(record)?;
        let key = self
            .schema
            .primary_key
            .iter()
            .map(|column| {
                values
                    .get(column)
                    .cloned()
                    .ok_or_else(|| StorageError::MissingKey(column.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let key = Key::from(key);

        let statement = self.statements().update(&key, &values)?;
        let rows = self.executor.fetch_all(&statement)?;
        if rows.is_empty() {
            return Err(StorageError::NotFound(format!(
                "{} with key {:?}",
                self.schema.name,
                key.values()
            )));
        }
        single_returned(rows, &self.schema.name, "update")
    }

    /// Delete the row with the given key, returning how many rows were removed.
    pub fn delete(&self, key: impl Into<Key>) -> Result<u64, StorageError> {
        let statement = self.statements().delete(&key.into())?;
        self.executor.execute(&statement)
    }
}

fn single_returned<T: Record>(
    rows: Vec<crate::Row>,
    table: &str,
    operation: &str,
) -> Result<T, StorageError> {
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => map_row(row),
        (None, _) => Err(StorageError::Mapping(format!(
            "{} on {} returned no row",
            operation, table
        ))),
        (Some(_), Some(_)) => Err(StorageError::AmbiguousKey(table.to_string())),
    }
}
