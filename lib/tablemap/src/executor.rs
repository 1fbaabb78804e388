//! The seam between table bindings and a database backend.
//!
//! - `Executor`: runs statements, each inside its own unit of work
//! - `ConnectionConfig`: how a backend is reached

use crate::mapper::Row;
use crate::query::Statement;
use crate::schema::ColumnInfo;
use crate::StorageError;

/// Connection configuration for database backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
}

impl ConnectionConfig {
    pub fn url(&self) -> &str {
        match self {
            ConnectionConfig::Url(url) => url,
        }
    }
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Trait for executing statements against a database backend.
///
/// Every call is blocking and runs in a fresh unit of work: it commits before
/// returning `Ok`, and is rolled back before returning `Err`. Nothing is left
/// open between calls, so concurrent callers never share a transaction.
pub trait Executor: Clone + Send + Sync {
    /// Run a statement and fetch every resulting row.
    fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StorageError>;

    /// Run a statement and return the number of rows affected.
    fn execute(&self, statement: &Statement) -> Result<u64, StorageError>;

    /// Run DDL without opening a transaction beyond what the driver requires.
    fn apply_schema(&self, statement: &Statement) -> Result<(), StorageError>;

    /// Whether a table with this name currently exists. Never cached.
    fn table_exists(&self, table: &str) -> Result<bool, StorageError>;

    /// Columns of an existing table in declaration order; empty if the table is absent.
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, StorageError>;
}
