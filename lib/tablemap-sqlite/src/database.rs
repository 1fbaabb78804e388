//! SQLite implementation of Executor.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tablemap::{
    ColumnInfo, ConnectionConfig, Executor, IndexMap, Record, Row, Statement, StorageError,
    TableBinding, TableInfo, TableOptions, Value, WhereArgs, bind_fragment,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::bind::{bind_params, decode_row};
use crate::options::DatabaseOptions;

/// A record type bound to a table in a SQLite [`Database`].
pub type Table<T> = TableBinding<T, Database>;

struct Inner {
    url: String,
    pool: SqlitePool,
    runtime: Runtime,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Close gracefully unless dropped from inside an async context, where
        // blocking is not allowed; the pool then closes as it is dropped.
        if tokio::runtime::Handle::try_current().is_err() {
            self.runtime.block_on(self.pool.close());
        }
    }
}

/// A connection to a SQLite database.
///
/// Cheap to clone; clones share one pool. Methods block the calling thread and
/// must not be called from inside an async runtime.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database({})", self.inner.url)
    }
}

impl Database {
    /// Connect with default options.
    pub fn connect(config: impl Into<ConnectionConfig>) -> Result<Self, StorageError> {
        Self::connect_with(config, DatabaseOptions::default())
    }

    pub fn connect_with(
        config: impl Into<ConnectionConfig>,
        options: DatabaseOptions,
    ) -> Result<Self, StorageError> {
        options.validate()?;
        let url = config.into().url().to_string();

        let connect_options = SqliteConnectOptions::from_str(&url)
            .map_err(StorageError::driver)?
            .create_if_missing(options.create_if_missing)
            .busy_timeout(options.busy_timeout);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.worker_threads)
            .thread_name("tablemap-sqlite")
            .enable_all()
            .build()
            .map_err(StorageError::driver)?;

        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(options.max_connections)
                    .connect_with(connect_options),
            )
            .map_err(StorageError::driver)?;

        info!(
            url = %url,
            max_connections = options.max_connections,
            "connected to sqlite"
        );

        Ok(Self {
            inner: Arc::new(Inner { url, pool, runtime }),
        })
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.inner.runtime.block_on(future)
    }

    /// Bind `T` to its default table, creating the table if needed.
    pub fn create<T: Record>(&self) -> Result<Table<T>, StorageError> {
        self.create_with(TableOptions::default())
    }

    /// Bind `T` to a table with an explicit primary key and/or name.
    pub fn create_with<T: Record>(&self, options: TableOptions) -> Result<Table<T>, StorageError> {
        TableBinding::create(self.clone(), options)
    }

    /// Names of all user tables.
    pub fn tables(&self) -> Result<Vec<String>, StorageError> {
        let statement = Statement::new(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        );
        let rows = self.block_on(fetch_direct(&self.inner.pool, &statement))?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Result<Option<TableInfo>, StorageError> {
        let columns = self.table_columns(name)?;
        if columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(TableInfo {
            name: name.to_string(),
            columns,
        }))
    }

    /// Human-readable dump of every table and its columns; key columns are marked `*`.
    pub fn schema(&self) -> Result<String, StorageError> {
        let mut report = String::new();
        for name in self.tables()? {
            if let Some(info) = self.table(&name)? {
                report.push_str(&info.to_string());
            }
        }
        Ok(report)
    }

    /// Run raw SQL and return its rows.
    ///
    /// Statements run in their own transaction, except `VACUUM`, `PRAGMA`,
    /// `ATTACH` and `DETACH`, which SQLite refuses inside one and which run
    /// directly on a pooled connection instead.
    pub fn sql(&self, statement: &str) -> Result<Vec<Row>, StorageError> {
        self.sql_with(statement, WhereArgs::Positional(Vec::new()))
    }

    /// Run raw SQL with `?` or `:name` parameters and return its rows.
    ///
    /// Every supplied value must be referenced by the statement.
    pub fn sql_with(
        &self,
        statement: &str,
        args: impl Into<WhereArgs>,
    ) -> Result<Vec<Row>, StorageError> {
        let (sql, params) = match args.into() {
            WhereArgs::Positional(values) => bind_fragment(statement, &values, &IndexMap::new())?,
            WhereArgs::Named(values) => bind_fragment(statement, &[], &values)?,
        };
        let statement = Statement::with_params(sql, params);
        if runs_outside_transaction(&statement.sql) {
            debug!(sql = %statement.sql, "fetch outside transaction");
            return self.block_on(fetch_direct(&self.inner.pool, &statement));
        }
        self.fetch_all(&statement)
    }

    /// Close every pooled connection. Later operations fail with a driver error.
    pub fn close(&self) {
        info!(url = %self.inner.url, "closing sqlite pool");
        self.block_on(self.inner.pool.close());
    }

    pub fn is_closed(&self) -> bool {
        self.inner.pool.is_closed()
    }
}

impl Executor for Database {
    fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StorageError> {
        debug!(sql = %statement.sql, params = statement.params.len(), "fetch");
        self.block_on(fetch_in_unit_of_work(&self.inner.pool, statement))
    }

    fn execute(&self, statement: &Statement) -> Result<u64, StorageError> {
        debug!(sql = %statement.sql, params = statement.params.len(), "execute");
        self.block_on(execute_in_unit_of_work(&self.inner.pool, statement))
    }

    fn apply_schema(&self, statement: &Statement) -> Result<(), StorageError> {
        debug!(sql = %statement.sql, "apply schema");
        self.block_on(async {
            let args = bind_params(&statement.params)?;
            sqlx::query_with(&statement.sql, args)
                .execute(&self.inner.pool)
                .await
                .map_err(StorageError::driver)?;
            Ok::<(), StorageError>(())
        })
    }

    fn table_exists(&self, table: &str) -> Result<bool, StorageError> {
        let statement = Statement::with_params(
            "SELECT 1 AS present FROM sqlite_master WHERE type = 'table' AND name = ?",
            vec![Value::from(table)],
        );
        let rows = self.block_on(fetch_direct(&self.inner.pool, &statement))?;
        Ok(!rows.is_empty())
    }

    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, StorageError> {
        let statement = Statement::with_params(
            "SELECT name, type, pk FROM pragma_table_info(?) ORDER BY cid",
            vec![Value::from(table)],
        );
        let rows = self.block_on(fetch_direct(&self.inner.pool, &statement))?;
        rows.iter().map(column_info).collect()
    }
}

fn column_info(row: &Row) -> Result<ColumnInfo, StorageError> {
    let name = row
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::Mapping("table_info row without a name".to_string()))?;
    let sql_type = row.get("type").and_then(Value::as_str).unwrap_or_default();
    let position = row.get("pk").and_then(Value::as_i64).unwrap_or(0);
    Ok(ColumnInfo {
        name: name.to_string(),
        sql_type: sql_type.to_string(),
        primary_key_position: u32::try_from(position).unwrap_or(0),
    })
}

/// Statements SQLite rejects inside a transaction.
fn runs_outside_transaction(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    ["VACUUM", "PRAGMA", "ATTACH", "DETACH"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

/// Read without an explicit transaction; used for catalog queries.
async fn fetch_direct(pool: &SqlitePool, statement: &Statement) -> Result<Vec<Row>, StorageError> {
    let args = bind_params(&statement.params)?;
    let rows = sqlx::query_with(&statement.sql, args)
        .fetch_all(pool)
        .await
        .map_err(StorageError::driver)?;
    rows.iter().map(decode_row).collect()
}

/// Run a statement in its own transaction and fetch every row before committing.
async fn fetch_in_unit_of_work(
    pool: &SqlitePool,
    statement: &Statement,
) -> Result<Vec<Row>, StorageError> {
    let mut tx = pool.begin().await.map_err(StorageError::driver)?;
    let result = async {
        let args = bind_params(&statement.params)?;
        let rows = sqlx::query_with(&statement.sql, args)
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::driver)?;
        rows.iter().map(decode_row).collect::<Result<Vec<_>, StorageError>>()
    }
    .await;
    finish(tx, result).await
}

/// Run a statement in its own transaction and return the rows affected.
async fn execute_in_unit_of_work(
    pool: &SqlitePool,
    statement: &Statement,
) -> Result<u64, StorageError> {
    let mut tx = pool.begin().await.map_err(StorageError::driver)?;
    let result = async {
        let args = bind_params(&statement.params)?;
        let done = sqlx::query_with(&statement.sql, args)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::driver)?;
        Ok::<u64, StorageError>(done.rows_affected())
    }
    .await;
    finish(tx, result).await
}

/// Commit on success, roll back on failure. The connection returns to the
/// pool when `tx` is dropped, on every path.
async fn finish<R>(
    tx: Transaction<'static, Sqlite>,
    result: Result<R, StorageError>,
) -> Result<R, StorageError> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(StorageError::driver)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maintenance_statements_skip_the_transaction() {
        assert!(runs_outside_transaction("VACUUM"));
        assert!(runs_outside_transaction("  pragma journal_mode = DELETE"));
        assert!(runs_outside_transaction("ATTACH DATABASE 'x.db' AS x"));
        assert!(!runs_outside_transaction("SELECT 1"));
        assert!(!runs_outside_transaction("INSERT INTO vacuum_log VALUES (1)"));
    }
}
