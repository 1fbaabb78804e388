//! Tablemap - map plain record types onto relational tables.
//!
//! This crate provides the backend-agnostic core: declared record types are
//! turned into table schemas, typed operations are translated into
//! parameterized SQL, and result rows are mapped back into records.
//!
//! # Core Concepts
//!
//! - **Record**: a plain struct describing its fields explicitly (usually via
//!   `#[derive(Record)]`). Supported field types are integers, strings and
//!   booleans.
//! - **Table binding**: a record type joined to one table and an executor.
//! - **Identity scope**: fixed column values applied to every read and write
//!   of a binding, used to confine it to one logical partition.
//! - **Unit of work**: each executor call commits or rolls back before it
//!   returns.
//!
//! # Traits
//!
//! - [`Record`]: Types that map to a table
//! - [`Executor`]: Backends that run statements in units of work

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod error;
mod executor;
mod mapper;
mod query;
mod record;
mod schema;
mod table;
mod value;

pub use error::{DriverError, StorageError};
pub use executor::{ConnectionConfig, Executor};
pub use mapper::{Row, map_row, record_values};
pub use query::{
    Fragment, IdentityScope, Key, Projection, Query, Statement, StatementBuilder, WhereArgs,
    bind_fragment, quote_ident,
};
pub use record::{
    ColumnDef, FieldDescriptor, FieldType, Record, SqlType, columns_for, default_table_name,
    resolve_primary_key,
};
pub use schema::{ColumnInfo, TableInfo, TableOptions, TableSchema};
pub use table::TableBinding;
pub use value::Value;

// Re-exported for callers building named parameter maps
pub use indexmap::IndexMap;

// Re-export derive macro
pub use tablemap_derive::Record;
