//! SQLite implementation for tablemap.
//!
//! This crate provides the `Database` handle: it owns a `sqlx` connection
//! pool, runs every statement in its own unit of work, and exposes schema
//! introspection and raw SQL alongside the typed table bindings.
//!
//! # Usage
//!
//! ```text
//! use serde::{Deserialize, Serialize};
//! use tablemap::{Query, Record};
//! use tablemap_sqlite::Database;
//!
//! #[derive(Clone, Serialize, Deserialize, Record)]
//! pub struct Person {
//!     pub id: Option<i64>,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! let db = Database::connect("sqlite://people.db")?;
//! let people = db.create::<Person>()?;
//! let ann = people.insert(&Person { id: None, name: "Ann".into(), age: 41 })?;
//! let adults = people.query(&Query::new().filter("age >= :age").param("age", 18))?;
//! ```
//!
//! All methods block. Do not call them from inside an async runtime.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod database;
mod options;

pub use bind::{bind_params, decode_row};
pub use database::{Database, Table};
pub use options::{BUSY_TIMEOUT_ENV, DatabaseOptions, MAX_CONNECTIONS_ENV};

// Re-export core types for convenience
pub use tablemap::{
    ConnectionConfig, Executor, Fragment, IdentityScope, Key, Query, Record, Row, StorageError,
    TableBinding, TableInfo, TableOptions, Value, WhereArgs,
};
