//! Binding values to SQLite statements and decoding rows.

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo, ValueRef};
use tablemap::{Row, StorageError, Value};

/// Bind statement parameters, in order, to SqliteArguments.
pub fn bind_params(params: &[Value]) -> Result<SqliteArguments<'_>, StorageError> {
    let mut args = SqliteArguments::default();
    for value in params {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

fn bind_value<'q>(args: &mut SqliteArguments<'q>, value: &'q Value) -> Result<(), StorageError> {
    match value {
        Value::Null => args.add(None::<String>),
        Value::Integer(n) => args.add(*n),
        Value::Real(f) => args.add(*f),
        Value::Text(s) => args.add(s.as_str()),
        Value::Bool(b) => args.add(*b),
        Value::Blob(bytes) => args.add(bytes.as_slice()),
    }
    .map_err(StorageError::driver)
}

/// Decode a SQLite row into a [`Row`], preserving column order.
pub fn decode_row(row: &SqliteRow) -> Result<Row, StorageError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for column in row.columns() {
        columns.push(column.name().to_string());
        values.push(decode_value(row, column.ordinal())?);
    }

    Ok(Row::new(columns, values))
}

/// Decode one column by the storage class of its value.
///
/// SQLite types values dynamically, so the stored class decides the variant.
/// Booleans arrive as integers and are coerced later against the record's
/// declared field type.
fn decode_value(row: &SqliteRow, idx: usize) -> Result<Value, StorageError> {
    let raw = row.try_get_raw(idx).map_err(StorageError::driver)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BIGINT" | "INT8" | "BOOLEAN" => Value::Integer(
            row.try_get_unchecked::<i64, _>(idx)
                .map_err(StorageError::driver)?,
        ),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Value::Real(
            row.try_get_unchecked::<f64, _>(idx)
                .map_err(StorageError::driver)?,
        ),
        "BLOB" => Value::Blob(
            row.try_get_unchecked::<Vec<u8>, _>(idx)
                .map_err(StorageError::driver)?,
        ),
        // Default: treat as text (TEXT, DATETIME, etc.)
        _ => Value::Text(
            row.try_get_unchecked::<String, _>(idx)
                .map_err(StorageError::driver)?,
        ),
    };

    Ok(value)
}
