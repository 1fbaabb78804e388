//! Conversion between records and rows.
//!
//! Records are moved through `serde_json` objects: serialize → object →
//! values for binding, and row → object → deserialize.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::record::{FieldType, Record};
use crate::{StorageError, Value};

/// A result row: column names with their values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Serialize a record into column values, omitting fields that were not provided.
pub fn record_values<T: Record>(record: &T) -> Result<IndexMap<String, Value>, StorageError> {
    let json = serde_json::to_value(record)?;
    let obj = json
        .as_object()
        .ok_or_else(|| StorageError::Mapping("expected a JSON object for record".to_string()))?;

    let mut values = IndexMap::with_capacity(obj.len());
    for (key, value) in obj {
        if value.is_null() {
            continue;
        }
        values.insert(key.clone(), Value::from_json(value)?);
    }
    Ok(values)
}

/// Coerce a stored value to the field's declared type.
///
/// SQLite has no boolean storage class, so booleans come back as integers.
fn coerce(value: Value, field_type: FieldType) -> Value {
    match (field_type, value) {
        (FieldType::Boolean, Value::Integer(n)) => Value::Bool(n != 0),
        (FieldType::Integer, Value::Bool(b)) => Value::Integer(b.into()),
        (_, value) => value,
    }
}

/// Convert a row into a record. Every column must name a field of `T`.
pub fn map_row<T: Record>(row: Row) -> Result<T, StorageError> {
    let mut obj = Map::with_capacity(row.columns.len());
    for (column, value) in row.columns.into_iter().zip(row.values) {
        let field = T::field(&column).ok_or_else(|| {
            StorageError::Mapping(format!(
                "column `{}` does not match any field of {}",
                column,
                T::type_name()
            ))
        })?;
        obj.insert(column, coerce(value, field.field_type).into_json());
    }

    serde_json::from_value(JsonValue::Object(obj)).map_err(|e| {
        StorageError::Mapping(format!("cannot build {} from row: {}", T::type_name(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::UserProfile;

    fn row(pairs: &[(&str, Value)]) -> Row {
        Row::new(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    #[test]
    fn absent_fields_are_omitted() {
        let user = UserProfile {
            id: None,
            name: "ann".into(),
            active: true,
        };
        let values = record_values(&user).unwrap();
        let keys: Vec<_> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "active"]);
    }

    #[test]
    fn integer_booleans_are_coerced() {
        let user: UserProfile = map_row(row(&[
            ("id", Value::Integer(1)),
            ("name", Value::from("ann")),
            ("active", Value::Integer(1)),
        ]))
        .unwrap();
        assert_eq!(
            user,
            UserProfile {
                id: Some(1),
                name: "ann".into(),
                active: true
            }
        );
    }

    #[test]
    fn extra_columns_fail_mapping() {
        let err = map_row::<UserProfile>(row(&[
            ("name", Value::from("ann")),
            ("active", Value::Integer(0)),
            ("count(*)", Value::Integer(3)),
        ]))
        .unwrap_err();
        assert!(matches!(err, StorageError::Mapping(_)));
    }

    #[test]
    fn missing_required_fields_fail_mapping() {
        let err = map_row::<UserProfile>(row(&[("id", Value::Integer(1))])).unwrap_err();
        assert!(matches!(err, StorageError::Mapping(_)));
    }

    #[test]
    fn row_lookup_by_name() {
        let r = row(&[("a", Value::Integer(1)), ("b", Value::Null)]);
        assert_eq!(r.get("a"), Some(&Value::Integer(1)));
        assert_eq!(r.get("c"), None);
        assert_eq!(r.len(), 2);
    }
}
