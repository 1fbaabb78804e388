//! Record trait and the mapping from record fields to table columns.
//!
//! Types implementing `Record` describe their shape explicitly through
//! [`FieldDescriptor`]s instead of relying on runtime reflection. Use
//! `#[derive(Record)]` to generate the implementation.
//!
//! # Example
//!
//! ```text
//! #[derive(Clone, Serialize, Deserialize, Record)]
//! #[record(table = "people", primary_key = "id")]
//! pub struct Person {
//!     pub id: Option<i64>,
//!     pub name: String,
//!     pub active: bool,
//! }
//! ```
//!
//! # Column Naming
//!
//! Column names are the serialized field names. The table name defaults to the
//! snake_case form of the type name (`UserProfile` → `user_profile`).

use heck::ToSnakeCase;

use crate::StorageError;

/// Semantic type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Text,
    Boolean,
    /// A type with no column mapping; carries the declared type for error reporting.
    Unsupported(&'static str),
}

/// Primitive SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    Boolean,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Boolean => "BOOLEAN",
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Describes one declared field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub field_type: FieldType,
    /// `Option<_>` fields; `None` means "not provided" on insert and update.
    pub nullable: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A column derived from a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
}

/// Trait for plain record types that map to exactly one table.
pub trait Record: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync {
    /// The declared type name, used to derive the default table name.
    fn type_name() -> &'static str;

    /// Declared fields in order.
    fn fields() -> &'static [FieldDescriptor];

    /// Table name override.
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Default primary key; empty means a field named `id`.
    fn primary_key() -> &'static [&'static str] {
        &[]
    }

    fn field(name: &str) -> Option<&'static FieldDescriptor> {
        Self::fields().iter().find(|f| f.name == name)
    }
}

/// Default table name for `T`: the override if present, else snake_case of the type name.
pub fn default_table_name<T: Record>() -> String {
    T::table_name()
        .map(str::to_string)
        .unwrap_or_else(|| T::type_name().to_snake_case())
}

/// Resolve the primary key, falling back to the record's default and then `id`.
pub fn resolve_primary_key<T: Record>(primary_key: &[String]) -> Vec<String> {
    if !primary_key.is_empty() {
        return primary_key.to_vec();
    }
    let declared = T::primary_key();
    if !declared.is_empty() {
        return declared.iter().map(|s| s.to_string()).collect();
    }
    vec!["id".to_string()]
}

fn sql_type(field: &FieldDescriptor) -> Result<SqlType, StorageError> {
    match field.field_type {
        FieldType::Integer => Ok(SqlType::Integer),
        FieldType::Text => Ok(SqlType::Text),
        FieldType::Boolean => Ok(SqlType::Boolean),
        FieldType::Unsupported(ty) => Err(StorageError::UnsupportedType {
            field: field.name.to_string(),
            ty: ty.to_string(),
        }),
    }
}

/// Derive the ordered column set for `T`, flagging the given primary-key fields.
pub fn columns_for<T: Record>(primary_key: &[String]) -> Result<Vec<ColumnDef>, StorageError> {
    if let Some(missing) = primary_key.iter().find(|pk| T::field(pk).is_none()) {
        return Err(StorageError::InvalidPrimaryKey(missing.clone()));
    }

    T::fields()
        .iter()
        .map(|field| {
            Ok(ColumnDef {
                name: field.name.to_string(),
                sql_type: sql_type(field)?,
                primary_key: primary_key.iter().any(|pk| pk == field.name),
            })
        })
        .collect()
}
