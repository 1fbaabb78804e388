use thiserror::Error;

/// Boxed driver error, carried unchanged as the `source()` of [`StorageError::Driver`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unsupported type for field `{field}`: {ty}")]
    UnsupportedType { field: String, ty: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Missing key: primary-key field `{0}` has no value")]
    MissingKey(String),

    #[error("Ambiguous key: more than one row in `{0}` matched")]
    AmbiguousKey(String),

    #[error("Invalid key: expected {expected} value(s), got {got}")]
    InvalidKey { expected: usize, got: usize },

    #[error("Invalid primary key: `{0}` is not a field of the record")]
    InvalidPrimaryKey(String),

    #[error("Unknown column `{column}` in table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Driver error: {0}")]
    Driver(#[source] DriverError),
}

impl StorageError {
    /// Wrap a driver-level error without altering it.
    pub fn driver(e: impl Into<DriverError>) -> Self {
        StorageError::Driver(e.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
