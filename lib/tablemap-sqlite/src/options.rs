//! Pool and runtime options for the SQLite backend.

use std::time::Duration;

use tablemap::StorageError;

const DEFAULT_MAX_CONNECTIONS: u32 = 16;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WORKER_THREADS: usize = 2;

pub const MAX_CONNECTIONS_ENV: &str = "TABLEMAP_MAX_CONNECTIONS";
pub const BUSY_TIMEOUT_ENV: &str = "TABLEMAP_BUSY_TIMEOUT_MS";

/// Options for opening a [`Database`](crate::Database).
///
/// Every operation takes its own pooled connection and transaction. Setting
/// `max_connections` to 1 funnels all operations through a single shared
/// connection instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    pub create_if_missing: bool,
    /// Threads of the runtime driving the blocking API.
    pub worker_threads: usize,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            create_if_missing: true,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl DatabaseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TABLEMAP_MAX_CONNECTIONS` and `TABLEMAP_BUSY_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let mut options = Self::default();
        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            options.max_connections = raw.trim().parse().map_err(|_| {
                StorageError::Config(format!("{} must be a positive integer, got {:?}", MAX_CONNECTIONS_ENV, raw))
            })?;
        }
        if let Some(raw) = lookup(BUSY_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                StorageError::Config(format!("{} must be milliseconds, got {:?}", BUSY_TIMEOUT_ENV, raw))
            })?;
            options.busy_timeout = Duration::from_millis(millis);
        }
        options.validate()?;
        Ok(options)
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.max_connections == 0 {
            return Err(StorageError::Config("max_connections must be at least 1".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(StorageError::Config("worker_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
