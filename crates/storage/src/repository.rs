use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key {key} holds a {found} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A value stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvValue {
    Int(i64),
    Date(DateTime<Utc>),
}

impl KvValue {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            KvValue::Int(_) => "integer",
            KvValue::Date(_) => "date",
        }
    }
}

/// A single pending write; batches of these are applied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvWrite {
    pub key: String,
    pub value: KvValue,
}

impl KvWrite {
    #[must_use]
    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: KvValue::Int(value),
        }
    }

    #[must_use]
    pub fn date(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value: KvValue::Date(value),
        }
    }
}

/// Repository contract for the key-value settings store.
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Fetch the raw value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<KvValue>, StorageError>;

    /// Apply all writes, or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn apply(&self, writes: &[KvWrite]) -> Result<(), StorageError>;

    /// Fetch an integer value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TypeMismatch` if the key holds a date.
    async fn get_int(&self, key: &str) -> Result<Option<i64>, StorageError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(KvValue::Int(value)) => Ok(Some(value)),
            Some(other) => Err(StorageError::TypeMismatch {
                key: key.to_owned(),
                expected: "integer",
                found: other.kind(),
            }),
        }
    }

    /// Fetch a date value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TypeMismatch` if the key holds an integer.
    async fn get_date(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(KvValue::Date(value)) => Ok(Some(value)),
            Some(other) => Err(StorageError::TypeMismatch {
                key: key.to_owned(),
                expected: "date",
                found: other.kind(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set_int(&self, key: &str, value: i64) -> Result<(), StorageError> {
        self.apply(&[KvWrite::int(key, value)]).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set_date(&self, key: &str, value: DateTime<Utc>) -> Result<(), StorageError> {
        self.apply(&[KvWrite::date(key, value)]).await
    }
}

/// Simple in-memory key-value store for testing and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, KvValue>>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueRepository for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<KvValue>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).copied())
    }

    async fn apply(&self, writes: &[KvWrite]) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for write in writes {
            guard.insert(write.key.clone(), write.value);
        }
        Ok(())
    }
}

/// Bundles the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let kv: Arc<dyn KeyValueRepository> = Arc::new(InMemoryKeyValueStore::new());
        Self { kv }
    }
}
