use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{KvValue, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_kv_row(row: &sqlx::sqlite::SqliteRow) -> Result<KvValue, StorageError> {
    let int_value: Option<i64> = row.try_get("int_value").map_err(ser)?;
    let date_value: Option<DateTime<Utc>> = row.try_get("date_value").map_err(ser)?;

    match (int_value, date_value) {
        (Some(value), None) => Ok(KvValue::Int(value)),
        (None, Some(value)) => Ok(KvValue::Date(value)),
        _ => {
            let key: String = row.try_get("key").map_err(ser)?;
            Err(StorageError::Serialization(format!(
                "entry {key} must hold exactly one value"
            )))
        }
    }
}

/// Splits a value into the `(int_value, date_value)` column pair.
pub(crate) fn kv_columns(value: KvValue) -> (Option<i64>, Option<DateTime<Utc>>) {
    match value {
        KvValue::Int(value) => (Some(value), None),
        KvValue::Date(value) => (None, Some(value)),
    }
}
