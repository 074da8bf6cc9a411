use async_trait::async_trait;
use chrono::Utc;

use super::SqliteRepository;
use super::mapping::{kv_columns, map_kv_row};
use crate::repository::{KeyValueRepository, KvValue, KvWrite, StorageError};

#[async_trait]
impl KeyValueRepository for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<KvValue>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT key, int_value, date_value
            FROM kv_entries
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_kv_row).transpose()
    }

    async fn apply(&self, writes: &[KvWrite]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        let now = Utc::now();

        for write in writes {
            let (int_value, date_value) = kv_columns(write.value);
            sqlx::query(
                r"
                INSERT INTO kv_entries (key, int_value, date_value, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(key) DO UPDATE SET
                    int_value = excluded.int_value,
                    date_value = excluded.date_value,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(&write.key)
            .bind(int_value)
            .bind(date_value)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
