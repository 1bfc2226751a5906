//! SQLite implementation of the lockout repository.

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;

use warden_core::{
    Error, UserId,
    error::StorageError,
    repositories::{LockoutRecord, LockoutRepository},
};

/// SQLite repository for per-user lockout state.
pub struct SqliteLockoutRepository {
    pool: SqlitePool,
}

impl SqliteLockoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLockoutRow {
    user_id: String,
    failed_attempts: i64,
    lockout_count: i64,
    locked_until: Option<i64>,
    last_failed_attempt_at: Option<i64>,
}

impl From<SqliteLockoutRow> for LockoutRecord {
    fn from(row: SqliteLockoutRow) -> Self {
        LockoutRecord {
            user_id: UserId::new(&row.user_id),
            failed_attempts: row.failed_attempts as u32,
            lockout_count: row.lockout_count as u32,
            locked_until: row
                .locked_until
                .map(|ts| DateTime::from_timestamp(ts, 0).expect("Invalid timestamp")),
            last_failed_attempt_at: row
                .last_failed_attempt_at
                .map(|ts| DateTime::from_timestamp(ts, 0).expect("Invalid timestamp")),
        }
    }
}

#[async_trait]
impl LockoutRepository for SqliteLockoutRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<LockoutRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteLockoutRow>(
            r#"
            SELECT user_id, failed_attempts, lockout_count, locked_until, last_failed_attempt_at
            FROM user_lockouts
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find lockout record");
            StorageError::Database("Failed to find lockout record".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn save(&self, record: &LockoutRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_lockouts
                (user_id, failed_attempts, lockout_count, locked_until, last_failed_attempt_at, updated_at)
            VALUES (?, ?, ?, ?, ?, unixepoch())
            ON CONFLICT(user_id) DO UPDATE SET
                failed_attempts = excluded.failed_attempts,
                lockout_count = excluded.lockout_count,
                locked_until = excluded.locked_until,
                last_failed_attempt_at = excluded.last_failed_attempt_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(i64::from(record.failed_attempts))
        .bind(i64::from(record.lockout_count))
        .bind(record.locked_until.map(|dt| dt.timestamp()))
        .bind(record.last_failed_attempt_at.map(|dt| dt.timestamp()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to save lockout record");
            StorageError::Database("Failed to save lockout record".to_string())
        })?;

        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE user_lockouts
            SET failed_attempts = 0,
                lockout_count = 0,
                locked_until = NULL,
                last_failed_attempt_at = NULL,
                updated_at = unixepoch()
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to clear lockout record");
            StorageError::Database("Failed to clear lockout record".to_string())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup_test_pool;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_find_missing_record_returns_none() {
        let pool = setup_test_pool().await;
        let repo = SqliteLockoutRepository::new(pool);

        let record = repo.find_by_user(&UserId::new("usr_missing")).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrip() {
        let pool = setup_test_pool().await;
        let repo = SqliteLockoutRepository::new(pool);
        let user_id = UserId::new("usr_1");

        let locked_until = Utc::now() + Duration::minutes(5);
        let record = LockoutRecord {
            user_id: user_id.clone(),
            failed_attempts: 2,
            lockout_count: 1,
            locked_until: Some(locked_until),
            last_failed_attempt_at: Some(Utc::now()),
        };
        repo.save(&record).await.unwrap();

        let found = repo.find_by_user(&user_id).await.unwrap().unwrap();
        assert_eq!(found.failed_attempts, 2);
        assert_eq!(found.lockout_count, 1);
        // Second precision survives the round-trip.
        assert_eq!(
            found.locked_until.unwrap().timestamp(),
            locked_until.timestamp()
        );
    }

    #[tokio::test]
    async fn test_save_upserts_existing_row() {
        let pool = setup_test_pool().await;
        let repo = SqliteLockoutRepository::new(pool);
        let user_id = UserId::new("usr_1");

        let mut record = LockoutRecord::new(user_id.clone());
        record.failed_attempts = 1;
        repo.save(&record).await.unwrap();

        record.failed_attempts = 2;
        record.lockout_count = 1;
        repo.save(&record).await.unwrap();

        let found = repo.find_by_user(&user_id).await.unwrap().unwrap();
        assert_eq!(found.failed_attempts, 2);
        assert_eq!(found.lockout_count, 1);
    }

    #[tokio::test]
    async fn test_clear_resets_all_fields() {
        let pool = setup_test_pool().await;
        let repo = SqliteLockoutRepository::new(pool);
        let user_id = UserId::new("usr_1");

        let record = LockoutRecord {
            user_id: user_id.clone(),
            failed_attempts: 3,
            lockout_count: 2,
            locked_until: Some(Utc::now() + Duration::minutes(10)),
            last_failed_attempt_at: Some(Utc::now()),
        };
        repo.save(&record).await.unwrap();

        repo.clear(&user_id).await.unwrap();

        let found = repo.find_by_user(&user_id).await.unwrap().unwrap();
        assert_eq!(found.failed_attempts, 0);
        assert_eq!(found.lockout_count, 0);
        assert!(found.locked_until.is_none());
        assert!(found.last_failed_attempt_at.is_none());
    }

    #[tokio::test]
    async fn test_clear_missing_record_is_noop() {
        let pool = setup_test_pool().await;
        let repo = SqliteLockoutRepository::new(pool);

        repo.clear(&UserId::new("usr_missing")).await.unwrap();
    }
}
