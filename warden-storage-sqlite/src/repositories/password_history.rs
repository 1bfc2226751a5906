//! SQLite implementation of the password history repository.

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;

use warden_core::{
    Error, UserId,
    error::StorageError,
    repositories::{PasswordHistoryRecord, PasswordHistoryRepository},
};

/// SQLite repository for the append-only password history log.
pub struct SqlitePasswordHistoryRepository {
    pool: SqlitePool,
}

impl SqlitePasswordHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqlitePasswordHistoryRow {
    user_id: String,
    hashed_password: String,
    changed_at: i64,
}

impl From<SqlitePasswordHistoryRow> for PasswordHistoryRecord {
    fn from(row: SqlitePasswordHistoryRow) -> Self {
        PasswordHistoryRecord {
            user_id: UserId::new(&row.user_id),
            hashed_password: row.hashed_password,
            changed_at: DateTime::from_timestamp(row.changed_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl PasswordHistoryRepository for SqlitePasswordHistoryRepository {
    async fn append(&self, record: &PasswordHistoryRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO password_history (user_id, hashed_password, changed_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(&record.hashed_password)
        .bind(record.changed_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to append password history");
            StorageError::Database("Failed to append password history".to_string())
        })?;

        Ok(())
    }

    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryRecord>, Error> {
        // id breaks ties between entries stored within the same second.
        let rows = sqlx::query_as::<_, SqlitePasswordHistoryRow>(
            r#"
            SELECT user_id, hashed_password, changed_at
            FROM password_history
            WHERE user_id = ?
            ORDER BY changed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch password history");
            StorageError::Database("Failed to fetch password history".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_latest(&self, user_id: &UserId) -> Result<Option<PasswordHistoryRecord>, Error> {
        Ok(self.find_recent(user_id, 1).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup_test_pool;
    use chrono::{Duration, Utc};

    fn record(user_id: &UserId, hash: &str, days_ago: i64) -> PasswordHistoryRecord {
        PasswordHistoryRecord {
            user_id: user_id.clone(),
            hashed_password: hash.to_string(),
            changed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn test_append_and_find_latest() {
        let pool = setup_test_pool().await;
        let repo = SqlitePasswordHistoryRepository::new(pool);
        let user_id = UserId::new("usr_1");

        repo.append(&record(&user_id, "hash-old", 10)).await.unwrap();
        repo.append(&record(&user_id, "hash-new", 1)).await.unwrap();

        let latest = repo.find_latest(&user_id).await.unwrap().unwrap();
        assert_eq!(latest.hashed_password, "hash-new");
    }

    #[tokio::test]
    async fn test_find_recent_orders_and_limits() {
        let pool = setup_test_pool().await;
        let repo = SqlitePasswordHistoryRepository::new(pool);
        let user_id = UserId::new("usr_1");

        repo.append(&record(&user_id, "hash-1", 30)).await.unwrap();
        repo.append(&record(&user_id, "hash-2", 20)).await.unwrap();
        repo.append(&record(&user_id, "hash-3", 10)).await.unwrap();

        let recent = repo.find_recent(&user_id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].hashed_password, "hash-3");
        assert_eq!(recent[1].hashed_password, "hash-2");
    }

    #[tokio::test]
    async fn test_same_second_entries_break_ties_by_insert_order() {
        let pool = setup_test_pool().await;
        let repo = SqlitePasswordHistoryRepository::new(pool);
        let user_id = UserId::new("usr_1");

        let now = Utc::now();
        for hash in ["hash-a", "hash-b", "hash-c"] {
            repo.append(&PasswordHistoryRecord {
                user_id: user_id.clone(),
                hashed_password: hash.to_string(),
                changed_at: now,
            })
            .await
            .unwrap();
        }

        let latest = repo.find_latest(&user_id).await.unwrap().unwrap();
        assert_eq!(latest.hashed_password, "hash-c");
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let pool = setup_test_pool().await;
        let repo = SqlitePasswordHistoryRepository::new(pool);
        let first = UserId::new("usr_1");
        let second = UserId::new("usr_2");

        repo.append(&record(&first, "hash-first", 1)).await.unwrap();

        assert!(repo.find_latest(&second).await.unwrap().is_none());
        assert_eq!(repo.find_recent(&second, 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_find_latest_without_history() {
        let pool = setup_test_pool().await;
        let repo = SqlitePasswordHistoryRepository::new(pool);

        assert!(
            repo.find_latest(&UserId::new("usr_missing"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
