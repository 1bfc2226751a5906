//! SQLite implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use warden_core::{
    Error, User, UserId,
    error::StorageError,
    repositories::{NewUser, UserRepository},
};

/// SQLite repository for account rows.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteUserRow {
    id: String,
    email: String,
    name: Option<String>,
    is_active: bool,
    password_reset_done: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUserRow> for User {
    fn from(row: SqliteUserRow) -> Self {
        User {
            id: UserId::new(&row.id),
            email: row.email,
            name: row.name,
            is_active: row.is_active,
            password_reset_done: row.password_reset_done,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).expect("Invalid timestamp"),
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, is_active, password_reset_done, created_at, updated_at";

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteUserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, is_active, password_reset_done, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.is_active)
        .bind(user.password_reset_done)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create user");
            StorageError::Database("Failed to create user".to_string())
        })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by id");
            StorageError::Database("Failed to find user by id".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by email");
            StorageError::Database("Failed to find user by email".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn find_sweepable(&self) -> Result<Vec<User>, Error> {
        let rows = sqlx::query_as::<_, SqliteUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 AND password_reset_done = 1"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list sweepable users");
            StorageError::Database("Failed to list sweepable users".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_password_reset_done(&self, id: &UserId) -> Result<(), Error> {
        let result = sqlx::query(
            "UPDATE users SET password_reset_done = 1, updated_at = unixepoch() WHERE id = ?",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to mark password reset done");
            StorageError::Database("Failed to mark password reset done".to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        Ok(())
    }
}
