//! SQLite storage backend for warden.
//!
//! Provides [`SqliteRepositoryProvider`], which bundles the user, lockout,
//! and password-history repositories over one connection pool and owns the
//! schema. Timestamps are stored as unix seconds since no database can agree
//! on a datetime type.

pub mod repositories;

pub use repositories::{
    SqliteLockoutRepository, SqlitePasswordHistoryRepository, SqliteUserRepository,
};

use async_trait::async_trait;
use sqlx::SqlitePool;

use warden_core::{
    Error,
    error::StorageError,
    repositories::{
        LockoutRepositoryProvider, PasswordHistoryRepositoryProvider, RepositoryProvider,
        UserRepositoryProvider,
    },
};

/// All warden repositories over a single SQLite pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: SqliteUserRepository,
    lockout: SqliteLockoutRepository,
    password_history: SqlitePasswordHistoryRepository,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            user: SqliteUserRepository::new(pool.clone()),
            lockout: SqliteLockoutRepository::new(pool.clone()),
            password_history: SqlitePasswordHistoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the given SQLite URL (e.g. `sqlite::memory:` or
    /// `sqlite://warden.db`).
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl LockoutRepositoryProvider for SqliteRepositoryProvider {
    type LockoutRepo = SqliteLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockout
    }
}

impl PasswordHistoryRepositoryProvider for SqliteRepositoryProvider {
    type PasswordHistoryRepo = SqlitePasswordHistoryRepository;

    fn password_history(&self) -> &Self::PasswordHistoryRepo {
        &self.password_history
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to apply schema");
                    StorageError::Migration(e.to_string())
                })?;
        }
        tracing::debug!("sqlite schema is up to date");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        password_reset_done INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_lockouts (
        user_id TEXT PRIMARY KEY,
        failed_attempts INTEGER NOT NULL DEFAULT 0,
        lockout_count INTEGER NOT NULL DEFAULT 0,
        locked_until INTEGER,
        last_failed_attempt_at INTEGER,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS password_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        hashed_password TEXT NOT NULL,
        changed_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_password_history_user_changed
    ON password_history (user_id, changed_at DESC)
    "#,
];

/// Fresh in-memory pool with the schema applied, for tests.
#[cfg(test)]
pub(crate) async fn setup_test_pool() -> SqlitePool {
    let provider = SqliteRepositoryProvider::connect("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    provider.migrate().await.expect("Failed to apply schema");
    provider.pool.clone()
}
