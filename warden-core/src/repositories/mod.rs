//! Repository traits for the data access layer
//!
//! This module defines the storage interfaces the services depend on. The
//! traits abstract over the backend so the enforcement logic can be tested
//! against in-memory mocks and deployed against SQL.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   lifecycle methods
//!
//! Backends implement the full [`RepositoryProvider`] to plug into the main
//! library as one unit.

pub mod adapter;
pub mod lockout;
pub mod password_history;
pub mod user;

pub use adapter::{
    LockoutRepositoryAdapter, PasswordHistoryRepositoryAdapter, UserRepositoryAdapter,
};
pub use lockout::{LockoutRecord, LockoutRepository};
pub use password_history::{PasswordHistoryRecord, PasswordHistoryRepository};
pub use user::{NewUser, UserRepository};

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    type LockoutRepo: LockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for password history repository access.
pub trait PasswordHistoryRepositoryProvider: Send + Sync + 'static {
    type PasswordHistoryRepo: PasswordHistoryRepository;

    fn password_history(&self) -> &Self::PasswordHistoryRepo;
}

/// Unified provider over every repository a backend must supply, plus
/// storage lifecycle methods.
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider + LockoutRepositoryProvider + PasswordHistoryRepositoryProvider
{
    /// Create or update the backend schema.
    async fn migrate(&self) -> Result<(), Error>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<(), Error>;
}
