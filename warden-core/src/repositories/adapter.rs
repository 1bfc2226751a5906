//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so services generic over one repository type can be
//! built from a provider that owns them all.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, User, UserId,
    repositories::{
        LockoutRecord, LockoutRepository, LockoutRepositoryProvider, NewUser,
        PasswordHistoryRecord, PasswordHistoryRepository, PasswordHistoryRepositoryProvider,
        UserRepository, UserRepositoryProvider,
    },
};

pub struct UserRepositoryAdapter<R: UserRepositoryProvider> {
    provider: Arc<R>,
}

impl<R: UserRepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: UserRepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }

    async fn find_sweepable(&self) -> Result<Vec<User>, Error> {
        self.provider.user().find_sweepable().await
    }

    async fn set_password_reset_done(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().set_password_reset_done(id).await
    }
}

pub struct LockoutRepositoryAdapter<R: LockoutRepositoryProvider> {
    provider: Arc<R>,
}

impl<R: LockoutRepositoryProvider> LockoutRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: LockoutRepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<LockoutRecord>, Error> {
        self.provider.lockout().find_by_user(user_id).await
    }

    async fn save(&self, record: &LockoutRecord) -> Result<(), Error> {
        self.provider.lockout().save(record).await
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.lockout().clear(user_id).await
    }
}

pub struct PasswordHistoryRepositoryAdapter<R: PasswordHistoryRepositoryProvider> {
    provider: Arc<R>,
}

impl<R: PasswordHistoryRepositoryProvider> PasswordHistoryRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: PasswordHistoryRepositoryProvider> PasswordHistoryRepository
    for PasswordHistoryRepositoryAdapter<R>
{
    async fn append(&self, record: &PasswordHistoryRecord) -> Result<(), Error> {
        self.provider.password_history().append(record).await
    }

    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryRecord>, Error> {
        self.provider
            .password_history()
            .find_recent(user_id, limit)
            .await
    }

    async fn find_latest(&self, user_id: &UserId) -> Result<Option<PasswordHistoryRecord>, Error> {
        self.provider.password_history().find_latest(user_id).await
    }
}
