//! Repository trait for account rows.

use async_trait::async_trait;

use crate::{Error, User, UserId};

/// Parameters for creating an account row.
///
/// Tenant-synced accounts arrive with the ID minted by the tenant server;
/// `NewUser::new` mints a local one for everything else.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub password_reset_done: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: UserId::new_random(),
            email: email.into(),
            name: None,
            is_active: true,
            password_reset_done: false,
        }
    }

    pub fn with_id(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            is_active: true,
            password_reset_done: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn password_reset_done(mut self, done: bool) -> Self {
        self.password_reset_done = done;
        self
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Active users whose initial password reset is done — the population
    /// the expiry sweeps scan.
    async fn find_sweepable(&self) -> Result<Vec<User>, Error>;

    /// Mark the initial forced password reset as completed.
    async fn set_password_reset_done(&self, id: &UserId) -> Result<(), Error>;
}
