//! Repository trait for the append-only password history log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, UserId};

/// One entry per successful password set (reset or change). Entries are
/// never mutated or deleted by this core; retention is someone else's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHistoryRecord {
    pub user_id: UserId,
    pub hashed_password: String,
    pub changed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PasswordHistoryRepository: Send + Sync + 'static {
    /// Append a new history entry.
    async fn append(&self, record: &PasswordHistoryRecord) -> Result<(), Error>;

    /// The most recent entries for a user, ordered `changed_at` descending,
    /// at most `limit` of them.
    async fn find_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<PasswordHistoryRecord>, Error>;

    /// The single most recent entry for a user.
    async fn find_latest(&self, user_id: &UserId) -> Result<Option<PasswordHistoryRecord>, Error>;
}
