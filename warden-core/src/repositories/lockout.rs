//! Repository trait for per-user lockout state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, UserId};

/// Per-user failed-attempt counters and lock window. One row per user,
/// created lazily on the first failed attempt and mutated only by the
/// lockout service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutRecord {
    pub user_id: UserId,

    /// Failed attempts since the last lock, success, or forgiveness window.
    pub failed_attempts: u32,

    /// Cumulative number of times this user has been locked. Never reset by
    /// lock expiry — only by an explicit successful login. Drives the
    /// progressive lock duration.
    pub lockout_count: u32,

    /// End of the active lock window, if any.
    pub locked_until: Option<DateTime<Utc>>,

    pub last_failed_attempt_at: Option<DateTime<Utc>>,
}

impl LockoutRecord {
    /// A fresh record for a user with no prior failures.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            failed_attempts: 0,
            lockout_count: 0,
            locked_until: None,
            last_failed_attempt_at: None,
        }
    }
}

/// Repository for lockout state.
///
/// Implementations should back `save` with an upsert keyed on `user_id` and
/// give read-committed isolation with atomic single-row updates; the service
/// performs read-modify-write cycles and relies on that to keep
/// `failed_attempts` strictly increasing per failed attempt.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Fetch the record for a user, if one exists.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<LockoutRecord>, Error>;

    /// Insert or update the record for its user id.
    async fn save(&self, record: &LockoutRecord) -> Result<(), Error>;

    /// Reset all counters and timestamps for a user: `failed_attempts` and
    /// `lockout_count` to zero, `locked_until` and `last_failed_attempt_at`
    /// to absent. A no-op when no record exists.
    async fn clear(&self, user_id: &UserId) -> Result<(), Error>;
}
